use serenity::model::id::{ChannelId, GuildId, UserId};
use std::{sync::Arc, time::Duration};
use uuid::Uuid;

use super::{InteractionContext, InteractionUser, Reply};
use crate::{
    audio::{Requester, Track, TrackSourceKind, VoiceChannelInfo},
    config::Config,
};

pub const VOICE_CHANNEL: u64 = 10;

pub fn test_config() -> Arc<Config> {
    Arc::new(Config::default())
}

/// User in voice channel 10 of guild 100, bot in the same channel.
pub fn sample_interaction() -> InteractionContext {
    InteractionContext {
        execution_id: Uuid::new_v4().to_string(),
        guild_id: Some(GuildId::new(100)),
        shard_id: 0,
        channel_id: ChannelId::new(20),
        user: InteractionUser {
            id: UserId::new(1),
            name: "Tester".into(),
            nickname: None,
            avatar_url: Some("https://cdn.discordapp.com/avatars/1/a.png".into()),
        },
        locale: "en-US".into(),
        user_voice_channel: Some(VoiceChannelInfo {
            id: ChannelId::new(VOICE_CHANNEL),
            name: "General".into(),
            bitrate: Some(64_000),
        }),
        bot_voice_channel: Some(ChannelId::new(VOICE_CHANNEL)),
        can_view_channel: true,
        guild_icon_url: None,
    }
}

pub fn sample_track(title: &str) -> Track {
    Track {
        id: Uuid::new_v4(),
        title: Some(title.to_string()),
        url: Some(format!(
            "https://www.youtube.com/watch?v={}",
            title.to_lowercase().replace(' ', "-")
        )),
        duration: Some(Duration::from_secs(185)),
        is_live: false,
        thumbnail: Some("https://i.ytimg.com/vi/song/hqdefault.jpg".into()),
        source: TrackSourceKind::Youtube,
        requested_by: Some(Requester {
            id: UserId::new(1),
            name: "Tester".into(),
            avatar_url: None,
        }),
    }
}

/// Description of the first embed of a reply.
pub fn description(reply: &Reply) -> String {
    reply
        .embeds
        .first()
        .and_then(|embed| serde_json::to_value(embed).ok())
        .and_then(|json| json["description"].as_str().map(str::to_string))
        .unwrap_or_default()
}

pub fn embed_json(reply: &Reply) -> serde_json::Value {
    reply
        .embeds
        .first()
        .and_then(|embed| serde_json::to_value(embed).ok())
        .unwrap_or_default()
}
