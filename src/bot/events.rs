use anyhow::Result;
use async_trait::async_trait;
use serenity::{
    builder::CreateMessage,
    cache::Cache,
    http::Http,
    model::id::{ChannelId, GuildId, MessageId},
};
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::{
    audio::{player::PlayerEvents, GuildQueue, Track},
    config::{Config, EmbedOptions},
    locale::{Translator, DEFAULT_LOCALE},
    ui::embeds,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncedMessage {
    pub id: MessageId,
    /// The bot authored it and may remove it.
    pub deletable: bool,
}

/// The text channel a queue announces its tracks in.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnnounceChannel: Send + Sync {
    fn is_resolvable(&self, guild_id: GuildId, channel_id: ChannelId) -> bool;

    fn guild_locale(&self, guild_id: GuildId) -> Option<String>;

    async fn send(&self, channel_id: ChannelId, message: CreateMessage) -> Result<MessageId>;

    async fn fetch(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<Option<AnnouncedMessage>>;

    async fn delete(&self, channel_id: ChannelId, message_id: MessageId) -> Result<()>;
}

/// Announces the track that just started, with its action buttons.
pub async fn player_start(
    channel: &dyn AnnounceChannel,
    options: &EmbedOptions,
    queue: &dyn GuildQueue,
    track: &Track,
) {
    if !options.behavior.enable_player_start_messages {
        debug!("Player start messages are disabled.");
        return;
    }

    let guild_id = queue.guild_id();
    let metadata = queue.metadata();
    if !channel.is_resolvable(guild_id, metadata.channel_id) {
        warn!(
            "⚠️ Channel {} is no longer available, skipping now-playing message",
            metadata.channel_id
        );
        return;
    }

    let locale = channel
        .guild_locale(guild_id)
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string());
    let message = embeds::now_playing_message(
        track,
        queue.history_len(),
        options,
        &Translator::for_locale(&locale),
    );

    match channel.send(metadata.channel_id, message).await {
        Ok(message_id) => {
            debug!("Now-playing message {} sent.", message_id);
            queue.set_last_message(Some(message_id));
        }
        Err(e) => error!("❌ Failed to send now-playing message: {:?}", e),
    }
}

/// Removes the now-playing message of the track that just finished.
pub async fn player_finish(channel: &dyn AnnounceChannel, queue: &dyn GuildQueue, track: &Track) {
    debug!(
        "Track '{}' finished.",
        track.title.as_deref().unwrap_or("unknown")
    );

    let metadata = queue.metadata();
    let Some(message_id) = metadata.last_message else {
        debug!("No now-playing message to remove.");
        return;
    };
    queue.set_last_message(None);

    match channel.fetch(metadata.channel_id, message_id).await {
        Ok(Some(message)) if message.deletable => {
            if let Err(e) = channel.delete(metadata.channel_id, message.id).await {
                warn!("⚠️ Failed to delete now-playing message {}: {:?}", message.id, e);
            }
        }
        Ok(Some(message)) => debug!("Message {} cannot be deleted by the bot.", message.id),
        Ok(None) => debug!("Message {} is already gone.", message_id),
        Err(e) => warn!("⚠️ Failed to fetch now-playing message {}: {:?}", message_id, e),
    }
}

pub fn shard_resume(shard_id: u32) {
    info!("🔄 Shard {} resumed its gateway session", shard_id);
}

/// [`AnnounceChannel`] over the gateway cache and the REST client.
pub struct SerenityAnnounceChannel {
    http: Arc<Http>,
    cache: Arc<Cache>,
}

impl SerenityAnnounceChannel {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>) -> Self {
        Self { http, cache }
    }
}

#[async_trait]
impl AnnounceChannel for SerenityAnnounceChannel {
    fn is_resolvable(&self, guild_id: GuildId, channel_id: ChannelId) -> bool {
        self.cache
            .guild(guild_id)
            .is_some_and(|guild| guild.channels.contains_key(&channel_id))
    }

    fn guild_locale(&self, guild_id: GuildId) -> Option<String> {
        self.cache
            .guild(guild_id)
            .map(|guild| guild.preferred_locale.clone())
    }

    async fn send(&self, channel_id: ChannelId, message: CreateMessage) -> Result<MessageId> {
        Ok(channel_id.send_message(&self.http, message).await?.id)
    }

    async fn fetch(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<Option<AnnouncedMessage>> {
        let message = channel_id.message(&self.http, message_id).await?;
        let bot_id = self.cache.current_user().id;

        Ok(Some(AnnouncedMessage {
            id: message.id,
            deletable: message.author.id == bot_id,
        }))
    }

    async fn delete(&self, channel_id: ChannelId, message_id: MessageId) -> Result<()> {
        channel_id.delete_message(&self.http, message_id).await?;
        Ok(())
    }
}

/// Forwards player lifecycle events to their Discord side effects.
pub struct PlayerEventHandler {
    channel: SerenityAnnounceChannel,
    config: Arc<Config>,
}

impl PlayerEventHandler {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>, config: Arc<Config>) -> Self {
        Self {
            channel: SerenityAnnounceChannel::new(http, cache),
            config,
        }
    }
}

#[async_trait]
impl PlayerEvents for PlayerEventHandler {
    async fn player_start(&self, queue: Arc<dyn GuildQueue>, track: Track) {
        let span = info_span!(
            "event",
            module = "events",
            name = "playerStart",
            guild_id = queue.guild_id().get()
        );
        player_start(&self.channel, &self.config.embed, &*queue, &track)
            .instrument(span)
            .await
    }

    async fn player_finish(&self, queue: Arc<dyn GuildQueue>, track: Track) {
        let span = info_span!(
            "event",
            module = "events",
            name = "playerFinish",
            guild_id = queue.guild_id().get()
        );
        player_finish(&self.channel, &*queue, &track)
            .instrument(span)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        audio::{queue::MockGuildQueue, QueueMetadata},
        interactions::test_support::sample_track,
    };

    const ANNOUNCE_CHANNEL: u64 = 20;

    fn queue_with(last_message: Option<u64>) -> MockGuildQueue {
        let mut queue = MockGuildQueue::new();
        queue.expect_guild_id().returning(|| GuildId::new(100));
        queue.expect_history_len().returning(|| 0);
        queue.expect_metadata().returning(move || QueueMetadata {
            channel_id: ChannelId::new(ANNOUNCE_CHANNEL),
            last_message: last_message.map(MessageId::new),
        });
        queue
    }

    fn resolvable_channel() -> MockAnnounceChannel {
        let mut channel = MockAnnounceChannel::new();
        channel.expect_is_resolvable().returning(|_, _| true);
        channel.expect_guild_locale().returning(|_| None);
        channel
    }

    #[tokio::test]
    async fn start_announces_and_remembers_message() {
        let mut queue = queue_with(None);
        queue
            .expect_set_last_message()
            .withf(|id| *id == Some(MessageId::new(555)))
            .times(1)
            .return_const(());

        let mut channel = resolvable_channel();
        channel
            .expect_send()
            .times(1)
            .withf(|channel_id, message| {
                let json = serde_json::to_value(message).unwrap();
                channel_id.get() == ANNOUNCE_CHANNEL
                    && json["embeds"][0]["description"]
                        .as_str()
                        .is_some_and(|text| text.contains("Started playing"))
                    && json["components"][0]["components"].as_array().map(Vec::len) == Some(4)
            })
            .returning(|_, _| Ok(MessageId::new(555)));

        player_start(&channel, &EmbedOptions::default(), &queue, &sample_track("Song")).await;
    }

    #[tokio::test]
    async fn start_respects_disabled_messages() {
        let mut options = EmbedOptions::default();
        options.behavior.enable_player_start_messages = false;
        let mut channel = MockAnnounceChannel::new();
        channel.expect_send().never();
        let mut queue = MockGuildQueue::new();
        queue.expect_set_last_message().never();

        player_start(&channel, &options, &queue, &sample_track("Song")).await;
    }

    #[tokio::test]
    async fn start_skips_vanished_channel() {
        let mut channel = MockAnnounceChannel::new();
        channel.expect_is_resolvable().returning(|_, _| false);
        channel.expect_send().never();
        let mut queue = queue_with(None);
        queue.expect_set_last_message().never();

        player_start(&channel, &EmbedOptions::default(), &queue, &sample_track("Song")).await;
    }

    #[tokio::test]
    async fn start_swallows_send_failures() {
        let mut channel = resolvable_channel();
        channel
            .expect_send()
            .returning(|_, _| Err(anyhow::anyhow!("Missing Access")));
        let mut queue = queue_with(None);
        queue.expect_set_last_message().never();

        player_start(&channel, &EmbedOptions::default(), &queue, &sample_track("Song")).await;
    }

    #[tokio::test]
    async fn finish_without_message_touches_nothing() {
        let mut channel = MockAnnounceChannel::new();
        channel.expect_fetch().never();
        channel.expect_delete().never();
        let mut queue = queue_with(None);
        queue.expect_set_last_message().never();

        player_finish(&channel, &queue, &sample_track("Song")).await;
    }

    #[tokio::test]
    async fn finish_deletes_own_message() {
        let mut channel = MockAnnounceChannel::new();
        channel.expect_fetch().returning(|_, id| {
            Ok(Some(AnnouncedMessage {
                id,
                deletable: true,
            }))
        });
        channel
            .expect_delete()
            .times(1)
            .withf(|channel_id, id| channel_id.get() == ANNOUNCE_CHANNEL && id.get() == 777)
            .returning(|_, _| Ok(()));
        let mut queue = queue_with(Some(777));
        queue.expect_set_last_message().return_const(());

        player_finish(&channel, &queue, &sample_track("Song")).await;
    }

    #[tokio::test]
    async fn finish_keeps_foreign_or_missing_messages() {
        for fetched in [
            Ok(Some(AnnouncedMessage {
                id: MessageId::new(777),
                deletable: false,
            })),
            Ok(None),
            Err(anyhow::anyhow!("Unknown Message")),
        ] {
            let mut channel = MockAnnounceChannel::new();
            channel.expect_fetch().return_once(move |_, _| fetched);
            channel.expect_delete().never();
            let mut queue = queue_with(Some(777));
            queue.expect_set_last_message().return_const(());

            player_finish(&channel, &queue, &sample_track("Song")).await;
        }
    }
}
