//! # Bot Module
//!
//! Gateway-facing side of Cadence.
//!
//! ## Architecture
//!
//! [`CadenceBot`] implements serenity's [`EventHandler`] and stays thin:
//!
//! - [`handlers`] turns raw interactions into an
//!   [`InteractionContext`](crate::interactions::InteractionContext) plus a
//!   [`Responder`](crate::interactions::Responder) and routes them through the
//!   [`handlers::Dispatcher`]
//! - [`commands`] registers slash command definitions on `ready`
//! - [`events`] announces and cleans up now-playing messages for the
//!   [`AudioPlayer`]
//!
//! Voice state updates for the bot itself drop the guild's player once it
//! has been disconnected.

use serenity::{
    all::{Context, EventHandler, Interaction, Ready, ResumedEvent, VoiceState},
    async_trait,
    model::id::{ChannelId, GuildId, UserId},
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{error, info};

pub mod commands;
pub mod events;
pub mod handlers;

use crate::{audio::player::AudioPlayer, config::Config};

pub struct CadenceBot {
    config: Arc<Config>,
    player: Arc<AudioPlayer>,
    dispatcher: handlers::Dispatcher,
    commands_registered: AtomicBool,
}

impl CadenceBot {
    pub fn new(
        config: Arc<Config>,
        player: Arc<AudioPlayer>,
        dispatcher: handlers::Dispatcher,
    ) -> Self {
        Self {
            config,
            player,
            dispatcher,
            commands_registered: AtomicBool::new(false),
        }
    }
}

/// Guild the bot just left voice in. The previous state is not consulted,
/// it is missing whenever it was never cached.
fn disconnected_guild(
    bot_id: UserId,
    user_id: UserId,
    guild_id: Option<GuildId>,
    channel_id: Option<ChannelId>,
) -> Option<GuildId> {
    if user_id != bot_id || channel_id.is_some() {
        return None;
    }
    guild_id
}

#[async_trait]
impl EventHandler for CadenceBot {
    /// Fires once per shard; commands are registered on the first one.
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            "🤖 {} is online on shard {} ({} guilds)",
            ready.user.name,
            ctx.shard_id.0,
            ready.guilds.len()
        );

        if self.commands_registered.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Err(e) =
            commands::register_commands(&ctx.http, self.dispatcher.registry(), &self.config.bot)
                .await
        {
            error!("❌ Failed to register slash commands: {:?}", e);
            self.commands_registered.store(false, Ordering::Release);
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        handlers::handle_interaction(&self.dispatcher, ctx, interaction).await;
    }

    async fn voice_state_update(&self, ctx: Context, _: Option<VoiceState>, new: VoiceState) {
        let bot_id = ctx.cache.current_user().id;
        if let Some(guild_id) = disconnected_guild(bot_id, new.user_id, new.guild_id, new.channel_id)
        {
            info!("🔌 Disconnected from voice in guild {}", guild_id);
            self.player.forget(guild_id).await;
        }
    }

    async fn resume(&self, ctx: Context, _: ResumedEvent) {
        events::shard_resume(ctx.shard_id.0);
    }
}
