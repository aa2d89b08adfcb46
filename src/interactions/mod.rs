//! # Interactions
//!
//! Everything a user can trigger: slash commands, buttons and autocomplete.
//!
//! Handlers never talk to serenity directly. They receive an immutable
//! [`InteractionContext`] built from the gateway cache, parsed options, and
//! a [`Responder`] that owns the Discord response lifecycle (defer, reply,
//! edit, paginated replies). This keeps every handler testable with mocks.
//!
//! ## Layout
//!
//! - [`base`] - helpers shared by every handler (spans, embed authors,
//!   validator execution)
//! - [`commands`] - `/shards`, `/play`, `/loop`
//! - [`components`] - track action buttons and the queue viewer
//! - [`autocomplete`] - `/play` query suggestions
//! - [`pagination`] - page cursor and button collector seam

pub mod autocomplete;
pub mod base;
pub mod commands;
pub mod components;
pub mod pagination;

#[cfg(test)]
pub(crate) mod test_support;

use anyhow::Result;
use async_trait::async_trait;
use serenity::{
    builder::{CreateActionRow, CreateCommand, CreateEmbed},
    model::id::{ChannelId, GuildId, UserId},
};
use std::{collections::HashMap, sync::Arc, time::Duration};

use crate::{
    audio::{QueueRegistry, TrackResolver, VoiceChannelInfo},
    config::Config,
    stats::ShardStatsSource,
};

pub use pagination::PageCollector;

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionUser {
    pub id: UserId,
    pub name: String,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
}

/// Request-scoped snapshot of an interaction and the guild state around it.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionContext {
    pub execution_id: String,
    pub guild_id: Option<GuildId>,
    pub shard_id: u32,
    pub channel_id: ChannelId,
    pub user: InteractionUser,
    pub locale: String,
    pub user_voice_channel: Option<VoiceChannelInfo>,
    pub bot_voice_channel: Option<ChannelId>,
    pub can_view_channel: bool,
    pub guild_icon_url: Option<String>,
}

/// Embeds and components for one response.
#[derive(Debug, Clone, Default)]
pub struct Reply {
    pub embeds: Vec<CreateEmbed>,
    pub components: Vec<CreateActionRow>,
    pub ephemeral: bool,
}

impl Reply {
    pub fn embed(embed: CreateEmbed) -> Self {
        Self {
            embeds: vec![embed],
            ..Default::default()
        }
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    pub fn components(mut self, components: Vec<CreateActionRow>) -> Self {
        self.components = components;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutocompleteChoice {
    pub name: String,
    pub value: String,
}

/// Owns the response to a single interaction.
///
/// Discord allows exactly one initial response; implementations track
/// whether it happened so [`Responder::respond`] can create or edit.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Responder: Send + Sync {
    async fn defer(&self, ephemeral: bool) -> Result<()>;

    /// Sends the initial response, or edits it once deferred or answered.
    async fn respond(&self, reply: Reply) -> Result<()>;

    /// Sends `reply` and collects button presses on it from the invoking
    /// user; each wait gives up after `inactivity`.
    async fn respond_paged(
        &self,
        reply: Reply,
        inactivity: Duration,
    ) -> Result<Box<dyn PageCollector>>;

    async fn autocomplete(&self, choices: Vec<AutocompleteChoice>) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    String(String),
    Integer(i64),
}

/// Top-level options of a slash command invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOptions(HashMap<String, OptionValue>);

impl CommandOptions {
    pub fn with(mut self, name: &str, value: OptionValue) -> Self {
        self.0.insert(name.to_string(), value);
        self
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.0.get(name)? {
            OptionValue::String(value) => Some(value),
            OptionValue::Integer(_) => None,
        }
    }

    pub fn get_integer(&self, name: &str) -> Option<i64> {
        match self.0.get(name)? {
            OptionValue::Integer(value) => Some(*value),
            OptionValue::String(_) => None,
        }
    }
}

pub struct SlashCommandParams<'a> {
    pub interaction: &'a InteractionContext,
    pub options: &'a CommandOptions,
    pub responder: &'a dyn Responder,
}

pub struct ComponentParams<'a> {
    pub interaction: &'a InteractionContext,
    /// Track id carried after the `_` of the custom id.
    pub reference_id: Option<&'a str>,
    pub responder: &'a dyn Responder,
}

pub struct AutocompleteParams<'a> {
    pub interaction: &'a InteractionContext,
    /// Current value of the focused option.
    pub focused: &'a str,
    pub responder: &'a dyn Responder,
}

#[async_trait]
pub trait SlashCommand: Send + Sync {
    fn name(&self) -> &'static str;

    fn definition(&self) -> CreateCommand;

    /// Registered only to the configured system guilds.
    fn is_system_command(&self) -> bool {
        false
    }

    async fn execute(&self, params: SlashCommandParams<'_>) -> Result<()>;
}

#[async_trait]
pub trait ComponentHandler: Send + Sync {
    /// Custom id prefix, before the `_`.
    fn name(&self) -> &'static str;

    async fn execute(&self, params: ComponentParams<'_>) -> Result<()>;
}

#[async_trait]
pub trait AutocompleteHandler: Send + Sync {
    /// Name of the slash command whose options are completed.
    fn name(&self) -> &'static str;

    async fn execute(&self, params: AutocompleteParams<'_>) -> Result<()>;
}

/// Handlers by name.
#[derive(Default)]
pub struct InteractionRegistry {
    slash_commands: HashMap<&'static str, Arc<dyn SlashCommand>>,
    components: HashMap<&'static str, Arc<dyn ComponentHandler>>,
    autocompletes: HashMap<&'static str, Arc<dyn AutocompleteHandler>>,
}

impl InteractionRegistry {
    pub fn new(
        config: Arc<Config>,
        queues: Arc<dyn QueueRegistry>,
        resolver: Arc<dyn TrackResolver>,
        shard_stats: Arc<dyn ShardStatsSource>,
    ) -> Self {
        let base = base::InteractionBase::new(config);
        let mut registry = Self::default();

        registry.register_command(Arc::new(commands::ShardsCommand::new(
            base.clone(),
            shard_stats,
        )));
        registry.register_command(Arc::new(commands::PlayCommand::new(
            base.clone(),
            queues.clone(),
            resolver.clone(),
        )));
        registry.register_command(Arc::new(commands::LoopCommand::new(
            base.clone(),
            queues.clone(),
        )));

        registry.register_component(Arc::new(components::PreviousButton::new(
            base.clone(),
            queues.clone(),
        )));
        registry.register_component(Arc::new(components::PauseResumeButton::new(
            base.clone(),
            queues.clone(),
        )));
        registry.register_component(Arc::new(components::SkipButton::new(
            base.clone(),
            queues.clone(),
        )));
        registry.register_component(Arc::new(components::ShowQueueButton::new(
            base.clone(),
            queues,
        )));

        registry.register_autocomplete(Arc::new(autocomplete::PlayAutocomplete::new(resolver)));

        registry
    }

    pub fn register_command(&mut self, command: Arc<dyn SlashCommand>) {
        self.slash_commands.insert(command.name(), command);
    }

    pub fn register_component(&mut self, component: Arc<dyn ComponentHandler>) {
        self.components.insert(component.name(), component);
    }

    pub fn register_autocomplete(&mut self, autocomplete: Arc<dyn AutocompleteHandler>) {
        self.autocompletes.insert(autocomplete.name(), autocomplete);
    }

    pub fn slash_command(&self, name: &str) -> Option<Arc<dyn SlashCommand>> {
        self.slash_commands.get(name).cloned()
    }

    pub fn component(&self, name: &str) -> Option<Arc<dyn ComponentHandler>> {
        self.components.get(name).cloned()
    }

    pub fn autocomplete(&self, name: &str) -> Option<Arc<dyn AutocompleteHandler>> {
        self.autocompletes.get(name).cloned()
    }

    pub fn slash_commands(&self) -> impl Iterator<Item = &Arc<dyn SlashCommand>> {
        self.slash_commands.values()
    }
}
