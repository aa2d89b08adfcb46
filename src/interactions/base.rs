use serenity::builder::CreateEmbedAuthor;
use std::sync::Arc;
use tracing::Span;

use super::InteractionContext;
use crate::{
    audio::{GuildQueue, Requester},
    config::Config,
    locale::Translator,
    validation::{self, InteractionValidationError, Validator, ValidatorParams},
};

/// Helpers every interaction handler composes.
#[derive(Clone)]
pub struct InteractionBase {
    config: Arc<Config>,
}

impl InteractionBase {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Span carrying the structured context of one handler execution.
    pub fn span(module: &'static str, name: &str, interaction: &InteractionContext) -> Span {
        tracing::info_span!(
            "interaction",
            module = module,
            name = name,
            execution_id = %interaction.execution_id,
            shard_id = interaction.shard_id,
            guild_id = interaction.guild_id.map(|id| id.get()),
        )
    }

    /// Messages follow the guild's preferred locale.
    pub fn translator(interaction: &InteractionContext) -> Translator {
        Translator::for_locale(&interaction.locale)
    }

    pub fn run_validators(
        &self,
        interaction: &InteractionContext,
        queue: Option<&dyn GuildQueue>,
        validators: &[Validator],
    ) -> Result<(), InteractionValidationError> {
        let params = ValidatorParams {
            interaction,
            queue,
            execution_id: &interaction.execution_id,
            bot_options: &self.config.bot,
        };
        validation::run_validators(&params, validators)
    }

    pub fn requester(interaction: &InteractionContext) -> Requester {
        let user = &interaction.user;
        Requester {
            id: user.id,
            name: user.nickname.clone().unwrap_or_else(|| user.name.clone()),
            avatar_url: user.avatar_url.clone(),
        }
    }

    /// Author line showing the invoking user by nickname when set.
    pub fn embed_user_author(&self, interaction: &InteractionContext) -> CreateEmbedAuthor {
        let user = &interaction.user;
        let name = user.nickname.clone().unwrap_or_else(|| user.name.clone());
        let icon = user
            .avatar_url
            .clone()
            .unwrap_or_else(|| self.config.embed.info.fallback_icon_url.clone());

        CreateEmbedAuthor::new(name).icon_url(icon)
    }

    /// Author line showing the queue's voice channel and its bitrate.
    pub fn embed_queue_author(
        &self,
        interaction: &InteractionContext,
        queue: &dyn GuildQueue,
        translator: &Translator,
    ) -> CreateEmbedAuthor {
        let (channel, bitrate) = queue
            .voice_channel()
            .map(|channel| {
                let kbps = channel.bitrate.unwrap_or_default() / 1000;
                (channel.name, kbps.to_string())
            })
            .unwrap_or_default();

        let icon = interaction
            .guild_icon_url
            .clone()
            .unwrap_or_else(|| self.config.embed.info.fallback_icon_url.clone());

        CreateEmbedAuthor::new(translator.translate(
            "musicPlayerCommon.voiceChannelInfo",
            &[("channel", &channel), ("bitrate", &bitrate)],
        ))
        .icon_url(icon)
    }
}
