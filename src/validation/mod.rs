//! Guards that run before a handler touches the queue.
//!
//! A validator inspects [`ValidatorParams`] and either passes or returns an
//! [`InteractionValidationError`] naming the message to show. Handlers run
//! them through [`run_validators`], which stops at the first failure; the
//! dispatcher turns the error into an ephemeral warning embed.

mod permission;
mod queue;
mod system;
mod voice;

pub use permission::check_channel_permission_viewable;
pub use queue::{check_queue_current_track, check_queue_exists};
pub use system::check_valid_guild_id;
pub use voice::{check_in_voice_channel, check_same_voice_channel};

use crate::{
    audio::GuildQueue, config::BotOptions, interactions::InteractionContext, locale::Translator,
};

pub struct ValidatorParams<'a> {
    pub interaction: &'a InteractionContext,
    pub queue: Option<&'a dyn GuildQueue>,
    pub execution_id: &'a str,
    pub bot_options: &'a BotOptions,
}

pub type Validator = fn(&ValidatorParams<'_>) -> Result<(), InteractionValidationError>;

/// A failed precondition, rendered to the user as a warning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("interaction validation failed: {message_key}")]
pub struct InteractionValidationError {
    pub message_key: &'static str,
    pub args: Vec<(&'static str, String)>,
}

impl InteractionValidationError {
    pub fn new(message_key: &'static str) -> Self {
        Self {
            message_key,
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.args.push((name, value.into()));
        self
    }

    pub fn render(&self, translator: &Translator, icon: &str) -> String {
        let mut args: Vec<(&str, &str)> = vec![("icon", icon)];
        args.extend(self.args.iter().map(|(name, value)| (*name, value.as_str())));
        translator.translate(self.message_key, &args)
    }
}

pub fn run_validators(
    params: &ValidatorParams<'_>,
    validators: &[Validator],
) -> Result<(), InteractionValidationError> {
    validators
        .iter()
        .try_for_each(|validator| validator(params))
        .inspect_err(|e| {
            tracing::debug!(
                execution_id = params.execution_id,
                "Validation failed: {}",
                e.message_key
            )
        })
}
