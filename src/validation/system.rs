use super::{InteractionValidationError, ValidatorParams};

/// System commands only run inside the configured system guilds.
pub fn check_valid_guild_id(params: &ValidatorParams<'_>) -> Result<(), InteractionValidationError> {
    let allowed = params
        .interaction
        .guild_id
        .is_some_and(|guild_id| params.bot_options.system_guild_ids.contains(&guild_id.get()));

    if !allowed {
        tracing::debug!(
            "System command used in guild {:?} which is not a system guild.",
            params.interaction.guild_id
        );
        return Err(InteractionValidationError::new("validation.systemCommandInvalidGuild"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::BotOptions, interactions::test_support::sample_interaction};

    #[test]
    fn only_system_guilds_pass() {
        let interaction = sample_interaction();
        let guild_id = interaction.guild_id.unwrap().get();

        let mut bot_options = BotOptions::default();
        let params = ValidatorParams {
            interaction: &interaction,
            queue: None,
            execution_id: "exec",
            bot_options: &bot_options,
        };
        assert!(check_valid_guild_id(&params).is_err());

        bot_options.system_guild_ids = vec![guild_id];
        let params = ValidatorParams {
            interaction: &interaction,
            queue: None,
            execution_id: "exec",
            bot_options: &bot_options,
        };
        assert!(check_valid_guild_id(&params).is_ok());
    }
}
