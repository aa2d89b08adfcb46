use super::{InteractionValidationError, ValidatorParams};

/// The bot needs View Channel in the channel the interaction came from,
/// otherwise follow-up messages fail.
pub fn check_channel_permission_viewable(
    params: &ValidatorParams<'_>,
) -> Result<(), InteractionValidationError> {
    if !params.interaction.can_view_channel {
        tracing::debug!(
            "Missing View Channel permission in channel {}.",
            params.interaction.channel_id
        );
        return Err(InteractionValidationError::new("validation.cannotViewChannel"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::BotOptions, interactions::test_support::sample_interaction};

    #[test]
    fn hidden_channel_fails() {
        let mut interaction = sample_interaction();
        interaction.can_view_channel = false;
        let bot_options = BotOptions::default();
        let params = ValidatorParams {
            interaction: &interaction,
            queue: None,
            execution_id: "exec",
            bot_options: &bot_options,
        };

        assert_eq!(
            check_channel_permission_viewable(&params).unwrap_err().message_key,
            "validation.cannotViewChannel"
        );
    }
}
