use super::{InteractionValidationError, ValidatorParams};

/// The invoking user must be connected to a voice channel.
pub fn check_in_voice_channel(params: &ValidatorParams<'_>) -> Result<(), InteractionValidationError> {
    if params.interaction.user_voice_channel.is_none() {
        tracing::debug!("User tried to use an interaction outside a voice channel.");
        return Err(InteractionValidationError::new("validation.notInVoiceChannel"));
    }

    Ok(())
}

/// When the bot is connected, the user must share its voice channel.
pub fn check_same_voice_channel(
    params: &ValidatorParams<'_>,
) -> Result<(), InteractionValidationError> {
    let interaction = params.interaction;
    let Some(bot_channel) = interaction.bot_voice_channel else {
        return Ok(());
    };

    let user_channel = interaction.user_voice_channel.as_ref().map(|channel| channel.id);
    if user_channel != Some(bot_channel) {
        tracing::debug!(
            "User tried to use an interaction from voice channel {:?} while the bot is in {}.",
            user_channel,
            bot_channel
        );
        return Err(InteractionValidationError::new("validation.notInSameVoiceChannel"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        audio::VoiceChannelInfo, config::BotOptions, interactions::test_support::sample_interaction,
    };
    use serenity::model::id::ChannelId;

    #[test]
    fn user_outside_voice_fails() {
        let mut interaction = sample_interaction();
        interaction.user_voice_channel = None;
        let bot_options = BotOptions::default();
        let params = ValidatorParams {
            interaction: &interaction,
            queue: None,
            execution_id: "exec",
            bot_options: &bot_options,
        };

        let error = check_in_voice_channel(&params).unwrap_err();
        assert_eq!(error.message_key, "validation.notInVoiceChannel");
    }

    #[test]
    fn bot_elsewhere_fails_and_absent_bot_passes() {
        let mut interaction = sample_interaction();
        interaction.user_voice_channel = Some(VoiceChannelInfo {
            id: ChannelId::new(10),
            name: "General".into(),
            bitrate: Some(64_000),
        });
        interaction.bot_voice_channel = Some(ChannelId::new(11));
        let bot_options = BotOptions::default();

        let params = ValidatorParams {
            interaction: &interaction,
            queue: None,
            execution_id: "exec",
            bot_options: &bot_options,
        };
        assert_eq!(
            check_same_voice_channel(&params).unwrap_err().message_key,
            "validation.notInSameVoiceChannel"
        );

        let mut alone = interaction.clone();
        alone.bot_voice_channel = None;
        let params = ValidatorParams {
            interaction: &alone,
            ..params
        };
        assert!(check_same_voice_channel(&params).is_ok());
    }
}
