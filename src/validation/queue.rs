use super::{InteractionValidationError, ValidatorParams};
use crate::locale::format_slash_command;

pub fn check_queue_exists(params: &ValidatorParams<'_>) -> Result<(), InteractionValidationError> {
    if params.queue.is_none() {
        tracing::debug!("There is no queue for this guild.");
        return Err(InteractionValidationError::new("validation.queueDoesNotExist")
            .with_arg("playCommand", format_slash_command("play")));
    }

    Ok(())
}

pub fn check_queue_current_track(
    params: &ValidatorParams<'_>,
) -> Result<(), InteractionValidationError> {
    let has_current = params
        .queue
        .is_some_and(|queue| queue.current_track().is_some());

    if !has_current {
        tracing::debug!("There is no track currently playing.");
        return Err(InteractionValidationError::new("validation.queueNoCurrentTrack")
            .with_arg("playCommand", format_slash_command("play")));
    }

    Ok(())
}
