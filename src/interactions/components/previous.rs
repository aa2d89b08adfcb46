use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::{referenced_track, track_action_reply, warning_reply, TRACK_CONTROL_VALIDATORS};
use crate::{
    audio::QueueRegistry,
    interactions::{base::InteractionBase, ComponentHandler, ComponentParams},
    ui::buttons::button_ids,
};

/// Steps back to the most recently finished track.
pub struct PreviousButton {
    base: InteractionBase,
    queues: Arc<dyn QueueRegistry>,
}

impl PreviousButton {
    pub fn new(base: InteractionBase, queues: Arc<dyn QueueRegistry>) -> Self {
        Self { base, queues }
    }
}

#[async_trait]
impl ComponentHandler for PreviousButton {
    fn name(&self) -> &'static str {
        button_ids::PREVIOUS
    }

    async fn execute(&self, params: ComponentParams<'_>) -> Result<()> {
        let ComponentParams {
            interaction,
            reference_id,
            responder,
        } = params;
        let guild_id = interaction.guild_id.context("button pressed outside of a guild")?;
        let queue = self.queues.queue(guild_id);

        self.base
            .run_validators(interaction, queue.as_deref(), &TRACK_CONTROL_VALIDATORS)?;
        let queue = queue.context("queue vanished after validation")?;
        responder.defer(true).await?;

        let options = &self.base.config().embed;
        let translator = InteractionBase::translator(interaction);

        if referenced_track(&*queue, reference_id).is_none() {
            return responder
                .respond(warning_reply(options, &translator, "validation.trackNotPlayingAnymore"))
                .await;
        }

        if queue.is_paused().await {
            return responder
                .respond(warning_reply(options, &translator, "validation.cannotSkipPausedTrack"))
                .await;
        }

        if queue.history_len() == 0 {
            return responder
                .respond(warning_reply(options, &translator, "commands.back.trackHistoryEmpty"))
                .await;
        }

        let replayed = queue.back().await?;
        info!(
            "⏮️ Replaying '{}'",
            replayed.title.as_deref().unwrap_or("unknown")
        );

        responder
            .respond(track_action_reply(
                &self.base,
                interaction,
                &translator,
                "commands.back.trackReplayed",
                &options.icons.back,
                &replayed,
                &*queue,
            ))
            .await
    }
}
