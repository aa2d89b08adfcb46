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

pub struct SkipButton {
    base: InteractionBase,
    queues: Arc<dyn QueueRegistry>,
}

impl SkipButton {
    pub fn new(base: InteractionBase, queues: Arc<dyn QueueRegistry>) -> Self {
        Self { base, queues }
    }
}

#[async_trait]
impl ComponentHandler for SkipButton {
    fn name(&self) -> &'static str {
        button_ids::SKIP
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

        let Some(track) = referenced_track(&*queue, reference_id) else {
            return responder
                .respond(warning_reply(options, &translator, "validation.trackNotPlayingAnymore"))
                .await;
        };

        if queue.is_paused().await {
            return responder
                .respond(warning_reply(options, &translator, "validation.cannotSkipPausedTrack"))
                .await;
        }

        queue.skip()?;
        info!(
            "⏭️ Skipped '{}'",
            track.title.as_deref().unwrap_or("unknown")
        );

        responder
            .respond(track_action_reply(
                &self.base,
                interaction,
                &translator,
                "commands.skip.skippedTrack",
                &options.icons.skipped,
                &track,
                &*queue,
            ))
            .await
    }
}
