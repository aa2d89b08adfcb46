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

pub struct PauseResumeButton {
    base: InteractionBase,
    queues: Arc<dyn QueueRegistry>,
}

impl PauseResumeButton {
    pub fn new(base: InteractionBase, queues: Arc<dyn QueueRegistry>) -> Self {
        Self { base, queues }
    }
}

#[async_trait]
impl ComponentHandler for PauseResumeButton {
    fn name(&self) -> &'static str {
        button_ids::PAUSE_RESUME
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

        let (key, icon) = if queue.is_paused().await {
            queue.resume()?;
            info!("▶️ Track resumed");
            ("commands.pauseResume.resumed", &options.icons.pause_resumed)
        } else {
            queue.pause()?;
            info!("⏸️ Track paused");
            ("commands.pauseResume.paused", &options.icons.paused)
        };

        responder
            .respond(track_action_reply(
                &self.base,
                interaction,
                &translator,
                key,
                icon,
                &track,
                &*queue,
            ))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        audio::{queue::{MockGuildQueue, MockQueueRegistry}, GuildQueue, RepeatMode},
        interactions::{
            test_support::{description, sample_interaction, sample_track, test_config},
            MockResponder,
        },
    };
    use uuid::Uuid;

    fn button(queue: MockGuildQueue) -> PauseResumeButton {
        let queue: Arc<dyn GuildQueue> = Arc::new(queue);
        let mut queues = MockQueueRegistry::new();
        queues.expect_queue().returning(move |_| Some(queue.clone()));
        PauseResumeButton::new(InteractionBase::new(test_config()), Arc::new(queues))
    }

    #[tokio::test]
    async fn pauses_playing_track() {
        let track = sample_track("Playing");
        let reference = track.id.to_string();
        let mut queue = MockGuildQueue::new();
        queue.expect_current_track().returning(move || Some(track.clone()));
        queue.expect_is_paused().returning(|| false);
        queue.expect_pause().times(1).returning(|| Ok(()));
        queue.expect_resume().never();
        queue.expect_repeat_mode().returning(|| RepeatMode::Track);

        let mut responder = MockResponder::new();
        responder.expect_defer().withf(|ephemeral| *ephemeral).returning(|_| Ok(()));
        responder
            .expect_respond()
            .times(1)
            .withf(|reply| {
                let text = description(reply);
                text.contains("Paused track") && text.contains("Looping track")
            })
            .returning(|_| Ok(()));

        button(queue)
            .execute(ComponentParams {
                interaction: &sample_interaction(),
                reference_id: Some(&reference),
                responder: &responder,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn resumes_paused_track() {
        let track = sample_track("Paused");
        let reference = track.id.to_string();
        let mut queue = MockGuildQueue::new();
        queue.expect_current_track().returning(move || Some(track.clone()));
        queue.expect_is_paused().returning(|| true);
        queue.expect_resume().times(1).returning(|| Ok(()));
        queue.expect_pause().never();
        queue.expect_repeat_mode().returning(|| RepeatMode::Off);

        let mut responder = MockResponder::new();
        responder.expect_defer().returning(|_| Ok(()));
        responder
            .expect_respond()
            .withf(|reply| description(reply).contains("Resumed track"))
            .returning(|_| Ok(()));

        button(queue)
            .execute(ComponentParams {
                interaction: &sample_interaction(),
                reference_id: Some(&reference),
                responder: &responder,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn stale_button_leaves_queue_alone() {
        let mut queue = MockGuildQueue::new();
        queue
            .expect_current_track()
            .returning(|| Some(sample_track("Newer")));
        queue.expect_is_paused().never();
        queue.expect_pause().never();
        queue.expect_resume().never();

        let mut responder = MockResponder::new();
        responder.expect_defer().returning(|_| Ok(()));
        responder
            .expect_respond()
            .times(1)
            .withf(|reply| description(reply).contains("not playing anymore"))
            .returning(|_| Ok(()));

        button(queue)
            .execute(ComponentParams {
                interaction: &sample_interaction(),
                reference_id: Some(&Uuid::new_v4().to_string()),
                responder: &responder,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn button_without_reference_is_stale() {
        let mut queue = MockGuildQueue::new();
        queue
            .expect_current_track()
            .returning(|| Some(sample_track("Playing")));
        queue.expect_pause().never();
        queue.expect_resume().never();

        let mut responder = MockResponder::new();
        responder.expect_defer().returning(|_| Ok(()));
        responder
            .expect_respond()
            .times(1)
            .withf(|reply| description(reply).contains("not playing anymore"))
            .returning(|_| Ok(()));

        button(queue)
            .execute(ComponentParams {
                interaction: &sample_interaction(),
                reference_id: None,
                responder: &responder,
            })
            .await
            .unwrap();
    }
}
