use anyhow::{Context, Result};
use async_trait::async_trait;
use serenity::{
    all::CommandOptionType,
    builder::{CreateCommand, CreateCommandOption},
};
use std::sync::Arc;
use tracing::info;

use crate::{
    audio::{QueueRegistry, RepeatMode},
    interactions::{base::InteractionBase, Reply, SlashCommand, SlashCommandParams},
    ui::{embeds, format},
    validation::{check_in_voice_channel, check_queue_exists, check_same_voice_channel},
};

pub struct LoopCommand {
    base: InteractionBase,
    queues: Arc<dyn QueueRegistry>,
}

impl LoopCommand {
    pub fn new(base: InteractionBase, queues: Arc<dyn QueueRegistry>) -> Self {
        Self { base, queues }
    }
}

#[async_trait]
impl SlashCommand for LoopCommand {
    fn name(&self) -> &'static str {
        "loop"
    }

    fn definition(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description("Repeat the current track or the whole queue.")
            .dm_permission(false)
            .nsfw(false)
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, "mode", "Repeat mode to use.")
                    .required(true)
                    .add_string_choice("Off", "off")
                    .add_string_choice("Track", "track")
                    .add_string_choice("Queue", "queue"),
            )
    }

    async fn execute(&self, params: SlashCommandParams<'_>) -> Result<()> {
        let SlashCommandParams {
            interaction,
            options,
            responder,
        } = params;
        let guild_id = interaction
            .guild_id
            .context("/loop used outside of a guild")?;
        let queue = self.queues.queue(guild_id);

        self.base.run_validators(
            interaction,
            queue.as_deref(),
            &[check_in_voice_channel, check_same_voice_channel, check_queue_exists],
        )?;
        let queue = queue.context("queue vanished after validation")?;

        let mode: RepeatMode = options
            .get_string("mode")
            .context("missing mode option")?
            .parse()?;
        queue.set_repeat_mode(mode);
        info!("🔁 Repeat mode set to {}", mode);

        let config = self.base.config();
        let translator = InteractionBase::translator(interaction);
        let description = match mode {
            RepeatMode::Off => translator.translate(
                "commands.loop.disabled",
                &[("icon", &config.embed.icons.success)],
            ),
            mode => format::format_repeat_mode_detailed(mode, &config.embed.icons, &translator),
        };

        responder
            .respond(Reply::embed(
                embeds::success_embed(&config.embed, description)
                    .author(self.base.embed_user_author(interaction)),
            ))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        audio::{
            queue::{MockGuildQueue, MockQueueRegistry},
            GuildQueue,
        },
        interactions::{
            test_support::{description, sample_interaction, test_config},
            CommandOptions, MockResponder, OptionValue,
        },
        validation::InteractionValidationError,
    };
    use pretty_assertions::assert_eq;

    fn mode(value: &str) -> CommandOptions {
        CommandOptions::default().with("mode", OptionValue::String(value.into()))
    }

    fn registry_with(queue: MockGuildQueue) -> MockQueueRegistry {
        let queue: Arc<dyn GuildQueue> = Arc::new(queue);
        let mut queues = MockQueueRegistry::new();
        queues
            .expect_queue()
            .returning(move |_| Some(queue.clone()));
        queues
    }

    #[tokio::test]
    async fn switches_to_queue_repeat() {
        let mut queue = MockGuildQueue::new();
        queue
            .expect_set_repeat_mode()
            .withf(|mode| *mode == RepeatMode::Queue)
            .times(1)
            .return_const(());

        let command = LoopCommand::new(
            InteractionBase::new(test_config()),
            Arc::new(registry_with(queue)),
        );
        let mut responder = MockResponder::new();
        responder
            .expect_respond()
            .times(1)
            .withf(|reply| description(reply).contains("Looping queue"))
            .returning(|_| Ok(()));

        command
            .execute(SlashCommandParams {
                interaction: &sample_interaction(),
                options: &mode("queue"),
                responder: &responder,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn disabling_uses_dedicated_message() {
        let mut queue = MockGuildQueue::new();
        queue.expect_set_repeat_mode().return_const(());

        let command = LoopCommand::new(
            InteractionBase::new(test_config()),
            Arc::new(registry_with(queue)),
        );
        let mut responder = MockResponder::new();
        responder
            .expect_respond()
            .withf(|reply| description(reply).starts_with("**✅ Looping disabled**"))
            .returning(|_| Ok(()));

        command
            .execute(SlashCommandParams {
                interaction: &sample_interaction(),
                options: &mode("off"),
                responder: &responder,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn refuses_without_queue() {
        let mut queues = MockQueueRegistry::new();
        queues.expect_queue().returning(|_| None);
        let command = LoopCommand::new(InteractionBase::new(test_config()), Arc::new(queues));

        let error = command
            .execute(SlashCommandParams {
                interaction: &sample_interaction(),
                options: &mode("track"),
                responder: &MockResponder::new(),
            })
            .await
            .unwrap_err();

        assert_eq!(
            error
                .downcast_ref::<InteractionValidationError>()
                .map(|e| e.message_key),
            Some("validation.queueDoesNotExist")
        );
    }
}
