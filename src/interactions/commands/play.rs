use anyhow::{Context, Result};
use async_trait::async_trait;
use serenity::{
    all::CommandOptionType,
    builder::{CreateCommand, CreateCommandOption},
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    audio::{QueueRegistry, TrackResolver},
    interactions::{base::InteractionBase, Reply, SlashCommand, SlashCommandParams},
    ui::{embeds, format},
    validation::{check_in_voice_channel, check_same_voice_channel},
};

/// `/play <query>`: resolves a URL or search and appends it to the queue,
/// joining the caller's voice channel first when needed.
pub struct PlayCommand {
    base: InteractionBase,
    queues: Arc<dyn QueueRegistry>,
    resolver: Arc<dyn TrackResolver>,
}

impl PlayCommand {
    pub fn new(
        base: InteractionBase,
        queues: Arc<dyn QueueRegistry>,
        resolver: Arc<dyn TrackResolver>,
    ) -> Self {
        Self {
            base,
            queues,
            resolver,
        }
    }
}

#[async_trait]
impl SlashCommand for PlayCommand {
    fn name(&self) -> &'static str {
        "play"
    }

    fn definition(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description("Add a track to the queue by search query or URL.")
            .dm_permission(false)
            .nsfw(false)
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "query",
                    "Search query or URL to play.",
                )
                .required(true)
                .max_length(500)
                .set_autocomplete(true),
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
            .context("/play used outside of a guild")?;
        let existing = self.queues.queue(guild_id);

        self.base.run_validators(
            interaction,
            existing.as_deref(),
            &[check_in_voice_channel, check_same_voice_channel],
        )?;
        responder.defer(false).await?;

        let config = self.base.config();
        let icons = &config.embed.icons;
        let translator = InteractionBase::translator(interaction);
        let query = options
            .get_string("query")
            .context("missing query option")?
            .trim();

        if let Some(queue) = &existing {
            if queue.tracks().len() >= config.player.max_queue_size {
                let description = translator.translate(
                    "commands.play.queueFull",
                    &[
                        ("icon", &icons.warning),
                        ("max", &config.player.max_queue_size.to_string()),
                    ],
                );
                return responder
                    .respond(Reply::embed(embeds::warning_embed(&config.embed, description)))
                    .await;
            }
        }

        let track = match self
            .resolver
            .resolve(query, InteractionBase::requester(interaction))
            .await
        {
            Ok(track) => track,
            Err(e) => {
                warn!("⚠️ No playable result for '{}': {:?}", query, e);
                let description = translator.translate(
                    "commands.play.noResults",
                    &[("icon", &icons.warning), ("query", query)],
                );
                return responder
                    .respond(Reply::embed(embeds::warning_embed(&config.embed, description)))
                    .await;
            }
        };

        let queue = match existing {
            Some(queue) => queue,
            None => {
                let voice = interaction
                    .user_voice_channel
                    .clone()
                    .context("user left the voice channel")?;
                self.queues
                    .connect(guild_id, voice, interaction.channel_id)
                    .await?
            }
        };
        queue.enqueue(track.clone()).await?;
        info!(
            "➕ '{}' added to the queue",
            track.title.as_deref().unwrap_or("unknown")
        );

        let description = translator.translate(
            "commands.play.trackAdded",
            &[
                ("icon", &icons.success),
                (
                    "track",
                    &format::display_track_duration_and_url(&track, icons, &translator),
                ),
            ],
        );
        let embed = embeds::success_embed(&config.embed, description)
            .author(self.base.embed_user_author(interaction))
            .thumbnail(format::track_thumbnail_url(&track, &config.embed.info));

        responder.respond(Reply::embed(embed)).await
    }
}
