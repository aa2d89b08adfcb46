use anyhow::{Context, Result};
use async_trait::async_trait;
use serenity::builder::CreateEmbedFooter;
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, warn};

use crate::{
    audio::{GuildQueue, QueueRegistry, Track},
    interactions::{
        base::InteractionBase,
        pagination::{PageAction, QueuePaginator},
        ComponentHandler, ComponentParams, InteractionContext, Reply,
    },
    locale::{format_slash_command, Translator},
    ui::{buttons, buttons::button_ids, embeds, format},
    validation::{check_queue_current_track, check_queue_exists},
};

const PAGINATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Past this many tracks the estimate is not worth computing.
const ESTIMATE_TRACK_LIMIT: usize = 1000;

/// Ephemeral, paginated view of the queue.
pub struct ShowQueueButton {
    base: InteractionBase,
    queues: Arc<dyn QueueRegistry>,
}

impl ShowQueueButton {
    pub fn new(base: InteractionBase, queues: Arc<dyn QueueRegistry>) -> Self {
        Self { base, queues }
    }

    async fn render(
        &self,
        interaction: &InteractionContext,
        queue: &dyn GuildQueue,
        paginator: &QueuePaginator,
        translator: &Translator,
    ) -> Reply {
        let config = self.base.config();
        let icons = &config.embed.icons;
        let tracks = queue.tracks();
        let current = queue.current_track();

        let mut sections = Vec::new();
        if let Some(current) = &current {
            let title = if queue.is_paused().await {
                translator.translate("musicPlayerCommon.nowPausedTitle", &[("icon", &icons.paused)])
            } else {
                translator.translate(
                    "musicPlayerCommon.nowPlayingTitle",
                    &[("icon", &icons.audio_playing)],
                )
            };
            sections.push(title);
            sections.push(format::display_track_duration_and_url(current, icons, translator));
            sections.push(translator.translate(
                "musicPlayerCommon.requestedBy",
                &[("user", &format::display_requested_by(current, translator))],
            ));
            sections.push(format::queue_progress_bar(
                current,
                queue.timestamp().await,
                &config.player.progress_bar,
                icons,
                translator,
            ));
            sections.push(String::new());
        }

        let repeat = format::format_repeat_mode_detailed(queue.repeat_mode(), icons, translator);
        if !repeat.is_empty() {
            sections.push(repeat);
            sections.push(String::new());
        }

        if tracks.is_empty() {
            sections.push(translator.translate(
                "musicPlayerCommon.noTracksInQueue",
                &[
                    ("icon", &icons.warning),
                    ("playCommand", &format_slash_command("play")),
                ],
            ));
        } else {
            sections.push(translator.translate(
                "musicPlayerCommon.tracksInQueueTitle",
                &[("icon", &icons.queue)],
            ));
            let start = paginator.page() * format::TRACKS_PER_PAGE;
            sections.extend(
                tracks
                    .iter()
                    .enumerate()
                    .skip(start)
                    .take(format::TRACKS_PER_PAGE)
                    .map(|(index, track)| {
                        format!(
                            "**{}.** {}",
                            index + 1,
                            format::display_track_duration_and_url(track, icons, translator)
                        )
                    }),
            );
        }

        let footer = format!(
            "{} - {}",
            format::footer_page_info(paginator.page(), tracks.len(), translator),
            estimated_duration(current.as_ref(), &tracks, translator)
        );

        let mut embed = embeds::info_embed(&config.embed, sections.join("\n"))
            .author(self.base.embed_queue_author(interaction, queue, translator))
            .footer(CreateEmbedFooter::new(footer));
        if let Some(current) = &current {
            embed = embed.thumbnail(format::track_thumbnail_url(current, &config.embed.info));
        }

        Reply::embed(embed)
            .components(vec![buttons::pagination_row(
                paginator.is_first(),
                paginator.is_last(),
                icons,
            )])
            .ephemeral()
    }
}

/// Total playing time of the current track and everything queued behind it.
fn estimated_duration(current: Option<&Track>, tracks: &[Track], translator: &Translator) -> String {
    let total = if tracks.len() > ESTIMATE_TRACK_LIMIT {
        None
    } else {
        current
            .into_iter()
            .chain(tracks)
            .filter_map(|track| track.duration)
            .try_fold(Duration::ZERO, Duration::checked_add)
    };

    match total {
        Some(total) => translator.translate(
            "commands.queue.estimatedDuration",
            &[("duration", &format::format_duration(total))],
        ),
        None => translator.translate("commands.queue.estimatedReallyLongTime", &[]),
    }
}

#[async_trait]
impl ComponentHandler for ShowQueueButton {
    fn name(&self) -> &'static str {
        button_ids::SHOW_QUEUE
    }

    async fn execute(&self, params: ComponentParams<'_>) -> Result<()> {
        let ComponentParams {
            interaction,
            responder,
            ..
        } = params;
        let guild_id = interaction.guild_id.context("button pressed outside of a guild")?;
        let queue = self.queues.queue(guild_id);

        self.base.run_validators(
            interaction,
            queue.as_deref(),
            &[check_queue_exists, check_queue_current_track],
        )?;
        let queue = queue.context("queue vanished after validation")?;
        responder.defer(true).await?;

        let options = &self.base.config().embed;
        let translator = InteractionBase::translator(interaction);
        let mut paginator = QueuePaginator::new(queue.tracks().len());

        let first_page = self.render(interaction, &*queue, &paginator, &translator).await;
        let mut collector = responder.respond_paged(first_page, PAGINATION_TIMEOUT).await?;

        while let Some(custom_id) = collector.next_press().await {
            let Some(action) = PageAction::from_custom_id(&custom_id) else {
                continue;
            };

            paginator.resize(queue.tracks().len());
            let step = paginator.apply(action);
            debug!("Queue view moved to page {}.", step.page + 1);

            if step.at_boundary {
                let notice = embeds::warning_embed(
                    options,
                    translator.translate(
                        "commands.queue.noMorePages",
                        &[("icon", &options.icons.warning)],
                    ),
                );
                if let Err(e) = collector.notify(Reply::embed(notice).ephemeral()).await {
                    warn!("⚠️ Failed to send page boundary notice: {:?}", e);
                }
            }

            let page = self.render(interaction, &*queue, &paginator, &translator).await;
            if let Err(e) = collector.update(page).await {
                error!("❌ Failed to update queue view: {:?}", e);
                let notice = embeds::error_embed(
                    options,
                    translator.translate(
                        "commands.queue.paginationError",
                        &[("icon", &options.icons.error)],
                    ),
                );
                if let Err(e) = collector.notify(Reply::embed(notice).ephemeral()).await {
                    warn!("⚠️ Failed to send pagination error notice: {:?}", e);
                }
            }
        }

        debug!("Queue view expired after {:?} without a press.", PAGINATION_TIMEOUT);
        if let Err(e) = collector.close().await {
            warn!("⚠️ Failed to delete expired queue view: {:?}", e);
        }

        Ok(())
    }
}
