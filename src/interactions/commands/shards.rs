use anyhow::Result;
use async_trait::async_trait;
use serenity::{
    all::CommandOptionType,
    builder::{CreateCommand, CreateCommandOption, CreateEmbedFooter},
};
use std::{sync::Arc, time::Duration};
use tracing::debug;

use crate::{
    interactions::{base::InteractionBase, Reply, SlashCommand, SlashCommandParams},
    stats::{self, ShardSort, ShardStatsSource, SHARDS_PER_PAGE},
    ui::{embeds, format},
    validation::check_valid_guild_id,
};

/// `/shards`: paged overview of every shard's load.
pub struct ShardsCommand {
    base: InteractionBase,
    stats: Arc<dyn ShardStatsSource>,
}

impl ShardsCommand {
    pub fn new(base: InteractionBase, stats: Arc<dyn ShardStatsSource>) -> Self {
        Self { base, stats }
    }
}

#[async_trait]
impl SlashCommand for ShardsCommand {
    fn name(&self) -> &'static str {
        "shards"
    }

    fn is_system_command(&self) -> bool {
        true
    }

    fn definition(&self) -> CreateCommand {
        let sort = ShardSort::CHOICES.iter().fold(
            CreateCommandOption::new(CommandOptionType::String, "sort", "What to sort the shards by.")
                .required(false),
            |option, (name, value)| option.add_string_choice(*name, *value),
        );

        CreateCommand::new(self.name())
            .description("Show information about all connected shards.")
            .dm_permission(false)
            .nsfw(false)
            .add_option(sort)
            .add_option(
                CreateCommandOption::new(CommandOptionType::Integer, "page", "Page number to display.")
                    .min_int_value(1)
                    .required(false),
            )
    }

    async fn execute(&self, params: SlashCommandParams<'_>) -> Result<()> {
        let SlashCommandParams {
            interaction,
            options,
            responder,
        } = params;
        self.base
            .run_validators(interaction, None, &[check_valid_guild_id])?;
        responder.defer(false).await?;

        let config = self.base.config();
        let translator = InteractionBase::translator(interaction);
        let sort = options
            .get_string("sort")
            .and_then(|sort| sort.parse().ok())
            .unwrap_or_default();
        let page_index = options
            .get_integer("page")
            .map_or(0, |page| page.max(1) as usize - 1);

        let shards = stats::fetch_shard_info(
            &*self.stats,
            sort,
            Duration::from_secs(config.bot.shard_stats_timeout_secs),
        )
        .await?;
        let total_pages = format::total_pages(shards.len(), SHARDS_PER_PAGE);

        let Some(page) = stats::shard_page(&shards, page_index) else {
            debug!("Page {} requested but only {} pages exist.", page_index + 1, total_pages);
            let description = translator.translate(
                "commands.shards.invalidPage",
                &[
                    ("icon", &config.embed.icons.warning),
                    ("page", &(page_index + 1).to_string()),
                    ("pageCount", &total_pages.to_string()),
                ],
            );
            return responder
                .respond(Reply::embed(embeds::warning_embed(&config.embed, description)))
                .await;
        };

        let overview = translator.translate(
            "commands.shards.overview",
            &[
                ("icon", &config.embed.icons.server),
                ("count", &shards.len().to_string()),
            ],
        );
        let embed = embeds::info_embed(&config.embed, overview)
            .author(self.base.embed_user_author(interaction))
            .fields(stats::build_embed_fields(page))
            .footer(CreateEmbedFooter::new(translator.translate(
                "commands.shards.footer",
                &[
                    ("shardId", &interaction.shard_id.to_string()),
                    ("page", &(page_index + 1).to_string()),
                    ("pageCount", &total_pages.to_string()),
                ],
            )));

        debug!("Showing shard overview page {} of {}.", page_index + 1, total_pages);
        responder.respond(Reply::embed(embed)).await
    }
}
