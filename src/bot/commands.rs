use anyhow::{Context as _, Result};
use serenity::{
    all::{Command, Http},
    builder::CreateCommand,
    model::id::GuildId,
};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::{config::BotOptions, interactions::InteractionRegistry};

/// Where each command definition gets registered.
#[derive(Default)]
pub struct RegistrationPlan {
    pub global: Vec<CreateCommand>,
    pub guilds: BTreeMap<GuildId, Vec<CreateCommand>>,
}

/// Regular commands go to the development guild when one is configured,
/// globally otherwise. System commands only ever go to the system guilds.
pub fn registration_plan(registry: &InteractionRegistry, options: &BotOptions) -> RegistrationPlan {
    let mut plan = RegistrationPlan::default();

    for command in registry.slash_commands() {
        if command.is_system_command() {
            for guild_id in &options.system_guild_ids {
                plan.guilds
                    .entry(GuildId::new(*guild_id))
                    .or_default()
                    .push(command.definition());
            }
            continue;
        }

        match options.dev_guild_id {
            Some(guild_id) => plan
                .guilds
                .entry(GuildId::new(guild_id))
                .or_default()
                .push(command.definition()),
            None => plan.global.push(command.definition()),
        }
    }

    plan
}

/// Overwrites the registered commands with the current definitions.
pub async fn register_commands(
    http: &Http,
    registry: &InteractionRegistry,
    options: &BotOptions,
) -> Result<()> {
    let plan = registration_plan(registry, options);

    if options.dev_guild_id.is_none() {
        let count = plan.global.len();
        Command::set_global_commands(http, plan.global)
            .await
            .context("failed to register global commands")?;
        info!("🌐 Registered {} global commands", count);
    }

    for (guild_id, commands) in plan.guilds {
        let count = commands.len();
        match guild_id.set_commands(http, commands).await {
            Ok(_) => info!("🏠 Registered {} commands in guild {}", count, guild_id),
            Err(e) => warn!(
                "⚠️ Could not register commands in guild {}: {:?}. Is the bot a member with 'applications.commands'?",
                guild_id, e
            ),
        }
    }

    Ok(())
}
