use anyhow::{Context, Result};
use serenity::{model::gateway::GatewayIntents, model::id::ApplicationId, Client};
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use tracing::{error, info};

mod audio;
mod bot;
mod config;
mod interactions;
mod locale;
mod stats;
mod ui;
mod validation;

use crate::{
    audio::player::AudioPlayer,
    bot::{events::PlayerEventHandler, handlers::Dispatcher, CadenceBot},
    config::Config,
    interactions::{base::InteractionBase, InteractionRegistry},
    stats::ClusterStats,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cadence=debug".parse()?)
                .add_directive("serenity=info".parse()?)
                .add_directive("songbird=info".parse()?),
        )
        .init();

    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check().await;
    }

    info!("🎵 Starting Cadence v{}", env!("CARGO_PKG_VERSION"));

    let config = Arc::new(Config::load()?);
    info!("{}", config.summary());

    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_VOICE_STATES;

    let songbird = Songbird::serenity();
    let player = Arc::new(AudioPlayer::new(songbird.clone(), config.clone()));
    let stats = Arc::new(ClusterStats::new(player.clone()));
    let registry = InteractionRegistry::new(
        config.clone(),
        player.clone(),
        player.clone(),
        stats.clone(),
    );
    let dispatcher = Dispatcher::new(registry, InteractionBase::new(config.clone()));
    let handler = CadenceBot::new(config.clone(), player.clone(), dispatcher);

    let mut builder = Client::builder(&config.discord_token, intents).event_handler(handler);
    if let Some(application_id) = config.application_id {
        builder = builder.application_id(ApplicationId::new(application_id));
    }
    let mut client = builder
        .register_songbird_with(songbird)
        .await
        .context("failed to build the Discord client")?;

    player.bind_events(Arc::new(PlayerEventHandler::new(
        client.http.clone(),
        client.cache.clone(),
        config.clone(),
    )));
    stats.bind(client.cache.clone(), client.shard_manager.clone());

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("❌ Could not listen for Ctrl+C: {:?}", e);
            return;
        }
        info!("⚠️ Shutdown signal received, closing shards...");
        shard_manager.shutdown_all().await;
    });

    info!("🚀 Connecting to Discord");
    if let Err(why) = client.start_autosharded().await {
        error!("❌ Client stopped with an error: {:?}", why);
    }

    Ok(())
}

/// Container probe: the bot cannot resolve tracks without yt-dlp.
async fn health_check() -> Result<()> {
    let yt_dlp = async_process::Command::new("yt-dlp")
        .arg("--version")
        .output()
        .await
        .context("yt-dlp is not installed")?;

    if yt_dlp.status.success() {
        println!("OK");
        Ok(())
    } else {
        anyhow::bail!("yt-dlp --version exited with {}", yt_dlp.status);
    }
}
