//! # Shard statistics
//!
//! Snapshots of every shard for the `/shards` overview: memory, guilds,
//! members and player counters. Collection fans out to every shard in
//! parallel; a shard that fails or exceeds the timeout is left out instead
//! of failing the whole overview.

mod collector;

pub use collector::ClusterStats;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use serenity::model::id::GuildId;
use std::{str::FromStr, time::Duration};
use tracing::{error, warn};

use crate::ui::format::{format_decimal, format_number};

pub const SHARDS_PER_PAGE: usize = 10;

/// Widens the left column so both columns line up in the embed.
const COLUMN_FILLER: &str = "ㅤㅤㅤㅤㅤㅤㅤㅤㅤㅤㅤ";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerStatistics {
    pub active_voice_connections: u64,
    pub total_tracks: u64,
    pub total_listeners: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShardInfo {
    pub shard_id: u32,
    /// Megabytes, two decimals.
    pub memory_usage: f64,
    pub guild_count: u64,
    pub guild_member_count: u64,
    pub player_statistics: PlayerStatistics,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShardSort {
    #[default]
    None,
    Memory,
    Connections,
    Tracks,
    Listeners,
    Guilds,
    Members,
}

impl ShardSort {
    pub const CHOICES: [(&'static str, &'static str); 7] = [
        ("None", "none"),
        ("Memory usage", "memory"),
        ("Voice connections", "connections"),
        ("Tracks", "tracks"),
        ("Listeners", "listeners"),
        ("Guilds", "guilds"),
        ("Members", "members"),
    ];
}

impl FromStr for ShardSort {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "none" => Self::None,
            "memory" => Self::Memory,
            "connections" => Self::Connections,
            "tracks" => Self::Tracks,
            "listeners" => Self::Listeners,
            "guilds" => Self::Guilds,
            "members" => Self::Members,
            other => anyhow::bail!("unknown shard sort: {other}"),
        })
    }
}

/// Where per-shard snapshots come from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShardStatsSource: Send + Sync {
    async fn shard_ids(&self) -> Result<Vec<u32>>;

    async fn collect(&self, shard_id: u32) -> Result<ShardInfo>;
}

/// Shard a guild is routed to, following Discord's sharding formula.
pub fn shard_id_for(guild_id: GuildId, shard_count: u32) -> u32 {
    ((guild_id.get() >> 22) % u64::from(shard_count.max(1))) as u32
}

/// Collects every shard concurrently and sorts the survivors.
pub async fn fetch_shard_info(
    source: &dyn ShardStatsSource,
    sort: ShardSort,
    timeout: Duration,
) -> Result<Vec<ShardInfo>> {
    let shard_ids = source
        .shard_ids()
        .await
        .inspect_err(|e| error!("❌ Failed to fetch shard information: {:?}", e))?;

    let results = join_all(shard_ids.into_iter().map(|shard_id| async move {
        match tokio::time::timeout(timeout, source.collect(shard_id)).await {
            Ok(Ok(info)) => Some(info),
            Ok(Err(e)) => {
                warn!("⚠️ Shard {} statistics unavailable: {:?}", shard_id, e);
                None
            }
            Err(_) => {
                warn!("⚠️ Shard {} statistics timed out after {:?}", shard_id, timeout);
                None
            }
        }
    }))
    .await;

    let mut shards: Vec<ShardInfo> = results.into_iter().flatten().collect();
    sort_shard_info(&mut shards, sort);
    Ok(shards)
}

pub fn sort_shard_info(shards: &mut [ShardInfo], sort: ShardSort) {
    match sort {
        ShardSort::None => shards.sort_by_key(|shard| shard.shard_id),
        ShardSort::Memory => shards.sort_by(|a, b| b.memory_usage.total_cmp(&a.memory_usage)),
        ShardSort::Connections => shards.sort_by_key(|shard| {
            std::cmp::Reverse(shard.player_statistics.active_voice_connections)
        }),
        ShardSort::Tracks => {
            shards.sort_by_key(|shard| std::cmp::Reverse(shard.player_statistics.total_tracks))
        }
        ShardSort::Listeners => {
            shards.sort_by_key(|shard| std::cmp::Reverse(shard.player_statistics.total_listeners))
        }
        ShardSort::Guilds => shards.sort_by_key(|shard| std::cmp::Reverse(shard.guild_count)),
        ShardSort::Members => {
            shards.sort_by_key(|shard| std::cmp::Reverse(shard.guild_member_count))
        }
    }
}

pub fn shard_info_to_string(shard: &ShardInfo) -> String {
    let players = &shard.player_statistics;
    format!(
        "**Shard {}** - Guilds: {} ({})\n\
         **Process memory:** {} MB\n\
         **┣** Connections: {}\n\
         **┣** Tracks: {}\n\
         **┗** Listeners: {}\n",
        shard.shard_id,
        format_number(shard.guild_count),
        format_number(shard.guild_member_count),
        format_decimal(shard.memory_usage),
        format_number(players.active_voice_connections),
        format_number(players.total_tracks),
        format_number(players.total_listeners),
    )
}

/// Slice of shards shown on `page_index`, or `None` past the last page.
pub fn shard_page(shards: &[ShardInfo], page_index: usize) -> Option<&[ShardInfo]> {
    let total_pages = crate::ui::format::total_pages(shards.len(), SHARDS_PER_PAGE);
    if page_index >= total_pages {
        return None;
    }

    let start = page_index * SHARDS_PER_PAGE;
    let end = (start + SHARDS_PER_PAGE).min(shards.len());
    Some(&shards[start..end])
}

/// Embed fields for one page: a single full-width field for one shard,
/// otherwise two inline columns of even and odd entries.
pub fn build_embed_fields(page: &[ShardInfo]) -> Vec<(String, String, bool)> {
    match page {
        [] => Vec::new(),
        [shard] => vec![(" ".to_string(), shard_info_to_string(shard), false)],
        shards => {
            let column = |parity: usize| {
                shards
                    .iter()
                    .enumerate()
                    .filter(|(index, _)| index % 2 == parity)
                    .map(|(_, shard)| shard_info_to_string(shard))
                    .collect::<Vec<_>>()
                    .join("\n")
            };

            vec![
                (" ".to_string(), format!("{}{}", column(0), COLUMN_FILLER), true),
                (" ".to_string(), column(1), true),
            ]
        }
    }
}
