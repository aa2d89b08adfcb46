use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serenity::{cache::Cache, gateway::ShardManager};
use std::sync::{Arc, OnceLock};
use sysinfo::{ProcessesToUpdate, System};

use super::{shard_id_for, PlayerStatistics, ShardInfo, ShardStatsSource};
use crate::audio::QueueRegistry;

struct Gateway {
    cache: Arc<Cache>,
    shard_manager: Arc<ShardManager>,
}

/// Shard snapshots of this process, read from the gateway cache.
///
/// All shards run in one process, so they report the same process memory.
pub struct ClusterStats {
    queues: Arc<dyn QueueRegistry>,
    gateway: OnceLock<Gateway>,
    system: Mutex<System>,
}

impl ClusterStats {
    pub fn new(queues: Arc<dyn QueueRegistry>) -> Self {
        Self {
            queues,
            gateway: OnceLock::new(),
            system: Mutex::new(System::new()),
        }
    }

    /// Hands over the client's cache and shard manager once the client exists.
    pub fn bind(&self, cache: Arc<Cache>, shard_manager: Arc<ShardManager>) {
        if self
            .gateway
            .set(Gateway {
                cache,
                shard_manager,
            })
            .is_err()
        {
            tracing::warn!("⚠️ Shard statistics were already bound, ignoring");
        }
    }

    fn gateway(&self) -> Result<&Gateway> {
        self.gateway
            .get()
            .context("shard statistics are not bound to a client yet")
    }

    fn process_memory_mb(&self) -> Result<f64> {
        let pid = sysinfo::get_current_pid().map_err(anyhow::Error::msg)?;
        let mut system = self.system.lock();
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        let bytes = system
            .process(pid)
            .map(|process| process.memory())
            .context("current process not found")?;

        Ok((bytes as f64 / 1024.0 / 1024.0 * 100.0).round() / 100.0)
    }
}

#[async_trait]
impl ShardStatsSource for ClusterStats {
    async fn shard_ids(&self) -> Result<Vec<u32>> {
        let runners = self.gateway()?.shard_manager.runners.lock().await;
        Ok(runners.keys().map(|shard_id| shard_id.0).collect())
    }

    async fn collect(&self, shard_id: u32) -> Result<ShardInfo> {
        let gateway = self.gateway()?;
        let cache = &gateway.cache;
        let shard_count = cache.shard_count();
        let bot_id = cache.current_user().id;

        let mut guild_count = 0;
        let mut guild_member_count = 0;
        for guild_id in cache.guilds() {
            if shard_id_for(guild_id, shard_count) != shard_id {
                continue;
            }
            guild_count += 1;
            if let Some(guild) = cache.guild(guild_id) {
                guild_member_count += guild.member_count;
            }
        }

        let mut player_statistics = PlayerStatistics::default();
        for queue in self.queues.statistics() {
            if shard_id_for(queue.guild_id, shard_count) != shard_id {
                continue;
            }
            player_statistics.active_voice_connections += 1;
            player_statistics.total_tracks += queue.tracks_count as u64;

            let (Some(channel_id), Some(guild)) = (queue.voice_channel_id, cache.guild(queue.guild_id))
            else {
                continue;
            };
            player_statistics.total_listeners += guild
                .voice_states
                .values()
                .filter(|state| state.channel_id == Some(channel_id) && state.user_id != bot_id)
                .count() as u64;
        }

        Ok(ShardInfo {
            shard_id,
            memory_usage: self.process_memory_mb()?,
            guild_count,
            guild_member_count,
            player_statistics,
        })
    }
}
