use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use serenity::model::id::{ChannelId, GuildId, MessageId};
use songbird::{
    input::{Compose, YoutubeDl},
    tracks::{PlayMode, Track as SongbirdTrack, TrackHandle, TrackQueue},
    Call, Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent,
};
use std::sync::{Arc, OnceLock, Weak};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    audio::queue::{
        GuildQueue, PlaybackTimestamp, QueueMetadata, QueueRegistry, QueueStatistics, RepeatMode,
        Requester, Track, TrackResolver, VoiceChannelInfo,
    },
    config::Config,
};

const MAX_HISTORY: usize = 100;

/// Receives track lifecycle notifications for every guild.
#[async_trait]
pub trait PlayerEvents: Send + Sync {
    async fn player_start(&self, queue: Arc<dyn GuildQueue>, track: Track);

    async fn player_finish(&self, queue: Arc<dyn GuildQueue>, track: Track);
}

/// Owns one [`GuildPlayer`] per connected guild.
pub struct AudioPlayer {
    songbird: Arc<Songbird>,
    http: reqwest::Client,
    config: Arc<Config>,
    guilds: DashMap<GuildId, Arc<GuildPlayer>>,
    events: OnceLock<Arc<dyn PlayerEvents>>,
}

impl AudioPlayer {
    pub fn new(songbird: Arc<Songbird>, config: Arc<Config>) -> Self {
        Self {
            songbird,
            http: reqwest::Client::new(),
            config,
            guilds: DashMap::new(),
            events: OnceLock::new(),
        }
    }

    /// Installs the lifecycle listener. Only the first call has an effect.
    pub fn bind_events(&self, events: Arc<dyn PlayerEvents>) {
        if self.events.set(events).is_err() {
            warn!("⚠️ Player events were already bound, ignoring");
        }
    }

    /// Drops the guild's player after the bot left its voice channel.
    pub async fn forget(&self, guild_id: GuildId) {
        if let Some((_, guild)) = self.guilds.remove(&guild_id) {
            guild.queue.stop();
            info!("🔌 Player for guild {} removed", guild_id);
        }

        if let Err(e) = self.songbird.remove(guild_id).await {
            debug!("No voice call to remove for guild {}: {:?}", guild_id, e);
        }
    }
}

#[async_trait]
impl QueueRegistry for AudioPlayer {
    fn queue(&self, guild_id: GuildId) -> Option<Arc<dyn GuildQueue>> {
        self.guilds
            .get(&guild_id)
            .map(|guild| Arc::clone(guild.value()) as Arc<dyn GuildQueue>)
    }

    async fn connect(
        &self,
        guild_id: GuildId,
        voice: VoiceChannelInfo,
        text_channel: ChannelId,
    ) -> Result<Arc<dyn GuildQueue>> {
        let call = self
            .songbird
            .join(guild_id, voice.id)
            .await
            .context("failed to join the voice channel")?;

        let guild = {
            let mut handler = call.lock().await;
            let queue = handler.queue().clone();

            let guild = Arc::new(GuildPlayer {
                guild_id,
                call: call.clone(),
                queue,
                http: self.http.clone(),
                volume: self.config.player.default_volume,
                voice_channel: voice,
                events: self.events.get().cloned(),
                state: RwLock::new(PlayerState {
                    history: Vec::new(),
                    repeat_mode: RepeatMode::Off,
                    metadata: QueueMetadata {
                        channel_id: text_channel,
                        last_message: None,
                    },
                    stepping_back: false,
                    announced: None,
                }),
            });

            handler.remove_all_global_events();
            handler.add_global_event(
                Event::Track(TrackEvent::Play),
                TrackStartNotifier {
                    guild: Arc::downgrade(&guild),
                },
            );
            handler.add_global_event(
                Event::Track(TrackEvent::End),
                TrackEndNotifier {
                    guild: Arc::downgrade(&guild),
                },
            );

            guild
        };

        self.guilds.insert(guild_id, guild.clone());
        info!(
            "🔊 Connected to voice channel {} in guild {}",
            guild.voice_channel.name, guild_id
        );

        Ok(guild)
    }

    fn statistics(&self) -> Vec<QueueStatistics> {
        self.guilds
            .iter()
            .map(|guild| QueueStatistics {
                guild_id: guild.guild_id,
                voice_channel_id: Some(guild.voice_channel.id),
                tracks_count: guild.queue.len().saturating_sub(1),
            })
            .collect()
    }
}

#[async_trait]
impl TrackResolver for AudioPlayer {
    async fn resolve(&self, query: &str, requested_by: Requester) -> Result<Track> {
        let is_url = url::Url::parse(query).is_ok();
        let mut source = if is_url {
            YoutubeDl::new(self.http.clone(), query.to_string())
        } else {
            YoutubeDl::new_search(self.http.clone(), query.to_string())
        };
        let metadata = source
            .aux_metadata()
            .await
            .with_context(|| format!("no playable result for '{query}'"))?;

        let fallback_url = is_url.then(|| query.to_string());
        Ok(Track::from_metadata(metadata, fallback_url, Some(requested_by)))
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Track>> {
        let mut source = YoutubeDl::new_search(self.http.clone(), query.to_string());
        let results = source
            .search(Some(limit))
            .await
            .with_context(|| format!("search failed for '{query}'"))?;

        Ok(results
            .map(|metadata| Track::from_metadata(metadata, None, None))
            .collect())
    }
}

struct PlayerState {
    history: Vec<Track>,
    repeat_mode: RepeatMode,
    metadata: QueueMetadata,
    stepping_back: bool,
    /// Songbird handle id of the last track announced as started.
    announced: Option<Uuid>,
}

/// Songbird call plus the bookkeeping songbird does not keep for us.
pub struct GuildPlayer {
    guild_id: GuildId,
    call: Arc<Mutex<Call>>,
    queue: TrackQueue,
    http: reqwest::Client,
    volume: f32,
    voice_channel: VoiceChannelInfo,
    events: Option<Arc<dyn PlayerEvents>>,
    state: RwLock<PlayerState>,
}

fn track_of(handle: &TrackHandle) -> Track {
    (*handle.data::<Track>()).clone()
}

impl GuildPlayer {
    async fn enqueue_at(&self, track: Track, position: Option<usize>) -> Result<()> {
        let url = track
            .url
            .clone()
            .context("track has no playable url")?;
        let input = YoutubeDl::new(self.http.clone(), url);
        let title = track.title.clone().unwrap_or_default();

        let handle = {
            let mut call = self.call.lock().await;
            call.enqueue(SongbirdTrack::new_with_data(input.into(), Arc::new(track)))
                .await
        };
        if let Err(e) = handle.set_volume(self.volume) {
            warn!("⚠️ Could not set volume for '{}': {:?}", title, e);
        }

        if let Some(position) = position {
            self.queue.modify_queue(|queue| {
                if let Some(item) = queue.pop_back() {
                    queue.insert(position.min(queue.len()), item);
                }
            });
        }

        debug!("➕ Enqueued '{}' in guild {}", title, self.guild_id);
        Ok(())
    }

    fn started(&self, handle: &TrackHandle) -> Option<Track> {
        let repeat_mode = {
            let mut state = self.state.write();
            if state.announced == Some(handle.uuid()) {
                return None;
            }
            state.announced = Some(handle.uuid());
            state.repeat_mode
        };

        if repeat_mode == RepeatMode::Track {
            if let Err(e) = handle.enable_loop() {
                debug!("Could not loop track {}: {:?}", handle.uuid(), e);
            }
        }

        Some(track_of(handle))
    }

    async fn finished(&self, track: &Track) {
        let (stepped_back, repeat_mode) = {
            let mut state = self.state.write();
            let stepped_back = std::mem::take(&mut state.stepping_back);
            if !stepped_back {
                state.history.push(track.clone());
                if state.history.len() > MAX_HISTORY {
                    state.history.remove(0);
                }
            }
            (stepped_back, state.repeat_mode)
        };

        if !stepped_back && repeat_mode == RepeatMode::Queue {
            if let Err(e) = self.enqueue_at(track.requeued(), None).await {
                warn!("⚠️ Could not requeue finished track: {:?}", e);
            }
        }
    }
}

#[async_trait]
impl GuildQueue for GuildPlayer {
    fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    fn current_track(&self) -> Option<Track> {
        self.queue.current().as_ref().map(track_of)
    }

    fn tracks(&self) -> Vec<Track> {
        self.queue
            .current_queue()
            .iter()
            .skip(1)
            .map(track_of)
            .collect()
    }

    fn history_len(&self) -> usize {
        self.state.read().history.len()
    }

    fn repeat_mode(&self) -> RepeatMode {
        self.state.read().repeat_mode
    }

    fn set_repeat_mode(&self, mode: RepeatMode) {
        self.state.write().repeat_mode = mode;

        if let Some(current) = self.queue.current() {
            let result = match mode {
                RepeatMode::Track => current.enable_loop(),
                RepeatMode::Off | RepeatMode::Queue => current.disable_loop(),
            };
            if let Err(e) = result {
                warn!("⚠️ Could not apply repeat mode {} in guild {}: {:?}", mode, self.guild_id, e);
            }
        }
    }

    fn voice_channel(&self) -> Option<VoiceChannelInfo> {
        Some(self.voice_channel.clone())
    }

    fn metadata(&self) -> QueueMetadata {
        self.state.read().metadata.clone()
    }

    fn set_last_message(&self, message_id: Option<MessageId>) {
        self.state.write().metadata.last_message = message_id;
    }

    async fn is_paused(&self) -> bool {
        let Some(current) = self.queue.current() else {
            return false;
        };

        match current.get_info().await {
            Ok(state) => matches!(state.playing, PlayMode::Pause),
            Err(e) => {
                debug!("Track state unavailable: {:?}", e);
                false
            }
        }
    }

    async fn timestamp(&self) -> Option<PlaybackTimestamp> {
        let current = self.queue.current()?;
        let state = current.get_info().await.ok()?;

        Some(PlaybackTimestamp {
            current: state.position,
            total: track_of(&current).duration,
        })
    }

    fn pause(&self) -> Result<()> {
        self.queue.pause().context("failed to pause the current track")
    }

    fn resume(&self) -> Result<()> {
        self.queue.resume().context("failed to resume the current track")
    }

    fn skip(&self) -> Result<()> {
        self.queue.skip().context("failed to skip the current track")
    }

    async fn back(&self) -> Result<Track> {
        let previous = self
            .state
            .write()
            .history
            .pop()
            .context("track history is empty")?
            .requeued();
        let current = self.current_track();

        if let Err(e) = self.enqueue_at(previous.clone(), Some(1)).await {
            self.state.write().history.push(previous);
            return Err(e);
        }
        if let Some(current) = current {
            self.enqueue_at(current.requeued(), Some(2)).await?;
        }

        self.state.write().stepping_back = true;
        if let Err(e) = self.queue.skip() {
            self.state.write().stepping_back = false;
            return Err(e).context("failed to skip to the previous track");
        }

        Ok(previous)
    }

    async fn enqueue(&self, track: Track) -> Result<()> {
        self.enqueue_at(track, None).await
    }
}

struct TrackStartNotifier {
    guild: Weak<GuildPlayer>,
}

#[async_trait]
impl VoiceEventHandler for TrackStartNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let EventContext::Track(tracks) = ctx else {
            return None;
        };
        let guild = self.guild.upgrade()?;

        for (_, handle) in tracks.iter() {
            let Some(track) = guild.started(handle) else {
                continue;
            };
            info!(
                "▶️ Playing '{}' in guild {}",
                track.title.as_deref().unwrap_or("unknown"),
                guild.guild_id
            );

            if let Some(events) = &guild.events {
                events.player_start(guild.clone(), track).await;
            }
        }

        None
    }
}

struct TrackEndNotifier {
    guild: Weak<GuildPlayer>,
}

#[async_trait]
impl VoiceEventHandler for TrackEndNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let EventContext::Track(tracks) = ctx else {
            return None;
        };
        let guild = self.guild.upgrade()?;

        for (state, handle) in tracks.iter() {
            let track = track_of(handle);
            if let PlayMode::Errored(e) = &state.playing {
                error!(
                    "❌ Track '{}' failed in guild {}: {:?}",
                    track.title.as_deref().unwrap_or("unknown"),
                    guild.guild_id,
                    e
                );
            }

            guild.finished(&track).await;

            if let Some(events) = &guild.events {
                events.player_finish(guild.clone(), track).await;
            }
        }

        None
    }
}
