use anyhow::Result;
use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};
use songbird::input::AuxMetadata;
use std::{fmt, str::FromStr, sync::Arc, time::Duration};
use uuid::Uuid;

/// Who asked for a track.
#[derive(Debug, Clone, PartialEq)]
pub struct Requester {
    pub id: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// A queued track as the interaction layer sees it.
///
/// `id` is generated when the track is resolved and travels in the custom id
/// of the now-playing buttons, so it must stay stable while queued.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: Uuid,
    pub title: Option<String>,
    pub url: Option<String>,
    pub duration: Option<Duration>,
    pub is_live: bool,
    pub thumbnail: Option<String>,
    pub source: TrackSourceKind,
    pub requested_by: Option<Requester>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSourceKind {
    Youtube,
    Soundcloud,
    Arbitrary,
}

impl TrackSourceKind {
    pub fn detect(url: Option<&str>) -> Self {
        let host = url
            .and_then(|url| url::Url::parse(url).ok())
            .and_then(|url| url.host_str().map(str::to_ascii_lowercase));

        match host.as_deref() {
            Some(host) if host.ends_with("youtube.com") || host == "youtu.be" => Self::Youtube,
            Some(host) if host.ends_with("soundcloud.com") => Self::Soundcloud,
            _ => Self::Arbitrary,
        }
    }
}

impl Track {
    /// Builds a track from yt-dlp metadata. Streams without a known duration
    /// are treated as live.
    pub fn from_metadata(
        metadata: AuxMetadata,
        fallback_url: Option<String>,
        requested_by: Option<Requester>,
    ) -> Self {
        let url = metadata.source_url.or(fallback_url);
        Self {
            id: Uuid::new_v4(),
            source: TrackSourceKind::detect(url.as_deref()),
            title: metadata.title,
            is_live: metadata.duration.is_none(),
            duration: metadata.duration,
            thumbnail: metadata.thumbnail,
            url,
            requested_by,
        }
    }

    /// Same track under a fresh id, for re-enqueueing it.
    pub fn requeued(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatMode {
    #[default]
    Off,
    Track,
    Queue,
}

impl FromStr for RepeatMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "track" => Ok(Self::Track),
            "queue" => Ok(Self::Queue),
            other => anyhow::bail!("unknown repeat mode: {other}"),
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "off",
            Self::Track => "track",
            Self::Queue => "queue",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoiceChannelInfo {
    pub id: ChannelId,
    pub name: String,
    /// Bits per second, as reported by Discord.
    pub bitrate: Option<u32>,
}

/// Where now-playing messages go and which one was sent last.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueMetadata {
    pub channel_id: ChannelId,
    pub last_message: Option<MessageId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackTimestamp {
    pub current: Duration,
    pub total: Option<Duration>,
}

/// Per-guild counters used by the shard statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueStatistics {
    pub guild_id: GuildId,
    pub voice_channel_id: Option<ChannelId>,
    pub tracks_count: usize,
}

/// A guild's playback queue.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GuildQueue: Send + Sync {
    fn guild_id(&self) -> GuildId;

    fn current_track(&self) -> Option<Track>;

    /// Pending tracks, current track excluded.
    fn tracks(&self) -> Vec<Track>;

    fn history_len(&self) -> usize;

    fn repeat_mode(&self) -> RepeatMode;

    fn set_repeat_mode(&self, mode: RepeatMode);

    fn voice_channel(&self) -> Option<VoiceChannelInfo>;

    fn metadata(&self) -> QueueMetadata;

    fn set_last_message(&self, message_id: Option<MessageId>);

    async fn is_paused(&self) -> bool;

    async fn timestamp(&self) -> Option<PlaybackTimestamp>;

    fn pause(&self) -> Result<()>;

    fn resume(&self) -> Result<()>;

    fn skip(&self) -> Result<()>;

    /// Replays the most recent history entry, keeping the current track
    /// right behind it. Returns the replayed track.
    async fn back(&self) -> Result<Track>;

    async fn enqueue(&self, track: Track) -> Result<()>;
}

/// Lookup and creation of guild queues.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueRegistry: Send + Sync {
    fn queue(&self, guild_id: GuildId) -> Option<Arc<dyn GuildQueue>>;

    /// Joins `voice` and creates the queue that announces into `text_channel`.
    async fn connect(
        &self,
        guild_id: GuildId,
        voice: VoiceChannelInfo,
        text_channel: ChannelId,
    ) -> Result<Arc<dyn GuildQueue>>;

    fn statistics(&self) -> Vec<QueueStatistics>;
}

/// Turns user queries into playable tracks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackResolver: Send + Sync {
    async fn resolve(&self, query: &str, requested_by: Requester) -> Result<Track>;

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Track>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_repeat_modes() {
        assert_eq!("off".parse::<RepeatMode>().unwrap(), RepeatMode::Off);
        assert_eq!("Track".parse::<RepeatMode>().unwrap(), RepeatMode::Track);
        assert_eq!("QUEUE".parse::<RepeatMode>().unwrap(), RepeatMode::Queue);
        assert!("shuffle".parse::<RepeatMode>().is_err());
    }

    #[test]
    fn detects_sources_from_url() {
        assert_eq!(
            TrackSourceKind::detect(Some("https://www.youtube.com/watch?v=abc")),
            TrackSourceKind::Youtube
        );
        assert_eq!(
            TrackSourceKind::detect(Some("https://youtu.be/abc")),
            TrackSourceKind::Youtube
        );
        assert_eq!(
            TrackSourceKind::detect(Some("https://soundcloud.com/artist/song")),
            TrackSourceKind::Soundcloud
        );
        assert_eq!(TrackSourceKind::detect(None), TrackSourceKind::Arbitrary);
    }

    #[test]
    fn metadata_without_duration_is_live() {
        let metadata = AuxMetadata {
            title: Some("Radio".into()),
            source_url: Some("https://www.youtube.com/watch?v=live".into()),
            ..Default::default()
        };
        let track = Track::from_metadata(metadata, None, None);

        assert!(track.is_live);
        assert_eq!(track.source, TrackSourceKind::Youtube);
        assert_eq!(track.title.as_deref(), Some("Radio"));
    }

    #[test]
    fn requeued_track_gets_new_id() {
        let track = Track::from_metadata(
            AuxMetadata {
                duration: Some(Duration::from_secs(90)),
                ..Default::default()
            },
            Some("https://example.com/a.mp3".into()),
            None,
        );
        let copy = track.requeued();

        assert_ne!(copy.id, track.id);
        assert_eq!(copy.url, track.url);
        assert!(!copy.is_live);
    }
}
