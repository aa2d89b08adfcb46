//! # Audio Module
//!
//! Queue abstraction consumed by the interaction layer and its songbird
//! implementation.
//!
//! ## Architecture
//!
//! ### [`queue`] - Queue model
//! - [`Track`], [`RepeatMode`] and the per-guild metadata
//! - [`GuildQueue`], [`QueueRegistry`] and [`TrackResolver`], the seams every
//!   handler talks to (mocked in tests)
//!
//! ### [`player`] - Songbird player
//! - [`player::AudioPlayer`] keeps one [`player::GuildPlayer`] per voice
//!   connection in a `DashMap`
//! - songbird's builtin `TrackQueue` does the actual sequencing; the player
//!   adds history, repeat modes and the now-playing bookkeeping
//! - global track events are forwarded to [`player::PlayerEvents`]
//!
//! Audio decoding and voice transport stay inside songbird.

pub mod player;
pub mod queue;

pub use queue::{
    GuildQueue, PlaybackTimestamp, QueueMetadata, QueueRegistry, QueueStatistics, RepeatMode,
    Requester, Track, TrackResolver, TrackSourceKind, VoiceChannelInfo,
};
