//! Text fragments shared by embeds.

use num_format::{Locale, ToFormattedString};
use std::time::Duration;

use crate::{
    audio::{PlaybackTimestamp, RepeatMode, Track, TrackSourceKind},
    config::{EmbedIcons, EmbedInfo, ProgressBarOptions},
    locale::{format_slash_command, Translator},
};

pub const TRACKS_PER_PAGE: usize = 10;

/// `m:ss`, or `h:mm:ss` past the hour.
pub fn format_track_time(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Human readable length such as `1h 2m 3s`, truncated to whole seconds.
pub fn format_duration(duration: Duration) -> String {
    humantime::format_duration(Duration::from_secs(duration.as_secs())).to_string()
}

pub fn format_number(value: u64) -> String {
    value.to_formatted_string(&Locale::en)
}

/// en-US grouping with up to two decimals, trailing zeros dropped.
pub fn format_decimal(value: f64) -> String {
    let hundredths = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && hundredths > 0 { "-" } else { "" };
    let whole = format_number(hundredths / 100);
    let fraction = format!("{:02}", hundredths % 100);

    match fraction.trim_end_matches('0') {
        "" => format!("{sign}{whole}"),
        fraction => format!("{sign}{whole}.{fraction}"),
    }
}

pub fn total_pages(len: usize, per_page: usize) -> usize {
    len.div_ceil(per_page).max(1)
}

/// Bold duration label, the live badge for streams, or nothing when the
/// length is unknown or zero.
pub fn formatted_duration(track: &Track, icons: &EmbedIcons) -> String {
    if track.is_live {
        return format!("**{} `LIVE`**", icons.live_track);
    }

    match track.duration {
        Some(duration) if duration.as_secs() > 0 => {
            format!("**`{}`**", format_track_time(duration))
        }
        _ => String::new(),
    }
}

pub fn formatted_track_url(track: &Track, translator: &Translator) -> String {
    let Some(url) = track.url.as_deref() else {
        return translator.translate("musicPlayerCommon.unavailableTrackUrl", &[]);
    };

    let title = track.title.clone().unwrap_or_else(|| {
        translator.translate("musicPlayerCommon.unavailableTrackTitle", &[])
    });
    format!("**[{title}]({url})**")
}

pub fn display_track_duration_and_url(
    track: &Track,
    icons: &EmbedIcons,
    translator: &Translator,
) -> String {
    format!(
        "{} {}",
        formatted_duration(track, icons),
        formatted_track_url(track, translator)
    )
}

/// YouTube's `maxresdefault` thumbnails are frequently missing, so those
/// fall back to the configured image.
pub fn track_thumbnail_url(track: &Track, info: &EmbedInfo) -> String {
    match track.thumbnail.as_deref() {
        Some(thumbnail)
            if track.source == TrackSourceKind::Youtube
                && thumbnail.ends_with("maxresdefault.jpg") =>
        {
            info.fallback_thumbnail_url.clone()
        }
        Some(thumbnail) if !thumbnail.is_empty() => thumbnail.to_string(),
        _ => info.fallback_thumbnail_url.clone(),
    }
}

pub fn footer_page_info(page_index: usize, track_count: usize, translator: &Translator) -> String {
    translator.translate(
        "musicPlayerCommon.footerPageNumber",
        &[
            ("page", &(page_index + 1).to_string()),
            ("pageCount", &total_pages(track_count, TRACKS_PER_PAGE).to_string()),
            ("count", &track_count.to_string()),
        ],
    )
}

pub fn display_requested_by(track: &Track, translator: &Translator) -> String {
    match &track.requested_by {
        Some(requester) => format!("<@{}>", requester.id),
        None => translator.translate("musicPlayerCommon.unavailableRequestedBy", &[]),
    }
}

pub fn progress_bar(position: Duration, total: Duration, options: &ProgressBarOptions) -> String {
    let ratio = if total.is_zero() {
        0.0
    } else {
        (position.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
    };
    let filled = ((ratio * options.length as f64).round() as usize).min(options.length);

    let bar = format!(
        "{}{}{}",
        options.left_char.repeat(filled),
        options.indicator,
        options.right_char.repeat(options.length - filled)
    );

    if options.timecodes {
        format!(
            "{} ┃ {} ┃ {}",
            format_track_time(position),
            bar,
            format_track_time(total)
        )
    } else {
        bar
    }
}

pub fn queue_progress_bar(
    track: &Track,
    timestamp: Option<PlaybackTimestamp>,
    options: &ProgressBarOptions,
    icons: &EmbedIcons,
    translator: &Translator,
) -> String {
    if track.is_live {
        return translator.translate(
            "musicPlayerCommon.playingLive",
            &[("icon", &icons.live_track)],
        );
    }

    let total = track.duration.filter(|duration| !duration.is_zero());
    match (total, timestamp) {
        (Some(total), Some(timestamp)) => format!(
            "**`{}`** {} **`{}`**",
            format_track_time(timestamp.current),
            progress_bar(timestamp.current, total, options),
            format_track_time(total)
        ),
        _ => translator.translate("musicPlayerCommon.unavailableDuration", &[]),
    }
}

/// Explanation of the active repeat mode; empty when repeat is off.
pub fn format_repeat_mode_detailed(
    mode: RepeatMode,
    icons: &EmbedIcons,
    translator: &Translator,
) -> String {
    let key = match mode {
        RepeatMode::Off => return String::new(),
        RepeatMode::Track => "musicPlayerCommon.repeatMode.track",
        RepeatMode::Queue => "musicPlayerCommon.repeatMode.queue",
    };

    translator.translate(
        key,
        &[
            ("icon", &icons.looping),
            ("loopCommand", &format_slash_command("loop")),
        ],
    )
}
