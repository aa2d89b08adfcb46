use serenity::{
    all::Colour,
    builder::{CreateEmbed, CreateEmbedAuthor, CreateMessage},
};

use crate::{
    audio::Track,
    config::EmbedOptions,
    locale::Translator,
    ui::{buttons, format},
};

pub fn warning_embed(options: &EmbedOptions, description: impl Into<String>) -> CreateEmbed {
    CreateEmbed::new()
        .description(description)
        .color(Colour::new(options.colors.warning))
}

pub fn error_embed(options: &EmbedOptions, description: impl Into<String>) -> CreateEmbed {
    CreateEmbed::new()
        .description(description)
        .color(Colour::new(options.colors.error))
}

pub fn success_embed(options: &EmbedOptions, description: impl Into<String>) -> CreateEmbed {
    CreateEmbed::new()
        .description(description)
        .color(Colour::new(options.colors.success))
}

pub fn info_embed(options: &EmbedOptions, description: impl Into<String>) -> CreateEmbed {
    CreateEmbed::new()
        .description(description)
        .color(Colour::new(options.colors.info))
}

/// The message announced when a track starts playing.
pub fn now_playing_message(
    track: &Track,
    history_len: usize,
    options: &EmbedOptions,
    translator: &Translator,
) -> CreateMessage {
    let description = format!(
        "{}\n{}",
        translator.translate(
            "musicPlayerCommon.startedPlayingTitle",
            &[("icon", &options.icons.audio_started_playing)],
        ),
        format::display_track_duration_and_url(track, &options.icons, translator)
    );

    let mut embed = CreateEmbed::new()
        .description(description)
        .thumbnail(format::track_thumbnail_url(track, &options.info))
        .color(Colour::new(options.colors.brand));

    if let Some(requester) = &track.requested_by {
        embed = embed.author(
            CreateEmbedAuthor::new(requester.name.clone()).icon_url(
                requester
                    .avatar_url
                    .clone()
                    .unwrap_or_else(|| options.info.fallback_icon_url.clone()),
            ),
        );
    }

    CreateMessage::new()
        .embed(embed)
        .components(vec![buttons::track_action_row(
            track.id,
            history_len == 0,
            &options.icons,
        )])
}
