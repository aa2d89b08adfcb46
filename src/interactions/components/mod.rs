//! Buttons attached to now-playing messages, plus the queue viewer they open.
//!
//! Track buttons carry the id of the track they were rendered for; a press
//! on a message whose track is no longer current is answered with a notice
//! instead of touching the queue.

mod pause_resume;
mod previous;
mod show_queue;
mod skip;

pub use pause_resume::PauseResumeButton;
pub use previous::PreviousButton;
pub use show_queue::ShowQueueButton;
pub use skip::SkipButton;

use uuid::Uuid;

use crate::{
    audio::{GuildQueue, Track},
    config::EmbedOptions,
    interactions::{base::InteractionBase, InteractionContext, Reply},
    locale::Translator,
    ui::{embeds, format},
    validation::{
        check_in_voice_channel, check_queue_current_track, check_queue_exists,
        check_same_voice_channel, Validator,
    },
};

const TRACK_CONTROL_VALIDATORS: [Validator; 4] = [
    check_in_voice_channel,
    check_same_voice_channel,
    check_queue_exists,
    check_queue_current_track,
];

/// The current track, as long as it is still the one the button was
/// rendered for. A press without a reference never matches.
fn referenced_track(queue: &dyn GuildQueue, reference_id: Option<&str>) -> Option<Track> {
    let current = queue.current_track()?;
    let reference = reference_id?;
    if Uuid::parse_str(reference).ok() != Some(current.id) {
        tracing::debug!(
            "Button for track {} pressed while {} is playing.",
            reference,
            current.id
        );
        return None;
    }
    Some(current)
}

fn warning_reply(options: &EmbedOptions, translator: &Translator, key: &str) -> Reply {
    Reply::embed(embeds::warning_embed(
        options,
        translator.translate(key, &[("icon", &options.icons.warning)]),
    ))
    .ephemeral()
}

/// Success message for a track action, followed by the repeat mode when on.
fn track_action_reply(
    base: &InteractionBase,
    interaction: &InteractionContext,
    translator: &Translator,
    key: &str,
    icon: &str,
    track: &Track,
    queue: &dyn GuildQueue,
) -> Reply {
    let options = &base.config().embed;
    let mut description = translator.translate(
        key,
        &[
            ("icon", icon),
            (
                "track",
                &format::display_track_duration_and_url(track, &options.icons, translator),
            ),
        ],
    );

    let repeat = format::format_repeat_mode_detailed(queue.repeat_mode(), &options.icons, translator);
    if !repeat.is_empty() {
        description.push_str("\n\n");
        description.push_str(&repeat);
    }

    Reply::embed(
        embeds::success_embed(options, description)
            .author(base.embed_user_author(interaction))
            .thumbnail(format::track_thumbnail_url(track, &options.info)),
    )
    .ephemeral()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        audio::{queue::MockGuildQueue, RepeatMode},
        interactions::test_support::{embed_json, sample_interaction, sample_track, test_config},
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn reference_must_match_current_track() {
        let current = sample_track("Current");
        let current_id = current.id.to_string();
        let mut queue = MockGuildQueue::new();
        queue
            .expect_current_track()
            .returning(move || Some(current.clone()));

        assert!(referenced_track(&queue, Some(&current_id)).is_some());
        assert!(referenced_track(&queue, None).is_none());
        assert!(referenced_track(&queue, Some(&Uuid::new_v4().to_string())).is_none());
        assert!(referenced_track(&queue, Some("not-a-uuid")).is_none());
    }

    #[test]
    fn nothing_playing_is_never_referenced() {
        let mut queue = MockGuildQueue::new();
        queue.expect_current_track().returning(|| None);

        assert!(referenced_track(&queue, None).is_none());
        assert!(referenced_track(&queue, Some(&Uuid::new_v4().to_string())).is_none());
    }

    #[test]
    fn action_reply_credits_the_presser() {
        let track = sample_track("Song");
        let mut queue = MockGuildQueue::new();
        queue.expect_repeat_mode().returning(|| RepeatMode::Off);
        let base = InteractionBase::new(test_config());

        let reply = track_action_reply(
            &base,
            &sample_interaction(),
            &Translator::default(),
            "commands.skip.skippedTrack",
            "⏭️",
            &track,
            &queue,
        );

        let json = embed_json(&reply);
        assert_eq!(json["author"]["name"], "Tester");
        assert_eq!(
            json["author"]["icon_url"],
            "https://cdn.discordapp.com/avatars/1/a.png"
        );
        assert!(reply.ephemeral);
    }
}
