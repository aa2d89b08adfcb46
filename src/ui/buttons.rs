use serenity::{
    all::{ButtonStyle, ReactionType},
    builder::{CreateActionRow, CreateButton},
};
use uuid::Uuid;

use crate::config::EmbedIcons;

/// Custom ids of every button the bot renders.
pub mod button_ids {
    pub const PREVIOUS: &str = "action-previous-button";
    pub const PAUSE_RESUME: &str = "action-pauseresume-button";
    pub const SKIP: &str = "action-skip-button";
    pub const SHOW_QUEUE: &str = "action-showqueue-button";
    pub const PREVIOUS_PAGE: &str = "previous-page";
    pub const NEXT_PAGE: &str = "next-page";

    /// Page buttons are answered by the collector that rendered them.
    pub fn is_pagination(custom_id: &str) -> bool {
        custom_id == PREVIOUS_PAGE || custom_id == NEXT_PAGE
    }
}

/// Splits `name_reference` at the first underscore.
pub fn parse_custom_id(custom_id: &str) -> (&str, Option<&str>) {
    match custom_id.split_once('_') {
        Some((name, reference)) if !reference.is_empty() => (name, Some(reference)),
        Some((name, _)) => (name, None),
        None => (custom_id, None),
    }
}

pub fn with_reference(name: &str, track_id: Uuid) -> String {
    format!("{name}_{track_id}")
}

fn icon_button(custom_id: impl Into<String>, icon: &str) -> CreateButton {
    let emoji = icon
        .parse::<ReactionType>()
        .unwrap_or_else(|_| ReactionType::Unicode(icon.to_string()));

    CreateButton::new(custom_id)
        .emoji(emoji)
        .style(ButtonStyle::Secondary)
}

/// Controls attached to a now-playing message.
pub fn track_action_row(track_id: Uuid, history_empty: bool, icons: &EmbedIcons) -> CreateActionRow {
    CreateActionRow::Buttons(vec![
        icon_button(
            with_reference(button_ids::PREVIOUS, track_id),
            &icons.previous_track,
        )
        .disabled(history_empty),
        icon_button(
            with_reference(button_ids::PAUSE_RESUME, track_id),
            &icons.pause_resume_track,
        ),
        icon_button(with_reference(button_ids::SKIP, track_id), &icons.next_track),
        icon_button(button_ids::SHOW_QUEUE, &icons.queue),
    ])
}

pub fn pagination_row(is_first: bool, is_last: bool, icons: &EmbedIcons) -> CreateActionRow {
    CreateActionRow::Buttons(vec![
        icon_button(button_ids::PREVIOUS_PAGE, &icons.previous_page).disabled(is_first),
        icon_button(button_ids::NEXT_PAGE, &icons.next_page).disabled(is_last),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbedOptions;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    #[test]
    fn splits_reference_at_first_underscore() {
        assert_eq!(
            parse_custom_id("action-skip-button_abc_def"),
            ("action-skip-button", Some("abc_def"))
        );
        assert_eq!(
            parse_custom_id("action-showqueue-button"),
            ("action-showqueue-button", None)
        );
        assert_eq!(parse_custom_id("action-skip-button_"), ("action-skip-button", None));
    }

    #[test]
    fn track_row_embeds_reference_and_disables_previous() {
        let track_id = Uuid::new_v4();
        let row = track_action_row(track_id, true, &EmbedOptions::default().icons);
        let json = serde_json::to_value(&row).unwrap();
        let buttons = json["components"].as_array().unwrap();

        assert_eq!(buttons.len(), 4);
        assert_eq!(
            buttons[0]["custom_id"],
            Value::String(format!("action-previous-button_{track_id}"))
        );
        assert_eq!(buttons[0]["disabled"], Value::Bool(true));
        assert_eq!(
            buttons[2]["custom_id"],
            Value::String(format!("action-skip-button_{track_id}"))
        );
        assert_eq!(
            buttons[3]["custom_id"],
            Value::String("action-showqueue-button".into())
        );
    }

    #[test]
    fn pagination_row_disables_edges() {
        let row = pagination_row(true, false, &EmbedOptions::default().icons);
        let json = serde_json::to_value(&row).unwrap();

        assert_eq!(json["components"][0]["disabled"], Value::Bool(true));
        assert_eq!(json["components"][1]["disabled"], Value::Bool(false));
    }
}
