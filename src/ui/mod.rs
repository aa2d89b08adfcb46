//! Embed, button and text builders shared by handlers and events.

pub mod buttons;
pub mod embeds;
pub mod format;
