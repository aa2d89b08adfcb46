//! Suggestions while typing the `/play` query.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    audio::{Track, TrackResolver},
    interactions::{AutocompleteChoice, AutocompleteHandler, AutocompleteParams},
};

const MIN_QUERY_LENGTH: usize = 3;
const MAX_SUGGESTIONS: usize = 5;
/// Discord rejects choice names and values longer than this.
const MAX_CHOICE_LENGTH: usize = 100;

pub struct PlayAutocomplete {
    resolver: Arc<dyn TrackResolver>,
}

impl PlayAutocomplete {
    pub fn new(resolver: Arc<dyn TrackResolver>) -> Self {
        Self { resolver }
    }
}

fn to_choice(track: Track) -> Option<AutocompleteChoice> {
    let value = track.url?;
    if value.chars().count() > MAX_CHOICE_LENGTH {
        return None;
    }

    let title = track.title.unwrap_or_else(|| value.clone());
    let name = if title.chars().count() > MAX_CHOICE_LENGTH {
        let mut name: String = title.chars().take(MAX_CHOICE_LENGTH - 3).collect();
        name.push_str("...");
        name
    } else {
        title
    };

    Some(AutocompleteChoice { name, value })
}

#[async_trait]
impl AutocompleteHandler for PlayAutocomplete {
    fn name(&self) -> &'static str {
        "play"
    }

    async fn execute(&self, params: AutocompleteParams<'_>) -> Result<()> {
        let query = params.focused.trim();
        if query.chars().count() < MIN_QUERY_LENGTH {
            return params.responder.autocomplete(Vec::new()).await;
        }

        let choices = match self.resolver.search(query, MAX_SUGGESTIONS).await {
            Ok(tracks) => tracks.into_iter().filter_map(to_choice).collect(),
            Err(e) => {
                warn!("⚠️ Autocomplete search for '{}' failed: {:?}", query, e);
                Vec::new()
            }
        };

        debug!("Suggesting {} tracks for '{}'.", choices.len(), query);
        params.responder.autocomplete(choices).await
    }
}
