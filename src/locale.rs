//! Message catalogs.
//!
//! Catalogs are JSON documents embedded at compile time and addressed with
//! dotted keys (`validation.notInVoiceChannel`). Values may contain
//! `{{name}}` placeholders that are filled from the arguments passed to
//! [`Translator::translate`].

use serde_json::Value;
use std::{collections::HashMap, sync::LazyLock};
use tracing::warn;

pub const DEFAULT_LOCALE: &str = "en-US";

static CATALOGS: LazyLock<HashMap<&'static str, Value>> = LazyLock::new(|| {
    let mut catalogs = HashMap::new();
    for (locale, raw) in [(DEFAULT_LOCALE, include_str!("../locales/en-US.json"))] {
        match serde_json::from_str(raw) {
            Ok(catalog) => {
                catalogs.insert(locale, catalog);
            }
            Err(e) => warn!("⚠️ Catalog for {} could not be parsed: {}", locale, e),
        }
    }
    catalogs
});

/// Looks up messages for one locale, falling back to [`DEFAULT_LOCALE`].
#[derive(Debug, Clone, Copy)]
pub struct Translator {
    catalog: Option<&'static Value>,
    fallback: Option<&'static Value>,
}

impl Translator {
    pub fn for_locale(locale: &str) -> Self {
        let language = locale.split('-').next().unwrap_or(locale);
        let catalog = CATALOGS.get(locale).or_else(|| {
            CATALOGS
                .iter()
                .find(|(name, _)| name.split('-').next() == Some(language))
                .map(|(_, catalog)| catalog)
        });

        Self {
            catalog,
            fallback: CATALOGS.get(DEFAULT_LOCALE),
        }
    }

    /// Renders `key`, replacing each `{{name}}` with its value from `args`.
    /// Unknown keys render as the key itself.
    pub fn translate(&self, key: &str, args: &[(&str, &str)]) -> String {
        let template = [self.catalog, self.fallback]
            .into_iter()
            .flatten()
            .find_map(|catalog| lookup(catalog, key))
            .unwrap_or(key);

        interpolate(template, args)
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::for_locale(DEFAULT_LOCALE)
    }
}

fn lookup<'a>(catalog: &'a Value, key: &str) -> Option<&'a str> {
    key.split('.')
        .try_fold(catalog, |node, segment| node.get(segment))?
        .as_str()
}

fn interpolate(template: &str, args: &[(&str, &str)]) -> String {
    args.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{{{name}}}}}"), value)
    })
}

/// Inline mention-style rendering of a slash command name.
pub fn format_slash_command(name: &str) -> String {
    format!("**`/{name}`**")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn translates_nested_keys_with_arguments() {
        let t = Translator::default();
        assert_eq!(
            t.translate(
                "musicPlayerCommon.footerPageNumber",
                &[("page", "2"), ("pageCount", "3"), ("count", "25")]
            ),
            "Page 2 of 3 (25 tracks)"
        );
    }

    #[test]
    fn missing_key_renders_the_key() {
        let t = Translator::default();
        assert_eq!(t.translate("does.not.exist", &[]), "does.not.exist");
    }

    #[test]
    fn unknown_locale_falls_back_to_default() {
        let t = Translator::for_locale("nb");
        assert_eq!(
            t.translate("musicPlayerCommon.unavailableTrackTitle", &[]),
            "Title unavailable"
        );
    }

    #[test]
    fn regional_variant_uses_language_catalog() {
        let t = Translator::for_locale("en-GB");
        assert_eq!(
            t.translate("musicPlayerCommon.requestedBy", &[("user", "<@1>")]),
            "Requested by: <@1>"
        );
    }

    #[test]
    fn formats_slash_command() {
        assert_eq!(format_slash_command("play"), "**`/play`**");
    }
}
