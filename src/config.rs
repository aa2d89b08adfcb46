use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Runtime configuration.
///
/// Values are layered in this order, later sources overriding earlier ones:
///
/// 1. built-in defaults ([`Config::default`])
/// 2. `config/default.toml` (optional)
/// 3. `config/local.toml` (optional, not committed)
/// 4. environment variables prefixed with `CADENCE__`, for example
///    `CADENCE__BOT__DEV_GUILD_ID=1234` or
///    `CADENCE__BOT__SYSTEM_GUILD_IDS=1,2,3`
///
/// The Discord token and application id are always read from the
/// environment (`DISCORD_TOKEN`, `APPLICATION_ID`), a `.env` file included.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Config {
    #[serde(skip)]
    pub discord_token: String,
    #[serde(skip)]
    pub application_id: Option<u64>,

    pub bot: BotOptions,
    pub embed: EmbedOptions,
    pub player: PlayerOptions,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BotOptions {
    /// Register commands to this guild only (fast propagation while developing).
    pub dev_guild_id: Option<u64>,
    /// Guilds allowed to run system commands such as `/shards`.
    pub system_guild_ids: Vec<u64>,
    pub shard_stats_timeout_secs: u64,
}

impl Default for BotOptions {
    fn default() -> Self {
        Self {
            dev_guild_id: None,
            system_guild_ids: Vec::new(),
            shard_stats_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EmbedOptions {
    pub colors: EmbedColors,
    pub icons: EmbedIcons,
    pub info: EmbedInfo,
    pub behavior: EmbedBehavior,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmbedColors {
    pub success: u32,
    pub warning: u32,
    pub error: u32,
    pub info: u32,
    pub brand: u32,
}

impl Default for EmbedColors {
    fn default() -> Self {
        Self {
            success: 0x43B581,
            warning: 0xFFC107,
            error: 0xDC3545,
            info: 0x3490DC,
            brand: 0x8A2BE2,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmbedIcons {
    pub warning: String,
    pub error: String,
    pub success: String,
    pub skipped: String,
    pub pause_resumed: String,
    pub paused: String,
    pub audio_playing: String,
    pub audio_started_playing: String,
    pub live_track: String,
    pub queue: String,
    pub previous_track: String,
    pub next_track: String,
    pub pause_resume_track: String,
    pub previous_page: String,
    pub next_page: String,
    pub back: String,
    pub server: String,
    pub looping: String,
}

impl Default for EmbedIcons {
    fn default() -> Self {
        Self {
            warning: "⚠️".into(),
            error: "❌".into(),
            success: "✅".into(),
            skipped: "⏭️".into(),
            pause_resumed: "⏯️".into(),
            paused: "⏸️".into(),
            audio_playing: "🎶".into(),
            audio_started_playing: "🎵".into(),
            live_track: "🔴".into(),
            queue: "📜".into(),
            previous_track: "⏮️".into(),
            next_track: "⏭️".into(),
            pause_resume_track: "⏯️".into(),
            previous_page: "⬅️".into(),
            next_page: "➡️".into(),
            back: "⏮️".into(),
            server: "🖥️".into(),
            looping: "🔁".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmbedInfo {
    pub fallback_icon_url: String,
    pub fallback_thumbnail_url: String,
}

impl Default for EmbedInfo {
    fn default() -> Self {
        Self {
            fallback_icon_url: "https://cdn.discordapp.com/embed/avatars/0.png".into(),
            fallback_thumbnail_url: "https://cdn.discordapp.com/embed/avatars/0.png".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmbedBehavior {
    pub enable_player_start_messages: bool,
}

impl Default for EmbedBehavior {
    fn default() -> Self {
        Self {
            enable_player_start_messages: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlayerOptions {
    pub progress_bar: ProgressBarOptions,
    pub max_queue_size: usize,
    pub default_volume: f32,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            progress_bar: ProgressBarOptions::default(),
            max_queue_size: 1000,
            default_volume: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProgressBarOptions {
    pub length: usize,
    pub timecodes: bool,
    pub indicator: String,
    pub left_char: String,
    pub right_char: String,
}

impl Default for ProgressBarOptions {
    fn default() -> Self {
        Self {
            length: 14,
            timecodes: false,
            indicator: "🔘".into(),
            left_char: "▬".into(),
            right_char: "▬".into(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("CADENCE")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("bot.system_guild_ids")
                    .try_parsing(true),
            )
            .build()
            .context("failed to read configuration sources")?;

        let mut config: Config = settings
            .try_deserialize()
            .context("failed to deserialize configuration")?;

        config.discord_token =
            std::env::var("DISCORD_TOKEN").context("DISCORD_TOKEN is not set")?;
        config.application_id = match std::env::var("APPLICATION_ID") {
            Ok(id) if !id.trim().is_empty() => Some(id.trim().parse()?),
            _ => None,
        };

        config.validate()?;

        Ok(config)
    }

    /// Sanity checks for values that would otherwise fail at runtime.
    pub fn validate(&self) -> Result<()> {
        if self.player.progress_bar.length == 0 {
            anyhow::bail!("Progress bar length must be greater than 0");
        }

        if self.player.max_queue_size == 0 {
            anyhow::bail!("Max queue size must be greater than 0");
        }

        if !(0.0..=2.0).contains(&self.player.default_volume) {
            anyhow::bail!(
                "Default volume must be between 0.0 and 2.0, got: {}",
                self.player.default_volume
            );
        }

        if self.bot.shard_stats_timeout_secs == 0 {
            anyhow::bail!("Shard statistics timeout must be greater than 0");
        }

        Ok(())
    }

    /// Summary safe for logging; never includes the token.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Discord: App ID {} (commands: {})\n  \
            System guilds: {}\n  \
            Player: {}% vol, {} max queue\n  \
            Player start messages: {}",
            self.application_id
                .map_or("unset".to_string(), |id| id.to_string()),
            self.bot
                .dev_guild_id
                .map_or("global".to_string(), |id| format!("guild {id}")),
            self.bot.system_guild_ids.len(),
            (self.player.default_volume * 100.0) as u32,
            self.player.max_queue_size,
            self.embed.behavior.enable_player_start_messages,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_volume() {
        let mut config = Config::default();
        config.player.default_volume = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_progress_length() {
        let mut config = Config::default();
        config.player.progress_bar.length = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_overrides_keep_unset_defaults() {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [bot]
                system_guild_ids = [42]

                [embed.colors]
                warning = 16711680
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: Config = settings.try_deserialize().unwrap();

        assert_eq!(config.bot.system_guild_ids, vec![42]);
        assert_eq!(config.embed.colors.warning, 0xFF0000);
        assert_eq!(config.embed.colors.success, EmbedColors::default().success);
        assert_eq!(config.bot.shard_stats_timeout_secs, 5);
        assert!(config.embed.behavior.enable_player_start_messages);
    }
}
