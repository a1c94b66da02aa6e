//! Application configuration.
//!
//! Settings come from a TOML file under the user config directory with
//! `UPDOWN_*` environment variables layered on top. A commented default
//! file is materialised on first run.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Directory under the user config root holding our files.
pub const CONFIG_DIR: &str = "updown";
/// File name of the main configuration file.
pub const CONFIG_FILE: &str = "config.toml";

const DEFAULT_CONFIG: &str = r#"# updown configuration
#
# Remote services. Leave user_id/bot_username unset to play the local
# demo loop without any remote synchronisation.
api_url = "http://localhost:8000"
gateway_url = "http://localhost:8080"
# user_id = 123456789
# bot_username = "my_game_bot"

[round]
seconds = 5
stake = 10

[walk]
min = 64980.0
max = 65040.0
max_step = 25.0
window = 15
"#;

/// Round tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundConfig {
    /// Countdown length in seconds.
    pub seconds: u32,
    /// Amount credited or debited per resolved round.
    pub stake: i64,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            seconds: 5,
            stake: 10,
        }
    }
}

/// Synthetic market tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Lower edge of the band samples never leave.
    pub min: f64,
    /// Upper edge of the band.
    pub max: f64,
    /// Largest per-tick move.
    pub max_step: f64,
    /// Number of samples kept for the chart.
    pub window: usize,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            min: 64_980.0,
            max: 65_040.0,
            max_step: 25.0,
            window: 15,
        }
    }
}

/// Resolved user/bot pair every remote endpoint requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Telegram user id the session acts for.
    pub user_id: i64,
    /// Bare bot username passed through to the services.
    pub bot_username: String,
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the balance/wins/channel API.
    pub api_url: String,
    /// Base URL of the gateway handling win increments.
    pub gateway_url: String,
    /// Telegram user id; unset means local demo mode.
    pub user_id: Option<i64>,
    /// Bot username; accepts `@name` and `t.me/name` forms.
    pub bot_username: Option<String>,
    /// Round tunables.
    pub round: RoundConfig,
    /// Synthetic market tunables.
    pub walk: WalkConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            gateway_url: "http://localhost:8080".to_string(),
            user_id: None,
            bot_username: None,
            round: RoundConfig::default(),
            walk: WalkConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from the default location plus environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load from an explicit file path plus environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(
                Environment::with_prefix("UPDOWN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to assemble configuration from {}", path.display()))?;
        let config: AppConfig = settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the game cannot run on.
    pub fn validate(&self) -> Result<()> {
        if self.walk.min >= self.walk.max {
            anyhow::bail!(
                "walk band is empty: min {} >= max {}",
                self.walk.min,
                self.walk.max
            );
        }
        if self.walk.max_step <= 0.0 {
            anyhow::bail!("walk max_step must be positive");
        }
        if self.walk.window < 2 {
            anyhow::bail!("walk window must hold at least two samples");
        }
        if self.round.seconds == 0 {
            anyhow::bail!("round seconds must be at least 1");
        }
        if self.round.stake <= 0 {
            anyhow::bail!("round stake must be positive");
        }
        Ok(())
    }

    /// Identity the remote endpoints require; `None` means the client runs
    /// the local demo loop and skips all remote calls.
    pub fn identity(&self) -> Option<Identity> {
        let user_id = self.user_id?;
        let raw = self.bot_username.as_deref()?;
        let bot_username = normalize_bot_username(raw)?;
        Some(Identity {
            user_id,
            bot_username,
        })
    }
}

/// Path of the main configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

/// Write a commented default configuration file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    if path.exists() {
        return Ok(path);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

static BOT_USERNAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:t\.me/)?@?([A-Za-z0-9_]+)/?$").expect("failed to compile bot username pattern")
});

/// Extract the bare bot username from `@name`, `t.me/name` or a full link.
pub fn normalize_bot_username(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    BOT_USERNAME_RE
        .captures(trimmed)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_are_playable() {
        let config = AppConfig::default();
        config.validate().expect("default config must validate");
        assert_eq!(config.round.seconds, 5);
        assert_eq!(config.walk.window, 15);
        assert!(config.identity().is_none());
    }

    #[test]
    fn loads_overrides_from_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
api_url = "https://api.example.test/"
user_id = 42
bot_username = "t.me/updown_bot"

[round]
seconds = 7
stake = 25
"#,
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.api_url, "https://api.example.test/");
        assert_eq!(config.round.seconds, 7);
        assert_eq!(config.round.stake, 25);
        // untouched sections keep their defaults
        assert_eq!(config.walk.window, 15);

        let identity = config.identity().expect("identity should resolve");
        assert_eq!(identity.user_id, 42);
        assert_eq!(identity.bot_username, "updown_bot");
        Ok(())
    }

    #[test]
    fn missing_file_falls_back_to_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("nope.toml"))?;
        assert_eq!(config.walk.min, 64_980.0);
        Ok(())
    }

    #[test]
    fn rejects_inverted_band() {
        let mut config = AppConfig::default();
        config.walk.min = config.walk.max + 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_length_round() {
        let mut config = AppConfig::default();
        config.round.seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn bot_username_normalization() {
        for raw in [
            "updown_bot",
            "@updown_bot",
            "t.me/updown_bot",
            "https://t.me/updown_bot",
            "https://t.me/updown_bot/",
        ] {
            assert_eq!(
                normalize_bot_username(raw).as_deref(),
                Some("updown_bot"),
                "failed for {raw}"
            );
        }
        assert_eq!(normalize_bot_username("   "), None);
    }

    #[test]
    fn identity_requires_both_parts() {
        let mut config = AppConfig::default();
        config.user_id = Some(7);
        assert!(config.identity().is_none());
        config.bot_username = Some("@bot_name".to_string());
        assert!(config.identity().is_some());
    }
}
