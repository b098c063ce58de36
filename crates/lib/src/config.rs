//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.banter/config.json`).
//! Credentials can live in the file but are overridden by the `BOT_ID`,
//! `GROUP_ID`, and `ACCESS_TOKEN` environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level application config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// GroupMe credentials (file values; env vars take precedence).
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Probability settings for the response decision engine.
    #[serde(default)]
    pub probabilities: Probabilities,

    /// Seconds between polls of the group's latest message (default 5).
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Seconds the member cache stays fresh (default 3600).
    #[serde(default = "default_member_cache_ttl_secs")]
    pub member_cache_ttl_secs: u64,

    /// Data directory holding quotes.txt and the media lists. Relative
    /// paths are resolved against the config file's parent. Default:
    /// `Data` next to the config file.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// GroupMe identifiers. `botId` is required to post; `groupId` and
/// `accessToken` are required to poll messages and tag members.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsConfig {
    pub bot_id: Option<String>,
    pub group_id: Option<String>,
    pub access_token: Option<String>,
}

/// Chances driving the decision engine, each in [0, 1]. Out-of-range file
/// values are clamped on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Probabilities {
    #[serde(default = "default_response_probability")]
    pub response_probability: f64,
    #[serde(default = "default_quotify_probability")]
    pub quotify_probability: f64,
    #[serde(default = "default_hardly_know_her_probability")]
    pub hardly_know_her_probability: f64,
    #[serde(default = "default_callout_probability")]
    pub callout_probability: f64,
    #[serde(default = "default_include_probability")]
    pub include_text_probability: f64,
    #[serde(default = "default_include_probability")]
    pub include_media_probability: f64,
    #[serde(default = "default_include_probability")]
    pub include_mention_probability: f64,
}

fn default_response_probability() -> f64 {
    0.05
}

fn default_quotify_probability() -> f64 {
    0.025
}

fn default_hardly_know_her_probability() -> f64 {
    0.1
}

fn default_callout_probability() -> f64 {
    0.08
}

fn default_include_probability() -> f64 {
    0.5
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_member_cache_ttl_secs() -> u64 {
    3600
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials: CredentialsConfig::default(),
            probabilities: Probabilities::default(),
            poll_interval_secs: default_poll_interval_secs(),
            member_cache_ttl_secs: default_member_cache_ttl_secs(),
            data_dir: None,
        }
    }
}

impl Default for Probabilities {
    fn default() -> Self {
        Self {
            response_probability: default_response_probability(),
            quotify_probability: default_quotify_probability(),
            hardly_know_her_probability: default_hardly_know_her_probability(),
            callout_probability: default_callout_probability(),
            include_text_probability: default_include_probability(),
            include_media_probability: default_include_probability(),
            include_mention_probability: default_include_probability(),
        }
    }
}

impl Probabilities {
    fn clamp(&mut self) {
        for p in [
            &mut self.response_probability,
            &mut self.quotify_probability,
            &mut self.hardly_know_her_probability,
            &mut self.callout_probability,
            &mut self.include_text_probability,
            &mut self.include_media_probability,
            &mut self.include_mention_probability,
        ] {
            *p = p.clamp(0.0, 1.0);
        }
    }
}

fn env_or(var: &str, file_value: Option<&String>) -> Option<String> {
    std::env::var(var)
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            file_value
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Resolve the bot id: env BOT_ID overrides config.
pub fn resolve_bot_id(config: &Config) -> Option<String> {
    env_or("BOT_ID", config.credentials.bot_id.as_ref())
}

/// Resolve the group id: env GROUP_ID overrides config.
pub fn resolve_group_id(config: &Config) -> Option<String> {
    env_or("GROUP_ID", config.credentials.group_id.as_ref())
}

/// Resolve the access token: env ACCESS_TOKEN overrides config.
pub fn resolve_access_token(config: &Config) -> Option<String> {
    env_or("ACCESS_TOKEN", config.credentials.access_token.as_ref())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("BANTER_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".banter").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Resolve the data directory: `config.data_dir` if set (relative paths
/// resolved against the config file's parent), otherwise `Data` next to
/// the config file.
pub fn resolve_data_dir(config: &Config, config_path: &Path) -> PathBuf {
    let config_parent = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    match &config.data_dir {
        Some(d) if !d.as_os_str().is_empty() => {
            if d.is_absolute() {
                d.clone()
            } else {
                config_parent.join(d)
            }
        }
        _ => config_parent.join("Data"),
    }
}

/// Load config from the default path (or BANTER_CONFIG_PATH). Missing file
/// => default config. Probabilities are clamped to [0, 1] and the poll
/// interval must be positive.
/// Returns the config and the path that was used (for resolving the data
/// directory).
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let mut config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    config.probabilities.clamp();
    if config.poll_interval_secs == 0 {
        anyhow::bail!("pollIntervalSecs must be positive in {}", path.display());
    }
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_probabilities_match_documented_values() {
        let p = Probabilities::default();
        assert_eq!(p.response_probability, 0.05);
        assert_eq!(p.quotify_probability, 0.025);
        assert_eq!(p.hardly_know_her_probability, 0.1);
        assert_eq!(p.callout_probability, 0.08);
        assert_eq!(p.include_text_probability, 0.5);
        assert_eq!(p.include_media_probability, 0.5);
        assert_eq!(p.include_mention_probability, 0.5);
    }

    #[test]
    fn default_intervals() {
        let c = Config::default();
        assert_eq!(c.poll_interval_secs, 5);
        assert_eq!(c.member_cache_ttl_secs, 3600);
    }

    #[test]
    fn out_of_range_probabilities_are_clamped() {
        let mut p = Probabilities {
            response_probability: 1.7,
            quotify_probability: -0.4,
            ..Probabilities::default()
        };
        p.clamp();
        assert_eq!(p.response_probability, 1.0);
        assert_eq!(p.quotify_probability, 0.0);
    }

    #[test]
    fn config_parses_camel_case_fields() {
        let json = r#"{
            "credentials": {"botId": "b", "groupId": "g", "accessToken": "t"},
            "probabilities": {"responseProbability": 0.5},
            "pollIntervalSecs": 10
        }"#;
        let c: Config = serde_json::from_str(json).expect("parse");
        assert_eq!(c.credentials.bot_id.as_deref(), Some("b"));
        assert_eq!(c.probabilities.response_probability, 0.5);
        assert_eq!(c.probabilities.quotify_probability, 0.025);
        assert_eq!(c.poll_interval_secs, 10);
    }

    #[test]
    fn resolve_data_dir_default() {
        let config = Config::default();
        let path = Path::new("/home/user/.banter/config.json");
        assert_eq!(
            resolve_data_dir(&config, path),
            PathBuf::from("/home/user/.banter/Data")
        );
    }

    #[test]
    fn resolve_data_dir_override_relative() {
        let mut config = Config::default();
        config.data_dir = Some(PathBuf::from("custom/data"));
        let path = Path::new("/home/user/.banter/config.json");
        assert_eq!(
            resolve_data_dir(&config, path),
            PathBuf::from("/home/user/.banter/custom/data")
        );
    }

    #[test]
    fn resolve_data_dir_override_absolute() {
        let mut config = Config::default();
        config.data_dir = Some(PathBuf::from("/srv/banter/data"));
        let path = Path::new("/home/user/.banter/config.json");
        assert_eq!(
            resolve_data_dir(&config, path),
            PathBuf::from("/srv/banter/data")
        );
    }
}
