//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root of the events API, e.g. `https://host/api`.
    pub api_base_url: String,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
    /// Event id or folder used when a command is run without `--event`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_event: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("default_event", &self.default_event)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: evt_api::DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: evt_api::DEFAULT_TIMEOUT.as_secs(),
            default_event: None,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (EVT_*)
        figment = figment.merge(Env::prefixed("EVT_"));

        figment.extract()
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Builds an API client for the configured server.
    pub fn client(&self) -> anyhow::Result<evt_api::Client> {
        evt_api::Client::new(&self.api_base_url, self.request_timeout())
            .context("failed to create events API client")
    }

    /// Picks the event a command targets: the explicit flag, else the configured default.
    pub fn event<'a>(&'a self, explicit: Option<&'a str>) -> anyhow::Result<&'a str> {
        explicit
            .or(self.default_event.as_deref())
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .context("no event selected; pass --event or set default_event in the config")
    }
}

/// Returns the platform-specific config directory for evt.
///
/// On Linux: `~/.config/evt`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("evt"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_targets_production_server() {
        let config = Config::default();
        assert_eq!(
            config.api_base_url,
            "https://events-server-eu5z.onrender.com/api"
        );
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.default_event, None);
    }

    #[test]
    fn test_dirs_config_path_ends_with_evt() {
        let path = dirs_config_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "evt");
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "api_base_url = \"http://localhost:3000/api\"\ndefault_event = \"20250601_cityrun\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:3000/api");
        assert_eq!(config.default_event.as_deref(), Some("20250601_cityrun"));
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_event_prefers_flag_over_default() {
        let config = Config {
            default_event: Some("fallback".to_string()),
            ..Config::default()
        };
        assert_eq!(config.event(Some("explicit")).unwrap(), "explicit");
        assert_eq!(config.event(None).unwrap(), "fallback");

        let config = Config::default();
        let err = config.event(Some("  ")).unwrap_err();
        assert!(err.to_string().contains("--event"));
    }

    #[test]
    fn test_debug_lists_fields() {
        let debug = format!("{:?}", Config::default());
        assert!(debug.contains("api_base_url"));
        assert!(debug.contains("request_timeout_secs: 30"));
    }
}
