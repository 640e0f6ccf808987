//! Configuration for Dionysus.
//!
//! Loads settings from `config.toml` in the Dionysus config directory, then
//! from `DIONYSUS_*` environment variables.
//! Uses figment for layered configuration with provenance tracking.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the config file inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Prefix for environment overrides, e.g. `DIONYSUS_API_BASE`
pub const ENV_PREFIX: &str = "DIONYSUS_";

/// Dionysus configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Base URL of the recipe API (default: http://localhost:8080/api).
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Quiet period before a changed filter triggers a match request (default: 300).
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// HTTP timeout for recipe API calls in seconds (default: 10).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Directory holding the saved user state (default: platform data dir).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Recipes per gallery page (default: 12).
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            debounce_ms: default_debounce_ms(),
            timeout_secs: default_timeout_secs(),
            data_dir: None,
            page_size: default_page_size(),
        }
    }
}

fn default_api_base() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_page_size() -> u32 {
    12
}

impl Config {
    /// Default location of the config file.
    pub fn default_path() -> PathBuf {
        config_dir().join(CONFIG_FILE_NAME)
    }

    /// Load configuration from the default config file and the environment.
    pub fn load_default() -> Self {
        Self::load(&Self::default_path())
    }

    /// Load configuration from `path`, then apply `DIONYSUS_*` overrides.
    ///
    /// Returns default config if the file doesn't exist.
    /// Invalid values are reported and replaced by defaults.
    pub fn load(path: &Path) -> Self {
        // Build layered config: defaults <- toml file <- environment
        let figment = Figment::from(Serialized::defaults(Config::default()));

        // Only add TOML provider if file exists
        let figment = if path.exists() {
            figment.merge(Toml::file(path))
        } else {
            figment
        };
        let figment = figment.merge(Env::prefixed(ENV_PREFIX));

        match figment.extract() {
            Ok(config) => {
                if path.exists() {
                    tracing::info!("Loaded config from {:?}", path);
                }
                config
            }
            Err(e) => {
                // Figment provides detailed error messages with provenance
                tracing::warn!("Config error: {}", e);
                Self::default()
            }
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Directory for the saved user state.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("dionysus")
        })
    }
}

/// Platform config directory for Dionysus.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dionysus")
}

#[cfg(test)]
mod tests {
    use super::*;

    // Config tests run inside a figment Jail so environment overrides set by
    // one test never leak into another.

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_base, "http://localhost:8080/api");
        assert_eq!(config.debounce(), Duration::from_millis(300));
        assert_eq!(config.page_size, 12);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_load_missing_config() {
        figment::Jail::expect_with(|_jail| {
            let config = Config::load(Path::new(CONFIG_FILE_NAME));
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_config() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE_NAME,
                r#"
api_base = "http://bar.local/api"
debounce_ms = 150
data_dir = "/tmp/dionysus-state"
"#,
            )?;

            let config = Config::load(Path::new(CONFIG_FILE_NAME));
            assert_eq!(config.api_base, "http://bar.local/api");
            assert_eq!(config.debounce_ms, 150);
            assert_eq!(config.data_dir(), PathBuf::from("/tmp/dionysus-state"));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_config_returns_defaults() {
        figment::Jail::expect_with(|jail| {
            // Invalid: debounce_ms should be a number, not a string
            jail.create_file(CONFIG_FILE_NAME, "debounce_ms = \"soon\"\n")?;

            let config = Config::load(Path::new(CONFIG_FILE_NAME));
            assert_eq!(config.debounce_ms, 300);
            Ok(())
        });
    }

    #[test]
    fn test_partial_config_merges_with_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE_NAME, "page_size = 24\n")?;

            let config = Config::load(Path::new(CONFIG_FILE_NAME));
            assert_eq!(config.page_size, 24); // from config
            assert_eq!(config.timeout_secs, 10); // from defaults
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE_NAME, "debounce_ms = 150\n")?;
            jail.set_env("DIONYSUS_DEBOUNCE_MS", "75");
            jail.set_env("DIONYSUS_API_BASE", "http://env.local/api");

            let config = Config::load(Path::new(CONFIG_FILE_NAME));
            assert_eq!(config.debounce_ms, 75);
            assert_eq!(config.api_base, "http://env.local/api");
            Ok(())
        });
    }
}
