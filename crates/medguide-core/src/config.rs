//! Runtime configuration read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Environment variable holding the SQLite database path.
pub const ENV_DB_PATH: &str = "MEDGUIDE_DB_PATH";
/// Environment variable holding the busy timeout in milliseconds.
pub const ENV_BUSY_TIMEOUT_MS: &str = "MEDGUIDE_BUSY_TIMEOUT_MS";
/// Environment variable switching logs to JSON (`1`/`true`).
pub const ENV_LOG_JSON: &str = "MEDGUIDE_LOG_JSON";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// How long a connection waits for a locked database
    pub busy_timeout_ms: u64,
    /// Emit JSON log lines instead of human-readable ones
    pub json_logs: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("medguide.db"),
            busy_timeout_ms: 5_000,
            json_logs: false,
        }
    }
}

impl CoreConfig {
    /// Build from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DB_PATH).filter(|p| !p.trim().is_empty()) {
            config.database_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup(ENV_BUSY_TIMEOUT_MS) {
            config.busy_timeout_ms = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: ENV_BUSY_TIMEOUT_MS,
                expected: "a non-negative integer",
                value: raw.clone(),
            })?;
        }

        if let Some(raw) = lookup(ENV_LOG_JSON) {
            config.json_logs = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: ENV_LOG_JSON,
                        expected: "a boolean",
                        value: raw,
                    })
                }
            };
        }

        Ok(config)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
