//! Configuration for keyterm.
//!
//! The configuration file is located at `~/.keyterm/config.toml`:
//!
//! ```toml
//! [session]
//! buffer_capacity = 8192     # initial output buffer size
//! buffer_limit = 1048576     # max bytes buffered between commits
//! read_timeout_ms = 100      # key read timeout
//!
//! [keys]
//! max_combo = 5              # longest key combo
//!
//! [[bindings]]
//! keys = "^q"
//! action = "quit"
//!
//! [[bindings]]
//! keys = "gg"
//! action = "top"
//!
//! [[bindings]]
//! keys = "/r"
//! action = "say"
//! arg = "enter pressed"
//! ```
//!
//! Bindings are tried in file order. When the file defines any bindings
//! they replace the built-in table.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::core::buffer::{DEFAULT_CAPACITY, DEFAULT_LIMIT};
use crate::core::session::SessionConfig;
use crate::input::binding::Arg;
use crate::input::matcher::DEFAULT_MAX_COMBO;
use crate::input::token::Pattern;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config")]
    Write(#[source] std::io::Error),

    #[error("could not determine config path")]
    NoPath,
}

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionSection,
    pub keys: KeysSection,
    pub bindings: Vec<BindingConfig>,
}

/// Session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub buffer_capacity: usize,
    pub buffer_limit: usize,
    pub read_timeout_ms: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_CAPACITY,
            buffer_limit: DEFAULT_LIMIT,
            read_timeout_ms: 100,
        }
    }
}

/// Key matcher settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysSection {
    pub max_combo: usize,
}

impl Default for KeysSection {
    fn default() -> Self {
        Self {
            max_combo: DEFAULT_MAX_COMBO,
        }
    }
}

/// One `[[bindings]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingConfig {
    pub keys: Pattern,
    pub action: String,
    #[serde(default, skip_serializing_if = "is_none")]
    pub arg: Arg,
}

fn is_none(arg: &Arg) -> bool {
    *arg == Arg::None
}

impl Config {
    /// Load from `~/.keyterm/config.toml`, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::get_config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::from_path(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config: {:#}", anyhow::Error::from(e));
                Self::default()
            }
        }
    }

    /// Load a specific file
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save configuration to `~/.keyterm/config.toml`
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::get_config_path().ok_or(ConfigError::NoPath)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(ConfigError::Write)?;
        }
        fs::write(&path, self.to_toml()?).map_err(ConfigError::Write)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Settings for `Session::init`
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            buffer_capacity: self.session.buffer_capacity,
            buffer_limit: self.session.buffer_limit,
            read_timeout: Duration::from_millis(self.session.read_timeout_ms),
        }
    }

    /// Directory holding config and log files
    pub fn config_dir() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".keyterm"))
    }

    fn get_config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::token::Token;

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.keys.max_combo, 5);

        let session = config.session_config();
        assert_eq!(session.buffer_capacity, 8192);
        assert_eq!(session.read_timeout, Duration::from_millis(100));
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
            [session]
            read_timeout_ms = 300

            [keys]
            max_combo = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.session.read_timeout_ms, 300);
        assert_eq!(config.session.buffer_limit, DEFAULT_LIMIT);
        assert_eq!(config.keys.max_combo, 8);
        assert!(config.bindings.is_empty());
    }

    #[test]
    fn test_bindings() {
        let config: Config = toml::from_str(
            r#"
            [[bindings]]
            keys = "^q"
            action = "quit"

            [[bindings]]
            keys = "/r"
            action = "say"
            arg = "enter"

            [[bindings]]
            keys = "j"
            action = "down"
            arg = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.bindings.len(), 3);
        assert_eq!(config.bindings[0].keys.tokens(), &[Token::Ctrl(b'q')]);
        assert_eq!(config.bindings[0].arg, Arg::None);
        assert_eq!(config.bindings[1].arg, Arg::Str("enter".into()));
        assert_eq!(config.bindings[2].arg, Arg::Int(3));
    }

    #[test]
    fn test_bad_pattern_is_an_error() {
        let result = toml::from_str::<Config>(
            r#"
            [[bindings]]
            keys = "^"
            action = "quit"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config: Config = toml::from_str(
            r#"
            [[bindings]]
            keys = "gg"
            action = "top"
            "#,
        )
        .unwrap();
        let text = config.to_toml().unwrap();
        assert_eq!(toml::from_str::<Config>(&text).unwrap(), config);
    }
}
