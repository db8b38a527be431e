use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

const DEFAULTS: &str = include_str!("../../config/default.toml");

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub keys: KeysConfig,
    pub hints: HintsConfig,
    pub scroll: ScrollConfig,
    pub sites: SitesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    pub chord_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HintsConfig {
    pub alphabet: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub step: i32,
    pub page: i32,
    pub smooth: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SitesConfig {
    pub suppressed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            chord_timeout_ms: 600,
        }
    }
}

impl Default for HintsConfig {
    fn default() -> Self {
        Self {
            alphabet: ('a'..='z').collect(),
            timeout_ms: 600,
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            step: 3,
            page: 20,
            smooth: true,
        }
    }
}

impl Default for SitesConfig {
    fn default() -> Self {
        Self {
            suppressed: vec!["chatgpt.com".to_string(), "github.com".to_string()],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "pagekeys=info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    ///
    /// An explicit path must exist; the per-user file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::from_toml(DEFAULTS, "built-in defaults")?;

        let user_path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::user_config_path().filter(|path| path.exists()),
        };

        if let Some(path) = user_path {
            let text = fs::read_to_string(&path).map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?;
            config = Self::from_toml(&text, &path.display().to_string())?;
            tracing::debug!("loaded config from {}", path.display());
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str, origin: &str) -> Result<Self> {
        toml::from_str(text).map_err(|source| Error::Config {
            origin: origin.to_string(),
            source,
        })
    }

    pub fn user_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "pagekeys")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.hint_alphabet().is_empty() {
            return Err(Error::InvalidConfig(
                "hints.alphabet must contain at least one character".to_string(),
            ));
        }
        if self.keys.chord_timeout_ms == 0 || self.hints.timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn chord_timeout(&self) -> Duration {
        Duration::from_millis(self.keys.chord_timeout_ms)
    }

    pub fn hint_timeout(&self) -> Duration {
        Duration::from_millis(self.hints.timeout_ms)
    }

    /// Hint alphabet with whitespace and repeated characters removed,
    /// first occurrence wins.
    pub fn hint_alphabet(&self) -> Vec<char> {
        let mut seen = BTreeSet::new();
        self.hints
            .alphabet
            .chars()
            .filter(|c| !c.is_whitespace() && seen.insert(*c))
            .collect()
    }
}

impl SitesConfig {
    /// Hosts on this list get every key; matching ignores case.
    pub fn is_suppressed(&self, host: &str) -> bool {
        self.suppressed
            .iter()
            .any(|suppressed| suppressed.eq_ignore_ascii_case(host))
    }
}
