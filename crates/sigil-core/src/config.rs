//! Optional TOML configuration for the REPL.
//!
//! Looked up at `<config dir>/sigil/sigil.toml`. A missing file means
//! defaults; a malformed file is a startup error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SigilError};
use crate::replacements::ReplacementTable;

fn default_poll_interval_secs() -> u64 {
    1
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    /// Seconds between modification checks of watched files.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Extra replacement rules appended after the builtin vocabulary.
    #[serde(default, rename = "replacement")]
    pub replacements: Vec<ReplacementConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ReplacementConfig {
    pub shortcut: String,
    pub symbol: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            replacements: Vec::new(),
        }
    }
}

impl Config {
    /// Parses a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        if config.poll_interval_secs == 0 {
            return Err(SigilError::config("poll_interval_secs must be at least 1"));
        }
        Ok(config)
    }

    /// Loads a config file from an explicit path.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Loads from the default location, falling back to defaults when the
    /// file does not exist.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// The platform config file location, when a config dir exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sigil").join("sigil.toml"))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Builds the startup replacement table: builtin rules first, then the
    /// configured extras in file order.
    pub fn table(&self) -> ReplacementTable {
        let mut table = ReplacementTable::builtin();
        for rule in &self.replacements {
            table.add(rule.shortcut.clone(), rule.symbol.clone());
        }
        table
    }
}
