//! Cache configuration via `recall.toml`
//!
//! A small config file next to the project, same model as any dotfile: on
//! first use a commented default is written, and changing settings means
//! editing the file. No environment scraping and no ambient globals: the
//! loaded settings are passed explicitly into [`crate::Memo::open`].

use recall_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file name
pub const CONFIG_FILE_NAME: &str = "recall.toml";

/// Settings loaded from `recall.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Directory the cache lives in
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
}

fn default_directory() -> PathBuf {
    PathBuf::from(".recall")
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            directory: default_directory(),
        }
    }
}

impl CacheSettings {
    /// Parse settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| {
            Error::Serialization(format!("invalid {}: {}", CONFIG_FILE_NAME, e))
        })
    }

    /// Load settings from `recall.toml` under `dir`, writing the commented
    /// default file first if none exists yet
    pub fn load_or_init(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            fs::create_dir_all(dir)?;
            fs::write(&path, Self::default_toml())?;
            return Ok(CacheSettings::default());
        }
        Self::load(&path)
    }

    /// Returns the default config file content with comments
    pub fn default_toml() -> &'static str {
        r#"# Recall cache configuration
#
# Directory the result cache lives in, relative to this file's location
# unless absolute.
directory = ".recall"
"#
    }
}
