use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::source::SourceType;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    /// Directory for the on-disk cover art cache.
    pub artwork_dir: Option<String>,

    /// Configured music sources.
    pub sources: Vec<SourceEntry>,
}

/// One configured music source.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub source_type: SourceType,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub root_path: String,
    /// Accepted for forward compatibility; the scan path does not watch
    /// for filesystem changes.
    #[serde(default)]
    pub watch_for_changes: bool,
    /// Supported extensions with leading dot; empty means the default
    /// set.
    #[serde(default)]
    pub extensions: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
