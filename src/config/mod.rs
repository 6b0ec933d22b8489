//! Configuration resolution: CLI arguments plus an optional TOML file,
//! merged and validated into the runtime `AppConfig`.

mod file_config;

pub use file_config::{FileConfig, SourceEntry};

use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::source::SourceType;

/// Extensions scanned when a source does not configure its own list.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".mp3", ".flac", ".m4a", ".ogg"];

/// CLI arguments that participate in config resolution. Values from the
/// TOML file override these where present.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub artwork_dir: Option<PathBuf>,
    /// Ad-hoc source root: scan one directory without a config file.
    pub root: Option<PathBuf>,
}

/// Validated runtime settings for one source.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub id: String,
    pub name: String,
    pub source_type: SourceType,
    pub enabled: bool,
    pub root_path: PathBuf,
    pub watch_for_changes: bool,
    /// Lowercased extensions with leading dot.
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub artwork_dir: PathBuf,
    pub sources: Vec<SourceSettings>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file
    /// config. TOML values override CLI values.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let artwork_dir = file
            .artwork_dir
            .map(PathBuf::from)
            .or_else(|| cli.artwork_dir.clone())
            .or_else(default_artwork_dir)
            .ok_or_else(|| anyhow::anyhow!("Could not determine an artwork cache directory"))?;

        let mut entries = file.sources;
        if entries.is_empty() {
            if let Some(root) = &cli.root {
                entries.push(SourceEntry {
                    id: "local".to_string(),
                    name: Some("Local music".to_string()),
                    source_type: SourceType::Filesystem,
                    enabled: true,
                    root_path: root.display().to_string(),
                    watch_for_changes: false,
                    extensions: Vec::new(),
                });
            }
        }

        if entries.is_empty() {
            bail!("No sources configured; add [[sources]] to the config file or pass --root");
        }

        let mut sources = Vec::with_capacity(entries.len());
        for entry in entries {
            sources.push(validate_source(entry)?);
        }

        Ok(AppConfig {
            artwork_dir,
            sources,
        })
    }

    /// The sources the library should register.
    pub fn enabled_sources(&self) -> impl Iterator<Item = &SourceSettings> {
        self.sources.iter().filter(|s| s.enabled)
    }
}

fn validate_source(entry: SourceEntry) -> Result<SourceSettings> {
    if entry.id.is_empty() {
        bail!("Source id must not be empty");
    }

    let root_path = PathBuf::from(&entry.root_path);
    if entry.enabled {
        if !root_path.exists() {
            bail!(
                "Source {}: root path does not exist: {:?}",
                entry.id,
                root_path
            );
        }
        if !root_path.is_dir() {
            bail!(
                "Source {}: root path is not a directory: {:?}",
                entry.id,
                root_path
            );
        }
    }

    let mut extensions: Vec<String> = if entry.extensions.is_empty() {
        DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
    } else {
        entry
            .extensions
            .iter()
            .map(|e| normalize_extension(e))
            .collect()
    };
    extensions.dedup();

    Ok(SourceSettings {
        name: entry.name.unwrap_or_else(|| entry.id.clone()),
        id: entry.id,
        source_type: entry.source_type,
        enabled: entry.enabled,
        root_path,
        watch_for_changes: entry.watch_for_changes,
        extensions,
    })
}

/// Lowercase and ensure the leading dot, so ".MP3", "mp3" and ".mp3" all
/// configure the same extension.
fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

fn default_artwork_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("medley").join("artwork"))
}
