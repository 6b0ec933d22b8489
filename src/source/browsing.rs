//! Directory browsing capability.
//!
//! Browsing is segregated from the base source contract so that sources
//! which cannot enumerate their storage (remote APIs) are not forced to
//! implement it. Consumers reach it through
//! `TrackSource::as_directory_browser`.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::LibraryError;

/// A file or directory in a browsable source.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub name: String,
    pub path: PathBuf,
    pub is_directory: bool,
    /// Size in bytes; zero for directories.
    pub size: u64,
    /// Lowercased extension including the dot; empty for directories.
    pub extension: String,
}

/// Optional capability: list files and directories in a source's storage.
pub trait DirectoryBrowser {
    /// List the immediate children of a path relative to the source root
    /// ("" or "/" for the root itself).
    fn list_directory(&self, relative_path: &str) -> Result<Vec<FileNode>, LibraryError>;

    /// The configured root this browser resolves against.
    fn root_path(&self) -> &Path;
}
