//! Recursive audio file discovery and non-recursive directory listing.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use crate::error::LibraryError;
use crate::source::FileNode;

/// Platform metadata files that never belong in a music catalog.
const IGNORED_FILES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini"];

/// Sidecar prefixes, e.g. macOS AppleDouble files.
const IGNORED_PREFIXES: &[&str] = &["._"];

/// Walks a root path for audio files matching a configured extension set.
pub struct DirectoryScanner {
    root: PathBuf,
    /// Lowercased extensions including the dot, e.g. ".mp3".
    extensions: HashSet<String>,
}

impl DirectoryScanner {
    pub fn new(root: impl Into<PathBuf>, extensions: &[String]) -> Self {
        DirectoryScanner {
            root: root.into(),
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a file extension (with leading dot) is in the configured set.
    pub fn is_supported(&self, extension: &str) -> bool {
        self.extensions.contains(&extension.to_lowercase())
    }

    /// Recursively enumerate audio files beneath the root in lexical order.
    ///
    /// `on_file` is invoked for each accepted file before the full list is
    /// returned, which lets callers track discovery progress. The token is
    /// checked before every entry; on cancellation the walk aborts and
    /// files already reported through the callback are not rolled back.
    /// Unreadable entries are skipped; only a root that cannot be read at
    /// all fails the walk.
    pub fn scan_files(
        &self,
        cancel: &CancellationToken,
        mut on_file: impl FnMut(&Path),
    ) -> Result<Vec<PathBuf>, LibraryError> {
        // Surface a missing or unreadable root instead of silently
        // returning an empty catalog.
        fs::metadata(&self.root)?;

        let mut audio_files = Vec::new();

        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            if cancel.is_cancelled() {
                return Err(LibraryError::Cancelled);
            }

            let entry = match entry {
                Ok(entry) => entry,
                // Permission errors and broken entries mid-walk are
                // swallowed; the walk continues.
                Err(_) => continue,
            };

            if entry.file_type().is_dir() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy();
            if should_ignore(&file_name) {
                continue;
            }

            if self.is_supported(&extension_of(entry.path())) {
                on_file(entry.path());
                audio_files.push(entry.path().to_path_buf());
            }
        }

        Ok(audio_files)
    }

    /// List the immediate children of one directory, sorted by name.
    ///
    /// Applies the same ignore rules as the recursive walk and fails
    /// outright if the directory cannot be read. Files are annotated with
    /// size and extension; directories are not.
    pub fn list_directory(&self, dir: &Path) -> Result<Vec<FileNode>, LibraryError> {
        let mut nodes = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(_) => continue,
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            if should_ignore(&name) {
                continue;
            }

            // Skip entries we can't stat.
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(_) => continue,
            };

            let is_directory = metadata.is_dir();
            nodes.push(FileNode {
                path: dir.join(&name),
                size: if is_directory { 0 } else { metadata.len() },
                extension: if is_directory {
                    String::new()
                } else {
                    extension_of(&entry.path())
                },
                name,
                is_directory,
            });
        }

        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(nodes)
    }
}

/// Lowercased extension including the dot, or empty when there is none.
fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

fn should_ignore(file_name: &str) -> bool {
    IGNORED_FILES.contains(&file_name)
        || IGNORED_PREFIXES.iter().any(|p| file_name.starts_with(p))
}
