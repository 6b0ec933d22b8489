//! Filesystem-backed track source.
//!
//! Binds one directory scanner, one extractor and one cache behind the
//! `TrackSource` contract. The cache is owned exclusively: registering or
//! unregistering the source moves the whole unit, so no catalog state can
//! outlive it.

use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::cache::TrackCache;
use super::extractor::Extractor;
use super::scanner::DirectoryScanner;
use crate::error::LibraryError;
use crate::source::{
    DirectoryBrowser, FileNode, QueryOptions, ScanProgress, SearchOptions, SourceType, Track,
    TrackSource,
};

pub struct FilesystemSource {
    source_id: String,
    scanner: DirectoryScanner,
    extractor: Arc<dyn Extractor>,
    cache: TrackCache,
    progress: Mutex<ScanProgress>,
}

/// Clears the scanning flag on every scan exit path, including panics
/// and early returns on cancellation.
struct ScanGuard<'a> {
    progress: &'a Mutex<ScanProgress>,
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut progress) = self.progress.lock() {
            progress.is_scanning = false;
            progress.current_file.clear();
        }
    }
}

impl FilesystemSource {
    pub fn new(
        source_id: impl Into<String>,
        root: impl Into<PathBuf>,
        extensions: &[String],
        extractor: Arc<dyn Extractor>,
    ) -> Self {
        FilesystemSource {
            source_id: source_id.into(),
            scanner: DirectoryScanner::new(root, extensions),
            extractor,
            cache: TrackCache::new(),
            progress: Mutex::new(ScanProgress::default()),
        }
    }

    /// Run the two-pass scan: discover files (counting discovery as
    /// progress), then extract them one by one into the cache.
    fn run_scan(&self, cancel: &CancellationToken) -> Result<(), LibraryError> {
        // Readers see an empty catalog until extraction refills it.
        self.cache.clear();

        let files = self.scanner.scan_files(cancel, |path| {
            let mut progress = self.progress.lock().unwrap();
            progress.processed_files += 1;
            progress.current_file = path.display().to_string();
        })?;

        {
            let mut progress = self.progress.lock().unwrap();
            progress.total_files = files.len();
            progress.processed_files = 0;
        }

        for path in &files {
            if cancel.is_cancelled() {
                return Err(LibraryError::Cancelled);
            }

            {
                let mut progress = self.progress.lock().unwrap();
                progress.processed_files += 1;
                progress.current_file = path.display().to_string();
            }

            let extension = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| format!(".{}", e.to_lowercase()))
                .unwrap_or_default();
            if !self.extractor.supports_format(&extension) {
                let err = LibraryError::UnsupportedFormat(extension);
                self.record_scan_error(path, &err);
                continue;
            }

            match self.extractor.extract(path) {
                Ok(mut track) => {
                    // The extractor does not know which source it serves;
                    // ownership is stamped here.
                    track.source_id = self.source_id.clone();
                    track.source_type = SourceType::Filesystem;
                    self.cache.add(track);
                }
                Err(e) => self.record_scan_error(path, &e),
            }
        }

        Ok(())
    }

    fn record_scan_error(&self, path: &Path, error: &LibraryError) {
        warn!("Failed to index {}: {}", path.display(), error);
        let mut progress = self.progress.lock().unwrap();
        progress.errors.push(format!("{}: {}", path.display(), error));
    }

    /// Resolve a browse path against the root, rejecting traversal
    /// outside it.
    fn resolve_relative(&self, relative_path: &str) -> Result<PathBuf, LibraryError> {
        let relative = relative_path.trim_start_matches(['/', '\\']);
        let mut resolved = self.scanner.root().to_path_buf();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return Err(LibraryError::NotFound),
            }
        }
        Ok(resolved)
    }
}

impl TrackSource for FilesystemSource {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn source_type(&self) -> SourceType {
        SourceType::Filesystem
    }

    fn find_by_id(&self, id: &str) -> Result<Track, LibraryError> {
        self.cache.get(id).ok_or(LibraryError::NotFound)
    }

    fn find_all(&self, opts: &QueryOptions) -> Result<Vec<Track>, LibraryError> {
        Ok(self.cache.get_all(opts))
    }

    fn create(&self, track: Track) -> Result<(), LibraryError> {
        if self.cache.get(&track.id).is_some() {
            return Err(LibraryError::AlreadyExists);
        }
        self.cache.add(track);
        Ok(())
    }

    fn update(&self, track: Track) -> Result<(), LibraryError> {
        if self.cache.get(&track.id).is_none() {
            return Err(LibraryError::NotFound);
        }
        self.cache.add(track);
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), LibraryError> {
        if !self.cache.delete(id) {
            return Err(LibraryError::NotFound);
        }
        Ok(())
    }

    fn find_by_album(&self, album_id: &str) -> Result<Vec<Track>, LibraryError> {
        Ok(self.cache.find_by_album(album_id))
    }

    fn find_by_artist(&self, artist_id: &str) -> Result<Vec<Track>, LibraryError> {
        Ok(self.cache.find_by_artist(artist_id))
    }

    fn search(&self, query: &str, opts: &SearchOptions) -> Result<Vec<Track>, LibraryError> {
        Ok(self.cache.search(query, opts))
    }

    fn scan(&self, cancel: &CancellationToken) -> Result<(), LibraryError> {
        {
            let mut progress = self.progress.lock().unwrap();
            if progress.is_scanning {
                return Err(LibraryError::ScanInProgress);
            }
            *progress = ScanProgress {
                is_scanning: true,
                ..ScanProgress::default()
            };
        }
        let _guard = ScanGuard {
            progress: &self.progress,
        };

        info!(
            "Scanning source {} at {}",
            self.source_id,
            self.scanner.root().display()
        );
        let result = self.run_scan(cancel);

        match &result {
            Ok(()) => {
                let progress = self.progress.lock().unwrap();
                info!(
                    "Scan of {} complete: {} file(s), {} error(s)",
                    self.source_id,
                    progress.total_files,
                    progress.errors.len()
                );
            }
            Err(e) => info!("Scan of {} stopped: {}", self.source_id, e),
        }

        result
    }

    fn scan_progress(&self) -> ScanProgress {
        self.progress.lock().unwrap().clone()
    }

    fn as_directory_browser(&self) -> Option<&dyn DirectoryBrowser> {
        Some(self)
    }
}

impl DirectoryBrowser for FilesystemSource {
    fn list_directory(&self, relative_path: &str) -> Result<Vec<FileNode>, LibraryError> {
        let dir = self.resolve_relative(relative_path)?;
        self.scanner.list_directory(&dir)
    }

    fn root_path(&self) -> &Path {
        self.scanner.root()
    }
}
