//! Library manager: fans queries and scans out across every registered
//! source and merges the results.
//!
//! One long-lived instance owns the source map; there is no global
//! registry. A single source failing a fan-out read is skipped so one
//! broken source never takes down an aggregate query.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use futures::future::join_all;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::LibraryError;
use crate::source::{
    artist_id, AlbumSummary, ArtistSummary, FileNode, QueryOptions, ScanProgress, SearchOptions,
    SourceType, Track, TrackSource,
};

/// Basic information about a registered source.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
}

pub struct LibraryManager {
    sources: RwLock<HashMap<String, Arc<dyn TrackSource>>>,
    /// Root token for fire-and-forget scans; cancelled on shutdown.
    shutdown: CancellationToken,
}

impl Default for LibraryManager {
    fn default() -> Self {
        LibraryManager::new()
    }
}

impl LibraryManager {
    pub fn new() -> Self {
        LibraryManager {
            sources: RwLock::new(HashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    // =========================================================================
    // Source registration
    // =========================================================================

    /// Register a source under its own id, replacing any previous
    /// registration with the same id.
    pub fn register_source(&self, source: Arc<dyn TrackSource>) {
        let id = source.source_id().to_string();
        info!("Registering source {} ({})", id, source.source_type());
        let mut sources = self.sources.write().unwrap();
        sources.insert(id, source);
    }

    /// Unregister a source, dropping it and its catalog together.
    /// Returns whether a source with that id was registered.
    pub fn unregister_source(&self, source_id: &str) -> bool {
        let mut sources = self.sources.write().unwrap();
        let removed = sources.remove(source_id).is_some();
        if removed {
            info!("Unregistered source {}", source_id);
        }
        removed
    }

    /// Snapshot of the registered sources; the map itself is never
    /// exposed.
    pub fn sources(&self) -> Vec<SourceInfo> {
        self.snapshot()
            .into_iter()
            .map(|source| SourceInfo {
                id: source.source_id().to_string(),
                source_type: source.source_type(),
            })
            .collect()
    }

    fn snapshot(&self) -> Vec<Arc<dyn TrackSource>> {
        let sources = self.sources.read().unwrap();
        sources.values().cloned().collect()
    }

    fn get_source(&self, source_id: &str) -> Result<Arc<dyn TrackSource>, LibraryError> {
        let sources = self.sources.read().unwrap();
        sources
            .get(source_id)
            .cloned()
            .ok_or_else(|| LibraryError::SourceNotFound(source_id.to_string()))
    }

    // =========================================================================
    // Fan-out reads
    // =========================================================================

    /// Tracks from every source, concatenated in unspecified source
    /// order. Options apply per source, not to the merged list.
    pub fn get_all_tracks(&self, opts: &QueryOptions) -> Vec<Track> {
        let mut all = Vec::new();
        for source in self.snapshot() {
            match source.find_all(opts) {
                Ok(tracks) => all.extend(tracks),
                Err(e) => {
                    warn!("Skipping source {} in list: {}", source.source_id(), e);
                }
            }
        }
        all
    }

    /// Probe every source for a track id; the first hit wins. Ids are
    /// unique only within a source, so cross-source collisions resolve
    /// arbitrarily.
    pub fn get_track_by_id(&self, id: &str) -> Result<Track, LibraryError> {
        for source in self.snapshot() {
            if let Ok(track) = source.find_by_id(id) {
                return Ok(track);
            }
        }
        Err(LibraryError::NotFound)
    }

    pub fn search_tracks(&self, query: &str, opts: &SearchOptions) -> Vec<Track> {
        let mut all = Vec::new();
        for source in self.snapshot() {
            match source.search(query, opts) {
                Ok(tracks) => all.extend(tracks),
                Err(e) => {
                    warn!("Skipping source {} in search: {}", source.source_id(), e);
                }
            }
        }
        all
    }

    pub fn get_tracks_by_album(&self, album_id: &str) -> Result<Vec<Track>, LibraryError> {
        let mut all = Vec::new();
        for source in self.snapshot() {
            match source.find_by_album(album_id) {
                Ok(tracks) => all.extend(tracks),
                Err(e) => {
                    warn!("Skipping source {} for album: {}", source.source_id(), e);
                }
            }
        }
        if all.is_empty() {
            return Err(LibraryError::NotFound);
        }
        Ok(all)
    }

    pub fn get_tracks_by_artist(&self, artist_id: &str) -> Result<Vec<Track>, LibraryError> {
        let mut all = Vec::new();
        for source in self.snapshot() {
            match source.find_by_artist(artist_id) {
                Ok(tracks) => all.extend(tracks),
                Err(e) => {
                    warn!("Skipping source {} for artist: {}", source.source_id(), e);
                }
            }
        }
        if all.is_empty() {
            return Err(LibraryError::NotFound);
        }
        Ok(all)
    }

    /// List a directory within a source. Browsing is an optional
    /// capability; sources that cannot enumerate their storage fail with
    /// `CapabilityUnsupported` instead of being forced to implement it.
    pub fn browse_source(
        &self,
        source_id: &str,
        relative_path: &str,
    ) -> Result<Vec<FileNode>, LibraryError> {
        let source = self.get_source(source_id)?;
        let browser = source
            .as_directory_browser()
            .ok_or(LibraryError::CapabilityUnsupported("directory browsing"))?;
        browser.list_directory(relative_path)
    }

    // =========================================================================
    // Derived views
    // =========================================================================

    /// Albums derived on demand from the merged track set, sorted by
    /// title. Albums are not stored entities; the hash-derived ids make
    /// this grouping stable across scans.
    pub fn get_albums(&self) -> Vec<AlbumSummary> {
        let mut by_album: HashMap<String, AlbumSummary> = HashMap::new();

        for track in self.get_all_tracks(&QueryOptions::default()) {
            let summary = by_album.entry(track.album_id.clone()).or_insert_with(|| {
                let artist = if track.album_artist.is_empty() {
                    track.artist.clone()
                } else {
                    track.album_artist.clone()
                };
                AlbumSummary {
                    id: track.album_id.clone(),
                    source_id: track.source_id.clone(),
                    source_type: track.source_type,
                    title: track.album.clone(),
                    artist_id: artist_id(&artist),
                    artist,
                    year: 0,
                    genre: String::new(),
                    artwork_path: None,
                    track_count: 0,
                    total_duration: std::time::Duration::ZERO,
                }
            });

            summary.track_count += 1;
            summary.total_duration += track.duration;
            if summary.year == 0 {
                summary.year = track.year;
            }
            if summary.genre.is_empty() {
                summary.genre = track.genre.clone();
            }
            if summary.artwork_path.is_none() {
                summary.artwork_path = track.artwork_path.clone();
            }
        }

        let mut albums: Vec<AlbumSummary> = by_album.into_values().collect();
        albums.sort_by(|a, b| a.title.cmp(&b.title));
        albums
    }

    /// Artists derived on demand from the merged track set, sorted by
    /// name.
    pub fn get_artists(&self) -> Vec<ArtistSummary> {
        let mut by_artist: HashMap<String, (ArtistSummary, std::collections::HashSet<String>)> =
            HashMap::new();

        for track in self.get_all_tracks(&QueryOptions::default()) {
            let (summary, albums) =
                by_artist.entry(track.artist_id.clone()).or_insert_with(|| {
                    (
                        ArtistSummary {
                            id: track.artist_id.clone(),
                            source_id: track.source_id.clone(),
                            source_type: track.source_type,
                            name: track.artist.clone(),
                            album_count: 0,
                            track_count: 0,
                        },
                        std::collections::HashSet::new(),
                    )
                });
            summary.track_count += 1;
            albums.insert(track.album_id.clone());
        }

        let mut artists: Vec<ArtistSummary> = by_artist
            .into_values()
            .map(|(mut summary, albums)| {
                summary.album_count = albums.len();
                summary
            })
            .collect();
        artists.sort_by(|a, b| a.name.cmp(&b.name));
        artists
    }

    // =========================================================================
    // Scanning
    // =========================================================================

    /// Scan a single source, waiting for completion. The blocking work
    /// runs on the blocking pool so the async executor is never tied up.
    pub async fn scan_source(
        &self,
        source_id: &str,
        cancel: CancellationToken,
    ) -> Result<(), LibraryError> {
        let source = self.get_source(source_id)?;
        tokio::task::spawn_blocking(move || source.scan(&cancel))
            .await
            .expect("scan task panicked")
    }

    /// Scan every registered source concurrently and wait for all of
    /// them. Returns the first error encountered (arbitrary among
    /// failures); per-source progress remains pollable throughout.
    pub async fn scan_all_sources(&self, cancel: CancellationToken) -> Result<(), LibraryError> {
        let handles: Vec<_> = self
            .snapshot()
            .into_iter()
            .map(|source| {
                let cancel = cancel.clone();
                tokio::task::spawn_blocking(move || source.scan(&cancel))
            })
            .collect();

        let mut first_error = None;
        for result in join_all(handles).await {
            let result = result.expect("scan task panicked");
            if let Err(e) = result {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Fire-and-forget scan of one source: returns as soon as the scan
    /// is spawned. Completion and failures are observed by polling
    /// `scan_progress`.
    pub fn start_scan(&self, source_id: &str) -> Result<(), LibraryError> {
        let source = self.get_source(source_id)?;
        self.spawn_scan(source);
        Ok(())
    }

    /// Fire-and-forget scan of every registered source.
    pub fn start_scan_all(&self) {
        for source in self.snapshot() {
            self.spawn_scan(source);
        }
    }

    fn spawn_scan(&self, source: Arc<dyn TrackSource>) {
        let cancel = self.shutdown.child_token();
        tokio::spawn(async move {
            let id = source.source_id().to_string();
            let result =
                tokio::task::spawn_blocking(move || source.scan(&cancel)).await;
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Background scan of {} failed: {}", id, e),
                Err(e) => warn!("Background scan of {} panicked: {}", id, e),
            }
        });
    }

    pub fn scan_progress(&self, source_id: &str) -> Result<ScanProgress, LibraryError> {
        Ok(self.get_source(source_id)?.scan_progress())
    }

    pub fn all_scan_progress(&self) -> HashMap<String, ScanProgress> {
        self.snapshot()
            .into_iter()
            .map(|source| (source.source_id().to_string(), source.scan_progress()))
            .collect()
    }

    /// Cancel all background scans started through this manager.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}
