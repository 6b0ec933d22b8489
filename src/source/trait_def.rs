//! TrackSource trait definition.
//!
//! This trait abstracts a single configured source of tracks so the
//! library manager can fan out over heterogeneous backends (local
//! filesystem today, remote APIs later) transparently.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::browsing::DirectoryBrowser;
use super::models::{SourceType, Track};
use crate::error::LibraryError;

/// Field used to order query results.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    Title,
    Artist,
    Album,
    Year,
    Duration,
    AddedAt,
}

impl std::str::FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(SortField::Title),
            "artist" => Ok(SortField::Artist),
            "album" => Ok(SortField::Album),
            "year" => Ok(SortField::Year),
            "duration" => Ok(SortField::Duration),
            "addedAt" | "added-at" => Ok(SortField::AddedAt),
            _ => Err(format!("unknown sort field: {}", s)),
        }
    }
}

/// Direction of the ordering.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(format!("unknown sort order: {}", s)),
        }
    }
}

/// Pagination and ordering for list queries.
///
/// `limit` of zero means unbounded: everything from `offset` on.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    pub limit: usize,
    pub offset: usize,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

/// Track field a search query is matched against.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchField {
    Title,
    Artist,
    Album,
    AlbumArtist,
    Genre,
}

impl std::str::FromStr for SearchField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(SearchField::Title),
            "artist" => Ok(SearchField::Artist),
            "album" => Ok(SearchField::Album),
            "albumArtist" | "album-artist" => Ok(SearchField::AlbumArtist),
            "genre" => Ok(SearchField::Genre),
            _ => Err(format!("unknown search field: {}", s)),
        }
    }
}

/// Search options: pagination/ordering plus the fields to match.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    #[serde(flatten)]
    pub query: QueryOptions,
    pub fields: Vec<SearchField>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            query: QueryOptions::default(),
            fields: vec![SearchField::Title, SearchField::Artist, SearchField::Album],
        }
    }
}

/// Live state of an in-flight or completed scan.
///
/// Readers always receive a clone taken under the progress lock, never a
/// reference into mutable state.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanProgress {
    pub is_scanning: bool,
    pub total_files: usize,
    pub processed_files: usize,
    pub current_file: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<String>,
}

/// Contract for a single configured source of tracks.
///
/// Implementations must be safe to share across tasks; `scan` performs
/// blocking filesystem work and is expected to run under
/// `tokio::task::spawn_blocking`, polling the token between files.
pub trait TrackSource: Send + Sync {
    // =========================================================================
    // Identity
    // =========================================================================

    /// The configured source id this instance serves.
    fn source_id(&self) -> &str;

    /// The kind of backend behind this source.
    fn source_type(&self) -> SourceType;

    // =========================================================================
    // CRUD
    // =========================================================================

    /// Look up a single track by id.
    fn find_by_id(&self, id: &str) -> Result<Track, LibraryError>;

    /// All tracks, ordered and paginated per the options.
    fn find_all(&self, opts: &QueryOptions) -> Result<Vec<Track>, LibraryError>;

    /// Insert a track; fails with `AlreadyExists` on id collision.
    ///
    /// Present for sources that are fed externally rather than scanned;
    /// the scan path never goes through this.
    fn create(&self, track: Track) -> Result<(), LibraryError>;

    /// Replace an existing track; fails with `NotFound` if absent.
    fn update(&self, track: Track) -> Result<(), LibraryError>;

    /// Remove a track by id; fails with `NotFound` if absent.
    fn delete(&self, id: &str) -> Result<(), LibraryError>;

    // =========================================================================
    // Queries
    // =========================================================================

    /// Tracks of one album, ordered by (disc number, track number).
    fn find_by_album(&self, album_id: &str) -> Result<Vec<Track>, LibraryError>;

    /// Tracks of one artist, ordered by (album, track number).
    fn find_by_artist(&self, artist_id: &str) -> Result<Vec<Track>, LibraryError>;

    /// Case-insensitive substring search over the selected fields.
    fn search(&self, query: &str, opts: &SearchOptions) -> Result<Vec<Track>, LibraryError>;

    // =========================================================================
    // Scanning
    // =========================================================================

    /// Rebuild this source's catalog from its backing storage.
    ///
    /// Fails fast with `ScanInProgress` when a scan is already running,
    /// and with `Cancelled` when the token fires mid-scan (leaving the
    /// cache in a partial state by design).
    fn scan(&self, cancel: &CancellationToken) -> Result<(), LibraryError>;

    /// Snapshot of the current scan progress.
    fn scan_progress(&self) -> ScanProgress;

    // =========================================================================
    // Capabilities
    // =========================================================================

    /// Directory browsing, for sources that can enumerate their storage.
    /// The default is no capability.
    fn as_directory_browser(&self) -> Option<&dyn DirectoryBrowser> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_field_parsing() {
        assert_eq!("title".parse::<SortField>().unwrap(), SortField::Title);
        assert_eq!("addedAt".parse::<SortField>().unwrap(), SortField::AddedAt);
        assert!("nope".parse::<SortField>().is_err());
    }

    #[test]
    fn test_default_search_fields() {
        let opts = SearchOptions::default();
        assert_eq!(
            opts.fields,
            vec![SearchField::Title, SearchField::Artist, SearchField::Album]
        );
    }

    #[test]
    fn test_default_query_options_sort_by_title_unbounded() {
        let opts = QueryOptions::default();
        assert_eq!(opts.sort_by, SortField::Title);
        assert_eq!(opts.sort_order, SortOrder::Asc);
        assert_eq!(opts.limit, 0);
        assert_eq!(opts.offset, 0);
    }
}
