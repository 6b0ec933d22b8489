//! Track model and the derived album/artist views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::Duration;

/// Sentinel artist for files without a readable artist tag.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
/// Sentinel album for files without a readable album tag.
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// The kind of source a track came from.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    #[default]
    #[serde(rename = "filesystem")]
    Filesystem,
    #[serde(rename = "api-selfhosted")]
    ApiSelfHosted,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::Filesystem => write!(f, "filesystem"),
            SourceType::ApiSelfHosted => write!(f, "api-selfhosted"),
        }
    }
}

/// A music track from any source.
///
/// `id` is derived from the file locator, `album_id`/`artist_id` from the
/// tag text, so re-scanning the same content always produces the same ids.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    // Identification
    pub id: String,
    pub source_id: String,
    pub source_type: SourceType,

    // Core metadata
    pub title: String,
    pub album: String,
    pub album_id: String,
    pub artist: String,
    pub artist_id: String,
    pub album_artist: String,

    // Additional metadata
    pub genre: String,
    pub year: u32,
    pub track_number: u32,
    pub disc_number: u32,
    pub duration: Duration,

    // File-specific (filesystem sources)
    pub file_path: PathBuf,
    pub file_size: u64,
    /// Container format, e.g. "mp3", "flac".
    pub format: String,
    /// Estimated average stream bit rate in kbps.
    pub bit_rate: u32,
    /// Sample rate in Hz.
    pub sample_rate: u32,

    // API-specific (remote sources)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub artwork_path: Option<PathBuf>,

    // Timestamps
    pub added_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Album view derived from the track set; never stored.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumSummary {
    pub id: String,
    pub source_id: String,
    pub source_type: SourceType,
    pub title: String,
    pub artist: String,
    pub artist_id: String,
    pub year: u32,
    pub genre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artwork_path: Option<PathBuf>,
    pub track_count: usize,
    pub total_duration: Duration,
}

/// Artist view derived from the track set; never stored.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistSummary {
    pub id: String,
    pub source_id: String,
    pub source_type: SourceType,
    pub name: String,
    pub album_count: usize,
    pub track_count: usize,
}

/// Derive a stable track id from its file locator.
pub fn track_id(locator: &str) -> String {
    format!("track_{}", short_hash(locator))
}

/// Derive a stable album id from album text and album artist.
///
/// The album artist disambiguates identically-named albums by different
/// artists; when absent the album text alone is hashed.
pub fn album_id(album: &str, album_artist: &str) -> String {
    let key = if album_artist.is_empty() {
        album.to_string()
    } else {
        format!("{}_{}", album_artist, album)
    };
    format!("album_{}", short_hash(&key))
}

/// Derive a stable artist id from the artist text.
pub fn artist_id(artist: &str) -> String {
    format!("artist_{}", short_hash(artist))
}

/// First 8 bytes of the SHA-256 digest, hex encoded.
fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let hex = format!("{:x}", digest);
    hex[..16].to_string()
}
