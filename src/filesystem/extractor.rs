//! Tag and audio-property extraction for local audio files.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lofty::file::TaggedFileExt;
use lofty::picture::PictureType;
use lofty::tag::{Accessor, ItemKey};
use lofty::{file::AudioFile, probe::Probe};
use tracing::warn;

use super::artwork::ArtworkStore;
use crate::error::LibraryError;
use crate::source::{album_id, artist_id, track_id, Track, UNKNOWN_ALBUM, UNKNOWN_ARTIST};

/// Extensions the tag extractor can read.
const SUPPORTED_EXTENSIONS: &[&str] = &[
    ".mp3", ".m4a", ".m4b", ".m4p", ".flac", ".ogg", ".oga", ".opus", ".wav", ".aiff",
];

/// Reads metadata from an audio file and turns it into a `Track`.
pub trait Extractor: Send + Sync {
    /// Extract a track record from a file.
    ///
    /// Tag-read failure is not fatal; implementations fall back to a
    /// minimal record derived from the filename and file stat. Only a
    /// file that cannot be stat'ed at all is an error.
    fn extract(&self, path: &Path) -> Result<Track, LibraryError>;

    /// Whether a file extension (with leading dot) can be extracted.
    /// Queryable without touching any file, for capability negotiation.
    fn supports_format(&self, extension: &str) -> bool;
}

/// Extractor backed by lofty's tag readers.
///
/// A single probe yields both the embedded tag (title, artist, album,
/// album artist, genre, year, track/disc numbers, cover image) and the
/// container audio properties (duration, sample rate).
pub struct TagExtractor {
    artwork: Option<ArtworkStore>,
}

impl TagExtractor {
    /// `artwork` is the cover cache to persist embedded images into;
    /// pass `None` to skip artwork persistence entirely.
    pub fn new(artwork: Option<ArtworkStore>) -> Self {
        TagExtractor { artwork }
    }

    /// Build the minimal record used when no tag data is readable.
    fn track_from_filename(path: &Path, metadata: &fs::Metadata) -> Track {
        Track {
            id: track_id(&path.to_string_lossy()),
            title: filename_without_extension(path),
            artist: UNKNOWN_ARTIST.to_string(),
            album: UNKNOWN_ALBUM.to_string(),
            artist_id: artist_id(UNKNOWN_ARTIST),
            album_id: album_id(UNKNOWN_ALBUM, ""),
            file_path: path.to_path_buf(),
            file_size: metadata.len(),
            format: format_of(path),
            added_at: Utc::now(),
            modified_at: modified_time(metadata),
            ..Track::default()
        }
    }
}

impl Extractor for TagExtractor {
    fn extract(&self, path: &Path) -> Result<Track, LibraryError> {
        let metadata = fs::metadata(path).map_err(|source| LibraryError::MetadataExtraction {
            path: path.display().to_string(),
            source,
        })?;

        let tagged = match Probe::open(path).and_then(|probe| probe.read()) {
            Ok(tagged) => tagged,
            Err(_) => {
                // Unreadable container: fall back to filename + stat.
                return Ok(Self::track_from_filename(path, &metadata));
            }
        };

        let mut track = Self::track_from_filename(path, &metadata);

        let props = tagged.properties();
        track.duration = props.duration();
        track.sample_rate = props.sample_rate().unwrap_or(0);
        track.bit_rate = estimate_bit_rate(metadata.len(), props.duration());

        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            if let Some(title) = non_empty(tag.title().as_deref()) {
                track.title = title;
            }
            if let Some(artist) = non_empty(tag.artist().as_deref()) {
                track.artist = artist;
            }
            if let Some(album) = non_empty(tag.album().as_deref()) {
                track.album = album;
            }
            if let Some(album_artist) = non_empty(tag.get_string(&ItemKey::AlbumArtist)) {
                track.album_artist = album_artist;
            }
            if let Some(genre) = non_empty(tag.genre().as_deref()) {
                track.genre = genre;
            }
            track.year = tag.year().unwrap_or(0);
            track.track_number = tag.track().unwrap_or(0);
            track.disc_number = tag.disk().unwrap_or(0);

            if let Some(store) = &self.artwork {
                let cover = tag
                    .pictures()
                    .iter()
                    .find(|p| p.pic_type() == PictureType::CoverFront)
                    .or_else(|| tag.pictures().first());
                if let Some(picture) = cover {
                    match store.save(&track.id, picture.mime_type(), picture.data()) {
                        Ok(artwork_path) => track.artwork_path = Some(artwork_path),
                        Err(e) => {
                            warn!("Failed to save artwork for {}: {}", path.display(), e);
                        }
                    }
                }
            }
        }

        track.artist_id = artist_id(&track.artist);
        track.album_id = album_id(&track.album, &track.album_artist);

        Ok(track)
    }

    fn supports_format(&self, extension: &str) -> bool {
        let ext = extension.to_lowercase();
        SUPPORTED_EXTENSIONS.contains(&ext.as_str())
    }
}

/// Average stream bit rate in kbps from file size and duration.
///
/// This is `size * 8 / duration / 1000` — the whole-container average
/// including overhead, not a decoded audio bitstream rate. It is an
/// approximation, and zero when the duration is unknown.
fn estimate_bit_rate(file_size: u64, duration: Duration) -> u32 {
    let secs = duration.as_secs_f64();
    if secs <= 0.0 {
        return 0;
    }
    (file_size as f64 * 8.0 / (secs * 1000.0)) as u32
}

fn filename_without_extension(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Lowercased extension without the dot, e.g. "mp3".
fn format_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

fn modified_time(metadata: &fs::Metadata) -> DateTime<Utc> {
    metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
