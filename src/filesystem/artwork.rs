//! On-disk cache for embedded cover images.

use std::fs;
use std::path::{Path, PathBuf};

use lofty::picture::MimeType;

use crate::error::LibraryError;

/// Persists embedded cover art keyed by track id.
///
/// Files are written once: a cover that already exists on disk for a
/// given track id is not rewritten, since the id is derived from the
/// file locator and re-scans carry the same image.
#[derive(Clone, Debug)]
pub struct ArtworkStore {
    dir: PathBuf,
}

impl ArtworkStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ArtworkStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write cover data for a track, returning the cached file path.
    pub fn save(
        &self,
        track_id: &str,
        mime_type: Option<&MimeType>,
        data: &[u8],
    ) -> Result<PathBuf, LibraryError> {
        fs::create_dir_all(&self.dir)?;

        let path = self
            .dir
            .join(format!("{}{}", track_id, image_extension(mime_type)));
        if !path.exists() {
            fs::write(&path, data)?;
        }

        Ok(path)
    }
}

/// File extension for a cover image MIME type, defaulting to JPEG.
fn image_extension(mime_type: Option<&MimeType>) -> &'static str {
    match mime_type {
        Some(MimeType::Png) => ".png",
        Some(MimeType::Jpeg) => ".jpg",
        Some(MimeType::Gif) => ".gif",
        Some(MimeType::Bmp) => ".bmp",
        Some(MimeType::Tiff) => ".tiff",
        Some(MimeType::Unknown(other)) if other == "image/webp" => ".webp",
        _ => ".jpg",
    }
}
