//! Shared fixtures for the integration tests: tiny but valid WAV files,
//! optionally tagged through lofty, laid out in temp directories.

use lofty::config::WriteOptions;
use lofty::prelude::*;
use lofty::tag::{Tag, TagType};
use std::path::Path;

pub const SAMPLE_RATE: u32 = 8000;

/// Write a valid mono 16-bit PCM WAV file of `seconds` seconds of
/// silence. Small enough to generate per test, real enough for tag and
/// property probing.
pub fn write_wav(path: &Path, seconds: u32) {
    let data_size = SAMPLE_RATE * 2 * seconds;

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_size).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    bytes.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes()); // byte rate
    bytes.extend_from_slice(&2u16.to_le_bytes()); // block align
    bytes.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_size.to_le_bytes());
    bytes.resize(bytes.len() + data_size as usize, 0);

    std::fs::write(path, &bytes).unwrap();
}

/// Write a WAV file carrying an ID3v2 tag with the given metadata.
pub fn write_tagged_wav(
    path: &Path,
    title: &str,
    artist: &str,
    album: &str,
    track_number: u32,
) {
    write_wav(path, 1);

    let mut tag = Tag::new(TagType::Id3v2);
    tag.set_title(title.to_string());
    tag.set_artist(artist.to_string());
    tag.set_album(album.to_string());
    tag.set_track(track_number);
    tag.save_to_path(path, WriteOptions::default()).unwrap();
}

/// The extension set the test sources scan for.
pub fn test_extensions() -> Vec<String> {
    vec![".wav".to_string(), ".flac".to_string(), ".mp3".to_string()]
}
