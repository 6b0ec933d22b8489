//! End-to-end tests for the scan/cache/aggregate pipeline: real
//! directories, real tag extraction, queries through the library
//! manager.

mod common;

use common::{test_extensions, write_tagged_wav, write_wav};

use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};
use tokio_util::sync::CancellationToken;

use medley::filesystem::{ArtworkStore, FilesystemSource, TagExtractor};
use medley::source::{album_id, UNKNOWN_ARTIST};
use medley::{LibraryError, LibraryManager, QueryOptions, SearchOptions};

/// A manager with one filesystem source over `root`, artwork cached
/// inside `artwork`.
fn library_over(root: &Path, artwork: &Path, source_id: &str) -> LibraryManager {
    let manager = LibraryManager::new();
    let extractor = Arc::new(TagExtractor::new(Some(ArtworkStore::new(artwork))));
    manager.register_source(Arc::new(FilesystemSource::new(
        source_id,
        root,
        &test_extensions(),
        extractor,
    )));
    manager
}

fn scratch() -> (TempDir, TempDir) {
    (tempdir().unwrap(), tempdir().unwrap())
}

// ============================================================================
// Scan scenarios
// ============================================================================

#[tokio::test]
async fn test_scan_tagged_and_untagged_files() {
    let (root, artwork) = scratch();
    write_tagged_wav(&root.path().join("a.wav"), "Song A", "X", "Singles", 1);
    // Not a real flac: tag reading fails and the filename fallback kicks in.
    fs::write(root.path().join("b.flac"), b"not a flac stream").unwrap();

    let manager = library_over(root.path(), artwork.path(), "main");
    manager
        .scan_all_sources(CancellationToken::new())
        .await
        .unwrap();

    let tracks = manager.get_all_tracks(&QueryOptions::default());
    assert_eq!(tracks.len(), 2);

    let tagged = tracks.iter().find(|t| t.title == "Song A").unwrap();
    assert_eq!(tagged.artist, "X");
    assert_eq!(tagged.source_id, "main");
    assert!(tagged.duration.as_secs() >= 1);

    let fallback = tracks.iter().find(|t| t.title == "b").unwrap();
    assert_eq!(fallback.artist, UNKNOWN_ARTIST);
    assert_eq!(fallback.format, "flac");
}

#[tokio::test]
async fn test_scan_recovers_per_file_failures() {
    let (root, artwork) = scratch();
    write_tagged_wav(&root.path().join("one.wav"), "One", "X", "Album", 1);
    write_tagged_wav(&root.path().join("two.wav"), "Two", "X", "Album", 2);
    write_tagged_wav(&root.path().join("three.wav"), "Three", "X", "Album", 3);
    // Scanned (extension is configured) but no extractor supports it.
    fs::write(root.path().join("broken.mp3.xyz"), b"junk").unwrap();

    let manager = LibraryManager::new();
    let extractor = Arc::new(TagExtractor::new(Some(ArtworkStore::new(artwork.path()))));
    let mut extensions = test_extensions();
    extensions.push(".xyz".to_string());
    manager.register_source(Arc::new(FilesystemSource::new(
        "main",
        root.path(),
        &extensions,
        extractor,
    )));

    // The scan reports success; the bad file shows up only in the
    // progress error list.
    manager
        .scan_all_sources(CancellationToken::new())
        .await
        .unwrap();

    let progress = manager.scan_progress("main").unwrap();
    assert!(!progress.is_scanning);
    assert_eq!(progress.total_files, 4);
    assert_eq!(progress.errors.len(), 1);
    assert!(progress.errors[0].contains("broken.mp3.xyz"));

    assert_eq!(manager.get_all_tracks(&QueryOptions::default()).len(), 3);
}

#[tokio::test]
async fn test_cancelled_scan_fails_and_leaves_partial_state() {
    let (root, artwork) = scratch();
    for name in ["a.wav", "b.wav", "c.wav"] {
        write_wav(&root.path().join(name), 1);
    }

    let manager = library_over(root.path(), artwork.path(), "main");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = manager.scan_source("main", cancel).await.unwrap_err();
    assert!(matches!(err, LibraryError::Cancelled));

    // Cancelled before any file was processed: nothing was indexed, and
    // the source is idle again.
    assert!(manager.get_all_tracks(&QueryOptions::default()).is_empty());
    assert!(!manager.scan_progress("main").unwrap().is_scanning);
}

#[tokio::test]
async fn test_rescan_yields_identical_ids() {
    let (root, artwork) = scratch();
    write_tagged_wav(&root.path().join("song.wav"), "Song", "X", "Album", 1);

    let manager = library_over(root.path(), artwork.path(), "main");

    manager
        .scan_all_sources(CancellationToken::new())
        .await
        .unwrap();
    let first = manager.get_all_tracks(&QueryOptions::default());

    manager
        .scan_all_sources(CancellationToken::new())
        .await
        .unwrap();
    let second = manager.get_all_tracks(&QueryOptions::default());

    assert_eq!(first.len(), 1);
    assert_eq!(first[0].id, second[0].id);
    assert_eq!(first[0].album_id, second[0].album_id);
}

// ============================================================================
// Aggregation scenarios
// ============================================================================

#[tokio::test]
async fn test_two_sources_aggregate_and_unregister() {
    let left = tempdir().unwrap();
    let right = tempdir().unwrap();
    let artwork = tempdir().unwrap();
    write_tagged_wav(&left.path().join("l.wav"), "Left", "A", "One", 1);
    write_tagged_wav(&right.path().join("r.wav"), "Right", "B", "Two", 1);

    let manager = LibraryManager::new();
    for (id, root) in [("left", left.path()), ("right", right.path())] {
        let extractor = Arc::new(TagExtractor::new(Some(ArtworkStore::new(artwork.path()))));
        manager.register_source(Arc::new(FilesystemSource::new(
            id,
            root,
            &test_extensions(),
            extractor,
        )));
    }

    manager
        .scan_all_sources(CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(manager.get_all_tracks(&QueryOptions::default()).len(), 2);

    assert!(manager.unregister_source("right"));
    let remaining = manager.get_all_tracks(&QueryOptions::default());
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].title, "Left");
}

#[tokio::test]
async fn test_search_and_point_lookup_across_sources() {
    let (root, artwork) = scratch();
    write_tagged_wav(
        &root.path().join("drive.wav"),
        "Midnight Drive",
        "Nova",
        "Night Songs",
        1,
    );
    write_tagged_wav(
        &root.path().join("sunrise.wav"),
        "Sunrise",
        "Dawn Patrol",
        "Morning",
        1,
    );

    let manager = library_over(root.path(), artwork.path(), "main");
    manager
        .scan_all_sources(CancellationToken::new())
        .await
        .unwrap();

    let hits = manager.search_tracks("midnight", &SearchOptions::default());
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Midnight Drive");

    // Empty query matches everything.
    assert_eq!(
        manager.search_tracks("", &SearchOptions::default()).len(),
        2
    );

    let track = manager.get_track_by_id(&hits[0].id).unwrap();
    assert_eq!(track.title, "Midnight Drive");
    assert!(matches!(
        manager.get_track_by_id("track_0000000000000000"),
        Err(LibraryError::NotFound)
    ));
}

#[tokio::test]
async fn test_album_ordering_and_derived_views() {
    let (root, artwork) = scratch();
    // Written out of track order on purpose.
    write_tagged_wav(&root.path().join("z.wav"), "Closer", "X", "First Light", 3);
    write_tagged_wav(&root.path().join("a.wav"), "Opener", "X", "First Light", 1);
    write_tagged_wav(&root.path().join("m.wav"), "Middle", "X", "First Light", 2);

    let manager = library_over(root.path(), artwork.path(), "main");
    manager
        .scan_all_sources(CancellationToken::new())
        .await
        .unwrap();

    let tracks = manager
        .get_tracks_by_album(&album_id("First Light", ""))
        .unwrap();
    let titles: Vec<&str> = tracks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Opener", "Middle", "Closer"]);

    let albums = manager.get_albums();
    assert_eq!(albums.len(), 1);
    assert_eq!(albums[0].title, "First Light");
    assert_eq!(albums[0].track_count, 3);

    let artists = manager.get_artists();
    assert_eq!(artists.len(), 1);
    assert_eq!(artists[0].name, "X");
    assert_eq!(artists[0].album_count, 1);
    assert_eq!(artists[0].track_count, 3);

    let by_artist = manager.get_tracks_by_artist(&artists[0].id).unwrap();
    assert_eq!(by_artist.len(), 3);
}

// ============================================================================
// Capability and wire shape
// ============================================================================

#[tokio::test]
async fn test_browse_lists_source_directories() {
    let (root, artwork) = scratch();
    fs::create_dir(root.path().join("albums")).unwrap();
    write_wav(&root.path().join("loose.wav"), 1);

    let manager = library_over(root.path(), artwork.path(), "main");

    let nodes = manager.browse_source("main", "").unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].name, "albums");
    assert!(nodes[0].is_directory);
    assert_eq!(nodes[1].name, "loose.wav");
    assert_eq!(nodes[1].extension, ".wav");

    assert!(matches!(
        manager.browse_source("ghost", ""),
        Err(LibraryError::SourceNotFound(_))
    ));
}

#[tokio::test]
async fn test_track_serializes_with_camel_case_keys() {
    let (root, artwork) = scratch();
    write_tagged_wav(&root.path().join("song.wav"), "Song", "X", "Album", 1);

    let manager = library_over(root.path(), artwork.path(), "main");
    manager
        .scan_all_sources(CancellationToken::new())
        .await
        .unwrap();

    let tracks = manager.get_all_tracks(&QueryOptions::default());
    let json = serde_json::to_value(&tracks[0]).unwrap();

    assert_eq!(json["sourceId"], "main");
    assert_eq!(json["sourceType"], "filesystem");
    assert!(json["id"].as_str().unwrap().starts_with("track_"));
    assert!(json.get("filePath").is_some());
    assert!(json.get("trackNumber").is_some());
}
