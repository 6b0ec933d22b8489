//! Concurrency-safe in-memory track store.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::source::{QueryOptions, SearchField, SearchOptions, SortField, SortOrder, Track};

/// Keyed in-memory store serving one source's catalog.
///
/// Readers share the lock, writers take it exclusively. Every read
/// operation clones the matching entries out under the read lock before
/// sorting and slicing, so callers never observe a half-mutated record.
/// During a scan the cache is cleared and repopulated, so concurrent
/// readers see a shrinking-then-growing view until the scan completes.
#[derive(Debug, Default)]
pub struct TrackCache {
    tracks: RwLock<HashMap<String, Track>>,
}

impl TrackCache {
    pub fn new() -> Self {
        TrackCache::default()
    }

    /// Insert or replace a track, keyed by id. Last write wins.
    pub fn add(&self, track: Track) {
        let mut tracks = self.tracks.write().unwrap();
        tracks.insert(track.id.clone(), track);
    }

    pub fn get(&self, id: &str) -> Option<Track> {
        let tracks = self.tracks.read().unwrap();
        tracks.get(id).cloned()
    }

    /// Remove a track by id; returns whether it was present.
    pub fn delete(&self, id: &str) -> bool {
        let mut tracks = self.tracks.write().unwrap();
        tracks.remove(id).is_some()
    }

    pub fn clear(&self) {
        let mut tracks = self.tracks.write().unwrap();
        tracks.clear();
    }

    pub fn count(&self) -> usize {
        let tracks = self.tracks.read().unwrap();
        tracks.len()
    }

    /// All tracks, sorted by the requested field and sliced by
    /// offset/limit (limit of zero means everything from the offset on).
    pub fn get_all(&self, opts: &QueryOptions) -> Vec<Track> {
        let mut results: Vec<Track> = {
            let tracks = self.tracks.read().unwrap();
            tracks.values().cloned().collect()
        };

        sort_tracks(&mut results, opts.sort_by, opts.sort_order);
        paginate(results, opts.offset, opts.limit)
    }

    /// Case-insensitive substring search over the selected fields.
    ///
    /// A track matches when any selected field contains the lowercased
    /// query; the empty query therefore matches every track. Results are
    /// sorted and paginated exactly like `get_all`.
    pub fn search(&self, query: &str, opts: &SearchOptions) -> Vec<Track> {
        let query = query.to_lowercase();

        let mut results: Vec<Track> = {
            let tracks = self.tracks.read().unwrap();
            tracks
                .values()
                .filter(|track| matches_query(track, &query, &opts.fields))
                .cloned()
                .collect()
        };

        sort_tracks(&mut results, opts.query.sort_by, opts.query.sort_order);
        paginate(results, opts.query.offset, opts.query.limit)
    }

    /// Tracks of one album, in (disc number, track number) order — the
    /// ordering a "play album" consumer depends on.
    pub fn find_by_album(&self, album_id: &str) -> Vec<Track> {
        let mut results: Vec<Track> = {
            let tracks = self.tracks.read().unwrap();
            tracks
                .values()
                .filter(|track| track.album_id == album_id)
                .cloned()
                .collect()
        };

        results.sort_by(|a, b| {
            (a.disc_number, a.track_number).cmp(&(b.disc_number, b.track_number))
        });
        results
    }

    /// Tracks of one artist, in (album, track number) order.
    pub fn find_by_artist(&self, artist_id: &str) -> Vec<Track> {
        let mut results: Vec<Track> = {
            let tracks = self.tracks.read().unwrap();
            tracks
                .values()
                .filter(|track| track.artist_id == artist_id)
                .cloned()
                .collect()
        };

        results.sort_by(|a, b| {
            (&a.album, a.track_number).cmp(&(&b.album, b.track_number))
        });
        results
    }
}

fn matches_query(track: &Track, query: &str, fields: &[SearchField]) -> bool {
    fields.iter().any(|field| {
        let value = match field {
            SearchField::Title => &track.title,
            SearchField::Artist => &track.artist,
            SearchField::Album => &track.album,
            SearchField::AlbumArtist => &track.album_artist,
            SearchField::Genre => &track.genre,
        };
        value.to_lowercase().contains(query)
    })
}

fn sort_tracks(tracks: &mut [Track], sort_by: SortField, sort_order: SortOrder) {
    tracks.sort_by(|a, b| {
        let ordering = match sort_by {
            SortField::Title => a.title.cmp(&b.title),
            SortField::Artist => a.artist.cmp(&b.artist),
            SortField::Album => a.album.cmp(&b.album),
            SortField::Year => a.year.cmp(&b.year),
            SortField::Duration => a.duration.cmp(&b.duration),
            SortField::AddedAt => a.added_at.cmp(&b.added_at),
        };
        match sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

fn paginate(results: Vec<Track>, offset: usize, limit: usize) -> Vec<Track> {
    if offset >= results.len() {
        return Vec::new();
    }
    let end = if limit == 0 {
        results.len()
    } else {
        (offset + limit).min(results.len())
    };
    results[offset..end].to_vec()
}
