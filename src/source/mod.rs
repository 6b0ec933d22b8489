//! Source contract: the uniform interface every track source implements,
//! plus the model types that cross it.

mod browsing;
mod models;
mod trait_def;

pub use browsing::{DirectoryBrowser, FileNode};
pub use models::{
    album_id, artist_id, track_id, AlbumSummary, ArtistSummary, SourceType, Track,
    UNKNOWN_ALBUM, UNKNOWN_ARTIST,
};
pub use trait_def::{
    QueryOptions, ScanProgress, SearchField, SearchOptions, SortField, SortOrder, TrackSource,
};
