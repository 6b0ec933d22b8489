//! Medley library engine
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod error;
pub mod filesystem;
pub mod library;
pub mod source;

// Re-export commonly used types for convenience
pub use error::LibraryError;
pub use library::LibraryManager;
pub use source::{
    QueryOptions, ScanProgress, SearchOptions, SortField, SortOrder, SourceType, Track,
    TrackSource,
};
