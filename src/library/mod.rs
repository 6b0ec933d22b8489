//! Library aggregation across registered sources.

mod manager;

pub use manager::{LibraryManager, SourceInfo};
