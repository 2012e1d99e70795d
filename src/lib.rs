//! Catalog client for an episodic short-drama API: list and search titles,
//! resolve episode lists and playable video URLs from loosely shaped JSON.

pub mod catalog;
pub mod chapters;
pub mod client;
pub mod config;
pub mod extract;
pub mod logger;
pub mod normalize;
pub mod pick;
pub mod sample;
pub mod types;
pub mod util;
pub mod video;

pub use client::DramaClient;
pub use types::{CatalogItem, Chapter, ChapterList, QualityVariant, WatchError, WatchResult, WatchState};
