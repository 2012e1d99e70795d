//! Raw catalog records to `CatalogItem`.

use std::sync::Arc;

use serde_json::Value;

use crate::pick::{self, Accessor};
use crate::types::CatalogItem;

pub const FALLBACK_DESCRIPTION: &str = "A Chinese drama with a captivating story";
pub const FALLBACK_GENRE: &str = "Romance";

pub const IDENTITY: &[Accessor<String>] = &[|r| pick::text(r, &["bookId"]), |r| pick::text(r, &["id"])];

pub const TITLE: &[Accessor<String>] = &[
    |r| pick::text(r, &["bookName"]),
    |r| pick::text(r, &["title"]),
    |r| pick::text(r, &["name"]),
];

pub const COVER: &[Accessor<String>] = &[
    |r| pick::text(r, &["cover"]),
    |r| pick::text(r, &["image"]),
    |r| pick::text(r, &["poster"]),
];

pub const DESCRIPTION: &[Accessor<String>] = &[
    |r| pick::text(r, &["introduction"]),
    |r| pick::text(r, &["description"]),
    |r| pick::text(r, &["summary"]),
];

pub const GENRE: &[Accessor<String>] = &[
    |r| first_tag(r),
    |r| pick::text(r, &["genre"]),
    |r| pick::text(r, &["category"]),
];

/// `rating` closes the chain so that an already normalized item keeps its value.
pub const RATING: &[Accessor<f64>] = &[
    |r| pick::number(r, &["rank", "hotCode"]),
    |r| pick::number(r, &["score"]),
    |r| pick::number(r, &["rating"]),
];

pub const RANK: &[Accessor<u32>] = &[
    |r| pick::at(r, &["rank"]).filter(|v| v.is_number()).and_then(|_| pick::uint(r, &["rank"])),
    |r| pick::uint(r, &["rank", "sort"]),
];

fn tags(raw: &Value) -> Vec<String> {
    pick::array(raw, &["tags"])
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn first_tag(raw: &Value) -> Option<String> {
    tags(raw).into_iter().next()
}

/// Supplies the rating of records that carry none.
pub trait RatingDefault: std::fmt::Debug {
    fn rating(&self, index: usize) -> f64;
}

impl<T: RatingDefault + ?Sized> RatingDefault for Arc<T> {
    fn rating(&self, index: usize) -> f64 {
        (**self).rating(index)
    }
}

/// Same rating for every record.
#[derive(Debug, Clone, Copy)]
pub struct FixedRating(pub f64);

impl Default for FixedRating {
    fn default() -> Self {
        FixedRating(8.0)
    }
}

impl RatingDefault for FixedRating {
    fn rating(&self, _index: usize) -> f64 {
        self.0
    }
}

/// Ratings spread over `[7.5, 8.5)` in tenths, reproducible for a given seed.
#[derive(Debug, Clone, Copy)]
pub struct SpreadRating {
    pub seed: u64,
}

impl RatingDefault for SpreadRating {
    fn rating(&self, index: usize) -> f64 {
        // splitmix64 finalizer
        let mut z = self.seed ^ (index as u64).wrapping_add(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        7.5 + (z % 10) as f64 / 10.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer<R = FixedRating> {
    ratings: R,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: RatingDefault> Normalizer<R> {
    pub fn with_ratings(ratings: R) -> Self {
        Self { ratings }
    }

    /// Never fails: every field falls back to a synthesized default.
    pub fn item(&self, raw: &Value, index: usize) -> CatalogItem {
        let genre = pick::resolve_or_else(raw, GENRE, || FALLBACK_GENRE.to_string());
        let mut tags = tags(raw);
        if tags.is_empty() {
            tags.push(genre.clone());
        }
        CatalogItem {
            book_id: pick::resolve_or_else(raw, IDENTITY, || format!("drama-{index}")),
            title: pick::resolve_or_else(raw, TITLE, || format!("Drama {}", index + 1)),
            cover: pick::resolve_or_else(raw, COVER, || {
                format!("https://picsum.photos/300/400?random={}", index + 100)
            }),
            description: pick::resolve_or_else(raw, DESCRIPTION, || FALLBACK_DESCRIPTION.to_string()),
            genre,
            tags,
            rating: pick::resolve_or_else(raw, RATING, || self.ratings.rating(index)),
            play_count: pick::text(raw, &["playCount"]).unwrap_or_else(|| "0".to_string()),
            chapter_count: pick::uint(raw, &["chapterCount"]).unwrap_or(0),
            is_new: pick::truthy(raw, &["corner"]) || pick::truthy(raw, &["isNew"]),
            rank: pick::resolve(raw, RANK),
        }
    }

    pub fn items(&self, raws: &[Value]) -> Vec<CatalogItem> {
        raws.iter().enumerate().map(|(i, raw)| self.item(raw, i)).collect()
    }
}
