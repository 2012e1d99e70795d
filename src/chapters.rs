//! Episode lists: finding the chapter array in a `/chapters` envelope and
//! turning it into ordered `Chapter` records.

use regex::Regex;
use serde_json::{json, Value};
use tracing::debug;

use crate::pick::{self, Accessor};
use crate::types::{Chapter, ChapterList};

/// Depth limit for the chapter-array scan.
pub const MAX_SCAN_DEPTH: usize = 8;
/// Upper bound on JSON nodes the scan may visit.
pub const MAX_SCAN_NODES: usize = 10_000;

const CHAPTER_KEYS: [&str; 4] = ["chapterIndex", "chapterNo", "title", "episode"];

/// Minutes assumed for a chapter whose duration is missing or unreadable.
const DEFAULT_MINUTES: u32 = 24;

struct Source {
    name: &'static str,
    find: fn(&Value) -> Option<Vec<Value>>,
}

fn non_empty(arr: Option<&Vec<Value>>) -> Option<Vec<Value>> {
    arr.filter(|a| !a.is_empty()).cloned()
}

fn direct_list(data: &Value) -> Option<Vec<Value>> {
    non_empty(pick::array(data, &["list"]))
}

/// Theater payloads only carry titles; ordinals come from position.
fn theater_titles(data: &Value) -> Option<Vec<Value>> {
    let columns = pick::array(data, &["raw", "data", "theater", "columnVoList"])?;
    if columns.is_empty() {
        return None;
    }
    Some(
        columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                json!({
                    "chapterIndex": i,
                    "chapterNo": i + 1,
                    "title": pick::text(col, &["title"]).unwrap_or_else(|| format!("Episode {}", i + 1)),
                    "duration": null,
                    "isFree": true,
                })
            })
            .collect(),
    )
}

fn raw_data_array(data: &Value) -> Option<Vec<Value>> {
    non_empty(pick::array(data, &["raw", "data", "data"]))
}

fn scanned(data: &Value) -> Option<Vec<Value>> {
    let mut scan = Scan::default();
    scan.visit(data, 0);
    debug!(visited = scan.visited, candidates = scan.candidates, "chapter scan finished");
    scan.best.cloned()
}

const SOURCES: &[Source] = &[
    Source { name: "data.list", find: direct_list },
    Source { name: "data.raw.data.theater.columnVoList", find: theater_titles },
    Source { name: "data.raw.data.data", find: raw_data_array },
    Source { name: "scan", find: scanned },
];

fn looks_like_chapters(arr: &[Value]) -> bool {
    arr.first()
        .and_then(Value::as_object)
        .is_some_and(|first| CHAPTER_KEYS.iter().any(|k| first.contains_key(*k)))
}

/// Bounded depth-first search for the longest chapter-like array. Only
/// objects are descended into; other arrays are neither walked nor counted
/// beyond their own node.
#[derive(Default)]
struct Scan<'a> {
    visited: usize,
    candidates: usize,
    best: Option<&'a Vec<Value>>,
}

impl<'a> Scan<'a> {
    fn visit(&mut self, node: &'a Value, depth: usize) {
        let Value::Object(map) = node else { return };
        if depth > MAX_SCAN_DEPTH {
            return;
        }
        for child in map.values() {
            if self.visited >= MAX_SCAN_NODES {
                return;
            }
            self.visited += 1;
            match child {
                Value::Array(arr) if looks_like_chapters(arr) => {
                    self.candidates += 1;
                    if self.best.map_or(true, |b| arr.len() > b.len()) {
                        self.best = Some(arr);
                    }
                }
                Value::Object(_) => self.visit(child, depth + 1),
                _ => {}
            }
        }
    }
}

const CHAPTER_NO: &[Accessor<u32>] = &[
    |r| pick::uint(r, &["chapterNo"]).filter(|n| *n > 0),
    |r| pick::uint(r, &["episode"]).filter(|n| *n > 0),
];

const CHAPTER_TITLE: &[Accessor<String>] = &[|r| pick::text(r, &["title"]), |r| pick::text(r, &["chapterTitle"])];

const CHAPTER_COVER: &[Accessor<String>] = &[|r| pick::text(r, &["cover"]), |r| pick::text(r, &["image"])];

pub fn normalize_chapter(raw: &Value, position: usize) -> Chapter {
    let position = u32::try_from(position).unwrap_or(u32::MAX);
    let chapter_index = pick::uint(raw, &["chapterIndex"]).unwrap_or(position);
    Chapter {
        chapter_index,
        chapter_no: pick::resolve_or_else(raw, CHAPTER_NO, || chapter_index.saturating_add(1)),
        title: pick::resolve_or_else(raw, CHAPTER_TITLE, || format!("Episode {}", position.saturating_add(1))),
        duration: pick::text(raw, &["duration"]),
        is_free: pick::at(raw, &["isFree"]) != Some(&Value::Bool(false)),
        is_locked: pick::truthy(raw, &["isLocked"]),
        cover: pick::resolve(raw, CHAPTER_COVER),
        play_count: pick::text(raw, &["playCount"]),
    }
}

/// Normalized chapters ordered by ordinal; later duplicates of an ordinal are dropped.
pub fn normalize_chapters(raws: &[Value]) -> Vec<Chapter> {
    let mut chapters: Vec<Chapter> = raws.iter().enumerate().map(|(i, c)| normalize_chapter(c, i)).collect();
    chapters.sort_by_key(|c| c.chapter_index);
    let before = chapters.len();
    chapters.dedup_by_key(|c| c.chapter_index);
    if chapters.len() != before {
        debug!(dropped = before - chapters.len(), "duplicate chapter ordinals dropped");
    }
    chapters
}

/// Resolve a `/chapters` envelope. Never fails; an unusable envelope yields an
/// empty list with `error` set.
pub fn resolve_chapters(book_id: &str, envelope: &Value) -> ChapterList {
    let ok = envelope.get("success").and_then(Value::as_bool) == Some(true);
    let data = match envelope.get("data") {
        Some(d) if ok && pick::truthy(d, &[]) => d,
        _ => return ChapterList::empty(book_id, "No successful response"),
    };

    let raws = SOURCES
        .iter()
        .find_map(|s| (s.find)(data).map(|found| (s.name, found)))
        .map(|(name, found)| {
            debug!(source = name, count = found.len(), "chapter array located");
            found
        })
        .unwrap_or_default();

    let chapters = normalize_chapters(&raws);
    let len = u32::try_from(chapters.len()).unwrap_or(u32::MAX);
    ChapterList {
        book_id: book_id.to_string(),
        total: pick::uint(data, &["total"]).filter(|t| *t > 0).unwrap_or(len),
        has_more: pick::truthy(data, &["isMore"]),
        has_chapters: !chapters.is_empty(),
        chapters,
        error: None,
    }
}

/// Indices at or past the end restart at the first chapter.
pub fn clamp_chapter(index: u32, total: u32) -> u32 {
    if total > 0 && index >= total {
        0
    } else {
        index
    }
}

impl ChapterList {
    pub fn next(&self, current: u32) -> Option<u32> {
        (current.saturating_add(1) < self.total).then(|| current + 1)
    }

    pub fn previous(&self, current: u32) -> Option<u32> {
        current.checked_sub(1)
    }

    pub fn free_count(&self) -> usize {
        self.chapters.iter().filter(|c| c.is_free && !c.is_locked).count()
    }

    pub fn locked_count(&self) -> usize {
        self.chapters.iter().filter(|c| c.is_locked).count()
    }

    /// Rounded mean episode length in minutes.
    pub fn average_duration_minutes(&self) -> u32 {
        if self.chapters.is_empty() {
            return DEFAULT_MINUTES;
        }
        let total: u64 = self
            .chapters
            .iter()
            .map(|c| c.duration.as_deref().and_then(duration_seconds).unwrap_or(DEFAULT_MINUTES * 60) as u64)
            .sum();
        let avg = total as f64 / self.chapters.len() as f64;
        (avg / 60.0).round() as u32
    }
}

/// Seconds in a "mm:ss" duration or a bare seconds count.
pub fn duration_seconds(s: &str) -> Option<u32> {
    let s = s.trim();
    if let Some(caps) = Regex::new(r"(\d+):(\d+)").ok()?.captures(s) {
        let m = caps.get(1)?.as_str().parse::<u32>().ok()?;
        let sec = caps.get(2)?.as_str().parse::<u32>().ok()?;
        return m.checked_mul(60)?.checked_add(sec);
    }
    s.parse::<u32>().ok()
}
