use serde::{Deserialize, Serialize};
use std::fmt;

/// A catalog title in the shape every list, search and lookup returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub book_id: String,
    pub title: String,
    pub cover: String,
    pub description: String,
    pub genre: String,
    pub tags: Vec<String>,
    pub rating: f64,
    pub play_count: String,
    pub chapter_count: u32,
    pub is_new: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    /// 0-based ordinal, unique within a `ChapterList`.
    pub chapter_index: u32,
    /// 1-based number shown to the viewer.
    pub chapter_no: u32,
    pub title: String,
    pub duration: Option<String>,
    pub is_free: bool,
    pub is_locked: bool,
    pub cover: Option<String>,
    pub play_count: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterList {
    pub book_id: String,
    #[serde(rename = "list")]
    pub chapters: Vec<Chapter>,
    pub total: u32,
    pub has_more: bool,
    pub has_chapters: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChapterList {
    pub fn empty(book_id: &str, error: impl Into<String>) -> Self {
        Self {
            book_id: book_id.to_string(),
            chapters: Vec::new(),
            total: 0,
            has_more: false,
            has_chapters: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityVariant {
    /// Label as sent upstream, e.g. "1080" or "720p".
    pub quality: String,
    /// Leading number of `quality`, 0 when it has none.
    pub value: u32,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WatchError {
    NotFound,
    NetworkError,
    CorsError,
    Timeout,
    NoVideoData,
    VideoUnavailable,
}

impl WatchError {
    pub fn code(&self) -> &'static str {
        match self {
            WatchError::NotFound => "NOT_FOUND",
            WatchError::NetworkError => "NETWORK_ERROR",
            WatchError::CorsError => "CORS_ERROR",
            WatchError::Timeout => "TIMEOUT",
            WatchError::NoVideoData => "NO_VIDEO_DATA",
            WatchError::VideoUnavailable => "VIDEO_UNAVAILABLE",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            WatchError::NetworkError | WatchError::Timeout => "Connection problem",
            WatchError::NotFound | WatchError::NoVideoData | WatchError::VideoUnavailable => {
                "Episode unavailable"
            }
            WatchError::CorsError => "Server problem",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            WatchError::NotFound => "This episode was not found on the server.",
            WatchError::NetworkError => {
                "Could not connect to the video server. Check your internet connection."
            }
            WatchError::CorsError => "The video server ran into a technical problem.",
            WatchError::Timeout => "The video server did not respond. Please try again later.",
            WatchError::NoVideoData => "No video data is available for this episode.",
            WatchError::VideoUnavailable => "The video is not available.",
        }
    }

    pub fn tips(&self) -> &'static [&'static str] {
        match self {
            WatchError::NetworkError | WatchError::Timeout => &[
                "Check your internet connection",
                "Make sure no network restriction is in place",
                "Retry in a moment",
            ],
            WatchError::NotFound | WatchError::NoVideoData | WatchError::VideoUnavailable => &[
                "The episode may not be released yet",
                "Try another episode",
                "Check back later",
            ],
            WatchError::CorsError => &[
                "The video server may be under maintenance",
                "Retry in a few minutes",
            ],
        }
    }
}

impl fmt::Display for WatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// Outcome of one watch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Succeeded,
    SucceededButInvalid,
    Failed(WatchError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchResult {
    pub url: Option<String>,
    pub is_video_valid: bool,
    pub selected_quality: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub qualities: Vec<QualityVariant>,
    pub book_id: String,
    pub chapter_index: u32,
    pub next_chapter: u32,
    pub has_next: bool,
    pub cover: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<WatchError>,
}

impl WatchResult {
    pub fn failed(book_id: &str, chapter_index: u32, error: WatchError) -> Self {
        Self {
            url: None,
            is_video_valid: false,
            selected_quality: None,
            title: format!("Episode {}", chapter_index.saturating_add(1)),
            description: Some(error.message().to_string()),
            duration: None,
            qualities: Vec::new(),
            book_id: book_id.to_string(),
            chapter_index,
            next_chapter: chapter_index.saturating_add(1),
            has_next: false,
            cover: None,
            success: false,
            error: Some(error),
        }
    }

    pub fn state(&self) -> WatchState {
        match (self.success, self.error) {
            (false, e) => WatchState::Failed(e.unwrap_or(WatchError::VideoUnavailable)),
            (true, _) if self.is_video_valid && self.url.is_some() => WatchState::Succeeded,
            (true, _) => WatchState::SucceededButInvalid,
        }
    }

    /// Playable URL, or the classification to show instead.
    pub fn playable(&self) -> Result<&str, WatchError> {
        match self.state() {
            WatchState::Succeeded => self.url.as_deref().ok_or(WatchError::VideoUnavailable),
            WatchState::SucceededButInvalid => Err(WatchError::VideoUnavailable),
            WatchState::Failed(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_error_serializes_as_upstream_code() {
        let s = serde_json::to_string(&WatchError::NoVideoData).unwrap();
        assert_eq!(s, "\"NO_VIDEO_DATA\"");
        assert_eq!(WatchError::CorsError.code(), "CORS_ERROR");
    }

    #[test]
    fn failed_result_never_plays() {
        let r = WatchResult::failed("42", 2, WatchError::Timeout);
        assert_eq!(r.title, "Episode 3");
        assert_eq!(r.state(), WatchState::Failed(WatchError::Timeout));
        assert_eq!(r.playable(), Err(WatchError::Timeout));
    }

    #[test]
    fn last_representable_chapter_does_not_overflow() {
        let r = WatchResult::failed("42", u32::MAX, WatchError::Timeout);
        assert_eq!(r.title, format!("Episode {}", u32::MAX));
        assert_eq!(r.next_chapter, u32::MAX);
        assert_eq!(r.chapter_index, u32::MAX);
    }

    #[test]
    fn success_without_valid_url_is_unavailable() {
        let mut r = WatchResult::failed("42", 0, WatchError::NoVideoData);
        r.success = true;
        r.error = None;
        r.url = Some("https://example.com/page".into());
        assert_eq!(r.state(), WatchState::SucceededButInvalid);
        assert_eq!(r.playable(), Err(WatchError::VideoUnavailable));

        r.is_video_valid = true;
        assert_eq!(r.playable(), Ok("https://example.com/page"));
    }

    #[test]
    fn empty_chapter_list_carries_reason() {
        let l = ChapterList::empty("7", "No successful response");
        assert!(!l.has_chapters);
        assert_eq!(l.total, 0);
        assert_eq!(l.error.as_deref(), Some("No successful response"));
    }
}
