//! Turns `/watch` responses and transport failures into `WatchResult`s.

use serde_json::Value;
use tracing::{debug, warn};

use crate::pick::{self, Accessor};
use crate::types::{QualityVariant, WatchError, WatchResult};

/// Hosts and container tokens that mark a URL as directly playable.
pub const PLAYABLE_SIGNATURES: [&str; 5] = ["dramaboxdb.com", "dramacool", "vidstream", "mp4", "m3u8"];

const VIDEO_URL: &[Accessor<String>] = &[|r| pick::text(r, &["videoUrl"]), |r| pick::text(r, &["url"])];

const DESCRIPTION: &[Accessor<String>] =
    &[|r| pick::text(r, &["description"]), |r| pick::text(r, &["introduction"])];

pub fn is_playable_url(url: &str) -> bool {
    PLAYABLE_SIGNATURES.iter().any(|sig| url.contains(sig))
}

/// Classification from an error message alone.
pub fn classify_message(message: &str) -> WatchError {
    if message.contains("404") {
        WatchError::NotFound
    } else if message.contains("CORS") {
        WatchError::CorsError
    } else if message.contains("timeout") {
        WatchError::Timeout
    } else {
        WatchError::NetworkError
    }
}

/// Classification of a failed request. reqwest's own timeout and status
/// information is consulted before the message.
pub fn classify_transport(err: &anyhow::Error) -> WatchError {
    for cause in err.chain() {
        if let Some(re) = cause.downcast_ref::<reqwest::Error>() {
            if re.is_timeout() {
                return WatchError::Timeout;
            }
            if re.status().map(|s| s.as_u16()) == Some(404) {
                return WatchError::NotFound;
            }
        }
    }
    classify_message(&format!("{err:#}"))
}

/// Offered variants, best first. Labels without a number rank as 0.
pub fn quality_variants(data: &Value) -> Vec<QualityVariant> {
    let mut variants: Vec<QualityVariant> = pick::array(data, &["qualities"])
        .map(|arr| {
            arr.iter()
                .map(|q| QualityVariant {
                    quality: pick::text(q, &["quality"]).unwrap_or_default(),
                    value: pick::uint(q, &["quality"]).unwrap_or(0),
                    url: pick::text(q, &["url"]),
                })
                .collect()
        })
        .unwrap_or_default();
    variants.sort_by(|a, b| b.value.cmp(&a.value));
    variants
}

/// Resolve a `/watch` envelope for `book_id` / `chapter`. Never fails.
pub fn resolve_watch(book_id: &str, chapter: u32, envelope: &Value) -> WatchResult {
    let ok = envelope.get("success").and_then(Value::as_bool) == Some(true);
    let data = match envelope.get("data") {
        Some(d) if ok && pick::truthy(d, &[]) => d,
        _ => {
            warn!(book_id, chapter, "no video data in watch response");
            return WatchResult::failed(book_id, chapter, WatchError::NoVideoData);
        }
    };

    let mut url = pick::resolve(data, VIDEO_URL);
    let mut is_video_valid = url.as_deref().is_some_and(is_playable_url);
    if let Some(u) = url.as_deref().filter(|_| !is_video_valid) {
        let head: String = u.chars().take(50).collect();
        warn!(url = %head, "video URL does not look playable");
    }

    let qualities = quality_variants(data);
    let mut selected_quality = None;
    if let Some(best) = qualities.first() {
        if best.url.is_some() {
            url = best.url.clone();
        }
        is_video_valid = true;
        selected_quality = Some(best.quality.clone());
        debug!(quality = %best.quality, offered = qualities.len(), "quality variant selected");
    }

    let chapter_index = pick::uint(data, &["chapterIndex"]).filter(|i| *i > 0).unwrap_or(chapter);
    WatchResult {
        url,
        is_video_valid,
        selected_quality,
        title: pick::text(data, &["title"]).unwrap_or_else(|| format!("Episode {}", chapter.saturating_add(1))),
        description: pick::resolve(data, DESCRIPTION),
        duration: pick::text(data, &["duration"]),
        qualities,
        book_id: pick::text(data, &["bookId"]).unwrap_or_else(|| book_id.to_string()),
        chapter_index,
        next_chapter: chapter_index.saturating_add(1),
        has_next: pick::at(data, &["hasNext"]) != Some(&Value::Bool(false)),
        cover: pick::text(data, &["cover"]),
        success: true,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WatchState;
    use serde_json::json;

    #[test]
    fn highest_quality_variant_wins() {
        let env = json!({"success": true, "data": {
            "videoUrl": "https://example.com/page",
            "qualities": [
                {"quality": 480, "url": "https://cdn/480.mp4"},
                {"quality": 1080, "url": "https://cdn/1080.mp4"},
                {"quality": 720, "url": "https://cdn/720.mp4"}
            ]
        }});
        let r = resolve_watch("b", 0, &env);
        assert_eq!(r.url.as_deref(), Some("https://cdn/1080.mp4"));
        assert_eq!(r.selected_quality.as_deref(), Some("1080"));
        assert!(r.is_video_valid);
        assert_eq!(r.qualities.iter().map(|q| q.value).collect::<Vec<_>>(), vec![1080, 720, 480]);
        assert_eq!(r.state(), WatchState::Succeeded);
    }

    #[test]
    fn variants_force_validity_and_keep_url_without_variant_url() {
        let env = json!({"success": true, "data": {
            "url": "https://unknown.host/stream",
            "qualities": [{"quality": "HD"}, {"quality": "540p"}]
        }});
        let r = resolve_watch("b", 0, &env);
        assert!(r.is_video_valid);
        assert_eq!(r.selected_quality.as_deref(), Some("540p"));
        assert_eq!(r.url.as_deref(), Some("https://unknown.host/stream"));
    }

    #[test]
    fn url_signature_check() {
        let env = json!({"success": true, "data": {"videoUrl": "https://v.dramaboxdb.com/x/1.m3u8"}});
        let r = resolve_watch("b", 2, &env);
        assert!(r.is_video_valid);
        assert!(r.success);
        assert!(r.error.is_none());
        assert_eq!(r.title, "Episode 3");
        assert_eq!(r.next_chapter, 3);
        assert!(r.has_next);

        let env = json!({"success": true, "data": {"videoUrl": "https://example.com/watch?id=1"}});
        let r = resolve_watch("b", 0, &env);
        assert!(!r.is_video_valid);
        assert!(r.success);
        assert_eq!(r.state(), WatchState::SucceededButInvalid);

        let env = json!({"success": true, "data": {"title": "No url"}});
        let r = resolve_watch("b", 0, &env);
        assert!(!r.is_video_valid);
        assert_eq!(r.url, None);
        assert_eq!(r.title, "No url");
    }

    #[test]
    fn huge_chapter_index_resolves() {
        let env = json!({"success": true, "data": {"url": "x.mp4"}});
        let r = resolve_watch("b", u32::MAX, &env);
        assert!(r.success);
        assert_eq!(r.title, format!("Episode {}", u32::MAX));
        assert_eq!(r.next_chapter, u32::MAX);

        let r = resolve_watch("b", u32::MAX, &json!({"success": false}));
        assert_eq!(r.error, Some(WatchError::NoVideoData));
    }

    #[test]
    fn unsuccessful_envelope_is_no_video_data() {
        for env in [
            json!({"success": false, "data": {"videoUrl": "a.mp4"}}),
            json!({"success": true}),
            json!({"success": true, "data": null}),
            json!({}),
        ] {
            let r = resolve_watch("b", 1, &env);
            assert!(!r.is_video_valid);
            assert!(!r.success);
            assert_eq!(r.error, Some(WatchError::NoVideoData));
            assert_eq!(r.title, "Episode 2");
        }
    }

    #[test]
    fn descriptive_fields_fall_back() {
        let env = json!({"success": true, "data": {
            "videoUrl": "x.mp4",
            "introduction": "intro",
            "bookId": "real-id",
            "chapterIndex": 4,
            "hasNext": false,
            "duration": "01:02",
            "cover": "c.jpg"
        }});
        let r = resolve_watch("asked", 0, &env);
        assert_eq!(r.description.as_deref(), Some("intro"));
        assert_eq!(r.book_id, "real-id");
        assert_eq!(r.chapter_index, 4);
        assert_eq!(r.next_chapter, 5);
        assert!(!r.has_next);
        assert_eq!(r.duration.as_deref(), Some("01:02"));
        assert_eq!(r.cover.as_deref(), Some("c.jpg"));
    }

    #[test]
    fn messages_classify_in_order() {
        assert_eq!(classify_message("Request failed with status code 404"), WatchError::NotFound);
        assert_eq!(classify_message("blocked by CORS policy"), WatchError::CorsError);
        assert_eq!(classify_message("timeout of 15000ms exceeded"), WatchError::Timeout);
        assert_eq!(classify_message("connection refused"), WatchError::NetworkError);
        assert_eq!(classify_message("404 after timeout"), WatchError::NotFound);
    }

    #[test]
    fn anyhow_chain_is_searched() {
        let err = anyhow::anyhow!("read timeout").context("watch request failed");
        assert_eq!(classify_transport(&err), WatchError::Timeout);
        let err = anyhow::anyhow!("dns error");
        assert_eq!(classify_transport(&err), WatchError::NetworkError);
    }
}
