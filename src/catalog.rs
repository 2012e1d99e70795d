//! View-level loading: concurrent section fetches, sample fallbacks and
//! discarding of results whose view is gone.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, warn};

use crate::client::DramaClient;
use crate::sample;
use crate::types::CatalogItem;

const CLOSED: u64 = u64::MAX;

/// Generation counter shared by a view and its in-flight requests.
#[derive(Debug, Clone, Default)]
pub struct Liveness(Arc<AtomicU64>);

/// Proof that a request was started for the current generation of a view.
#[derive(Debug, Clone)]
pub struct Ticket {
    generation: u64,
    live: Liveness,
}

impl Liveness {
    /// Start a request, superseding every earlier ticket.
    pub fn begin(&self) -> Ticket {
        let generation = self
            .0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |g| (g != CLOSED).then(|| g + 1))
            .map(|g| g + 1)
            .unwrap_or(CLOSED);
        Ticket { generation, live: self.clone() }
    }

    /// Tear the view down; nothing may be applied afterwards.
    pub fn close(&self) {
        self.0.store(CLOSED, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.0.load(Ordering::SeqCst) == CLOSED
    }
}

impl Ticket {
    pub fn is_current(&self) -> bool {
        self.generation != CLOSED && self.live.0.load(Ordering::SeqCst) == self.generation
    }
}

/// State owned by one mounted view.
#[derive(Debug, Default)]
pub struct ViewState<T> {
    live: Liveness,
    value: Option<T>,
}

impl<T> ViewState<T> {
    pub fn new() -> Self {
        Self { live: Liveness::default(), value: None }
    }

    pub fn liveness(&self) -> Liveness {
        self.live.clone()
    }

    pub fn begin(&self) -> Ticket {
        self.live.begin()
    }

    /// Store `value` if `ticket` still belongs to this view's latest request.
    pub fn apply(&mut self, ticket: &Ticket, value: T) -> bool {
        if !ticket.is_current() {
            debug!("stale result discarded");
            return false;
        }
        self.value = Some(value);
        true
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn teardown(&mut self) {
        self.live.close();
        self.value = None;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub items: Vec<CatalogItem>,
    pub from_sample: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Section {
    /// Upstream items, or `fallback()` when the call failed or came back empty.
    pub fn or_sample(name: &str, result: Result<Vec<CatalogItem>>, fallback: impl FnOnce() -> Vec<CatalogItem>) -> Self {
        match result {
            Ok(items) if !items.is_empty() => Section { items, from_sample: false, error: None },
            Ok(_) => {
                debug!(section = name, "empty upstream list, using samples");
                Section { items: fallback(), from_sample: true, error: None }
            }
            Err(e) => {
                warn!(section = name, error = %format!("{e:#}"), "list request failed, using samples");
                Section { items: fallback(), from_sample: true, error: Some(format!("{e:#}")) }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Home {
    pub for_you: Section,
    pub new_releases: Section,
    pub trending: Section,
}

/// Fetch the three home sections concurrently. Each section settles on its
/// own, so one failing source does not blank the others.
pub async fn load_home(client: &DramaClient) -> Home {
    let (for_you, new_releases, trending) =
        tokio::join!(client.for_you(1), client.new_releases(1, 12), client.for_you(2));
    Home {
        for_you: Section::or_sample("for_you", for_you, sample::items),
        new_releases: Section::or_sample("new", new_releases, || sample::slice(0, 12)),
        trending: Section::or_sample("trending", trending, || sample::slice(6, 12)),
    }
}

/// Load the home view into `view`; `false` when the view moved on meanwhile.
pub async fn refresh_home(client: &DramaClient, view: &mut ViewState<Home>) -> bool {
    let ticket = view.begin();
    let home = load_home(client).await;
    view.apply(&ticket, home)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub query: String,
    #[serde(flatten)]
    pub section: Section,
}

/// Page size used when a search asks for the newest titles.
pub const NEW_QUERY_PAGE_SIZE: u32 = 24;

/// Search upstream, falling back to matching sample titles. The query "new"
/// (any case) lists the newest titles instead.
pub async fn search(client: &DramaClient, query: &str, page: u32) -> SearchOutcome {
    let query = query.trim();
    let section = if query.eq_ignore_ascii_case("new") {
        match client.new_releases(1, NEW_QUERY_PAGE_SIZE).await {
            Ok(items) if items.is_empty() => Section {
                items: sample::slice(0, NEW_QUERY_PAGE_SIZE as usize),
                from_sample: true,
                error: Some("No new titles found".to_string()),
            },
            other => Section::or_sample("search:new", other, || sample::slice(0, NEW_QUERY_PAGE_SIZE as usize)),
        }
    } else {
        match client.search(query, page).await {
            Ok(items) if items.is_empty() => Section {
                items: sample::search(query),
                from_sample: true,
                error: Some(format!("No results for \"{}\"", query)),
            },
            other => Section::or_sample("search", other, || sample::search(query)),
        }
    };
    SearchOutcome { query: query.to_string(), section }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn newer_ticket_supersedes_older() {
        let mut view: ViewState<u32> = ViewState::new();
        let first = view.begin();
        let second = view.begin();
        assert!(!view.apply(&first, 1));
        assert!(view.apply(&second, 2));
        assert_eq!(view.get(), Some(&2));
    }

    #[test]
    fn teardown_discards_in_flight_results() {
        let mut view: ViewState<&str> = ViewState::new();
        let ticket = view.begin();
        view.teardown();
        assert!(view.liveness().is_closed());
        assert!(!view.apply(&ticket, "late"));
        assert!(view.get().is_none());
        assert!(!view.begin().is_current());
    }

    #[test]
    fn section_fallbacks() {
        let ok = Section::or_sample("t", Ok(sample::slice(0, 1)), Vec::new);
        assert!(!ok.from_sample);
        assert_eq!(ok.items.len(), 1);

        let empty = Section::or_sample("t", Ok(Vec::new()), || sample::slice(0, 3));
        assert!(empty.from_sample);
        assert_eq!(empty.items.len(), 3);
        assert!(empty.error.is_none());

        let failed = Section::or_sample("t", Err(anyhow::anyhow!("boom")), sample::items);
        assert!(failed.from_sample);
        assert_eq!(failed.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn home_sections_settle_independently() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/foryou/1");
            then.status(200).json_body(json!({"success": true, "data": {"list": [{"bookId": "f1"}]}}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/new/1");
            then.status(500);
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/foryou/2");
            then.status(200).json_body(json!({"success": true, "data": {"list": []}}));
        });
        let client = DramaClient::new(ApiConfig::default().with_base_url(server.url("/api"))).unwrap();

        let mut view = ViewState::new();
        assert!(refresh_home(&client, &mut view).await);
        let home = view.get().unwrap();
        assert_eq!(home.for_you.items[0].book_id, "f1");
        assert!(!home.for_you.from_sample);
        assert!(home.new_releases.from_sample);
        assert_eq!(home.new_releases.items.len(), 12);
        assert!(home.new_releases.error.is_some());
        assert!(home.trending.from_sample);
        assert_eq!(home.trending.items[0].book_id, "42000000726");
    }

    #[tokio::test]
    async fn empty_search_uses_filtered_samples() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/search/princess/1");
            then.status(200).json_body(json!({"success": true, "data": {"list": []}}));
        });
        let client = DramaClient::new(ApiConfig::default().with_base_url(server.url("/api"))).unwrap();

        let out = search(&client, "princess", 1).await;
        assert!(out.section.from_sample);
        assert_eq!(out.section.items.len(), 2);
        assert_eq!(out.section.error.as_deref(), Some("No results for \"princess\""));
    }

    #[tokio::test]
    async fn failed_search_uses_filtered_samples_with_error() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/search/romance/1");
            then.status(500);
        });
        let client = DramaClient::new(ApiConfig::default().with_base_url(server.url("/api"))).unwrap();

        let out = search(&client, "romance", 1).await;
        mock.assert();
        assert!(out.section.from_sample);
        assert_eq!(out.section.items.len(), 5);
        assert!(out.section.items.iter().all(|i| i.genre == "Romance" || i.description.to_lowercase().contains("romance")));
        assert!(out.section.error.as_deref().is_some_and(|e| e.contains("500")));
    }

    #[tokio::test]
    async fn new_query_lists_newest_titles() {
        let server = MockServer::start();
        let new_mock = server.mock(|when, then| {
            when.method(GET).path("/api/new/1").query_param("pageSize", "24");
            then.status(200).json_body(json!({"success": true, "data": {"list": [{"bookId": "n1"}, {"bookId": "n2"}]}}));
        });
        let search_mock = server.mock(|when, then| {
            when.method(GET).path("/api/search/New/1");
            then.status(200).json_body(json!({"success": true, "data": {"list": []}}));
        });
        let client = DramaClient::new(ApiConfig::default().with_base_url(server.url("/api"))).unwrap();

        let out = search(&client, " New ", 1).await;
        new_mock.assert();
        search_mock.assert_hits(0);
        assert_eq!(out.query, "New");
        assert!(!out.section.from_sample);
        assert_eq!(out.section.items.len(), 2);
    }

    #[tokio::test]
    async fn empty_new_query_falls_back_to_samples() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/new/1");
            then.status(200).json_body(json!({"success": true, "data": {"list": []}}));
        });
        let client = DramaClient::new(ApiConfig::default().with_base_url(server.url("/api"))).unwrap();

        let out = search(&client, "new", 1).await;
        assert!(out.section.from_sample);
        assert_eq!(out.section.items.len(), 12);
        assert_eq!(out.section.error.as_deref(), Some("No new titles found"));
    }
}
