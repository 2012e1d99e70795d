use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use serde_json::Value;
use tracing::{debug, warn};
use urlencoding::encode;

use crate::chapters::resolve_chapters;
use crate::config::ApiConfig;
use crate::extract::{extract_records, extract_suggestions};
use crate::normalize::{FixedRating, Normalizer, RatingDefault, SpreadRating};
use crate::types::{CatalogItem, ChapterList, WatchResult};
use crate::video::{classify_transport, resolve_watch};

const UA: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0 Safari/537.36";

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(UA));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

/// Client for the catalog API. List calls return `Result`; chapter and watch
/// resolution always return a value.
#[derive(Debug, Clone)]
pub struct DramaClient {
    http: reqwest::Client,
    cfg: ApiConfig,
    normalizer: Normalizer<Arc<dyn RatingDefault + Send + Sync>>,
}

impl DramaClient {
    pub fn new(cfg: ApiConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .default_headers(default_headers())
            .timeout(cfg.timeout)
            .redirect(reqwest::redirect::Policy::limited(10));
        if let Some(proxy) = cfg.proxy.as_deref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy).context("invalid DRAMA_HTTP_PROXY")?);
        }
        let http = builder.build().context("failed to build HTTP client")?;
        let ratings: Arc<dyn RatingDefault + Send + Sync> = match cfg.rating_seed {
            Some(seed) => Arc::new(SpreadRating { seed }),
            None => Arc::new(FixedRating::default()),
        };
        Ok(Self { http, cfg, normalizer: Normalizer::with_ratings(ratings) })
    }

    /// Replace the rating given to records that carry none.
    pub fn with_ratings(mut self, ratings: impl RatingDefault + Send + Sync + 'static) -> Self {
        let ratings: Arc<dyn RatingDefault + Send + Sync> = Arc::new(ratings);
        self.normalizer = Normalizer::with_ratings(ratings);
        self
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ApiConfig::from_env())
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{}", self.cfg.base_url, path);
        debug!(%url, "GET");
        let body = self
            .http
            .get(&url)
            .query(&[("lang", self.cfg.lang.as_str())])
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {path} failed"))?
            .error_for_status()
            .with_context(|| format!("GET {path} returned an error status"))?
            .json::<Value>()
            .await
            .with_context(|| format!("GET {path} returned invalid JSON"))?;
        Ok(body)
    }

    async fn list(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<CatalogItem>> {
        let body = self.get_json(path, query).await?;
        let items = self.normalizer.items(&extract_records(&body));
        debug!(path, count = items.len(), "list normalized");
        Ok(items)
    }

    pub async fn for_you(&self, page: u32) -> Result<Vec<CatalogItem>> {
        self.list(&format!("/foryou/{page}"), &[]).await
    }

    pub async fn new_releases(&self, page: u32, page_size: u32) -> Result<Vec<CatalogItem>> {
        self.list(&format!("/new/{page}"), &[("pageSize", page_size.to_string())]).await
    }

    pub async fn ranking(&self, page: u32) -> Result<Vec<CatalogItem>> {
        self.list(&format!("/rank/{page}"), &[]).await
    }

    pub async fn by_category(&self, genre: &str, page: u32, sort: u32) -> Result<Vec<CatalogItem>> {
        let query = [
            ("pageNo", page.to_string()),
            ("genre", genre.to_string()),
            ("sort", sort.to_string()),
        ];
        self.list("/classify", &query).await
    }

    pub async fn search(&self, query: &str, page: u32) -> Result<Vec<CatalogItem>> {
        self.list(&format!("/search/{}/{page}", encode(query.trim())), &[]).await
    }

    pub async fn suggestions(&self, query: &str) -> Result<Vec<String>> {
        let body = self.get_json(&format!("/suggest/{}", encode(query.trim())), &[]).await?;
        Ok(extract_suggestions(&body))
    }

    pub async fn chapters(&self, book_id: &str) -> ChapterList {
        match self.get_json(&format!("/chapters/{}", encode(book_id)), &[]).await {
            Ok(body) => {
                let list = resolve_chapters(book_id, &body);
                debug!(book_id, count = list.chapters.len(), total = list.total, "chapters resolved");
                list
            }
            Err(e) => {
                warn!(book_id, error = %format!("{e:#}"), "chapters request failed");
                ChapterList::empty(book_id, format!("{e:#}"))
            }
        }
    }

    pub async fn watch(&self, book_id: &str, chapter: u32) -> WatchResult {
        let path = format!("/watch/{}/{chapter}", encode(book_id));
        match self.get_json(&path, &[("source", self.cfg.watch_source.clone())]).await {
            Ok(body) => resolve_watch(book_id, chapter, &body),
            Err(e) => {
                let class = classify_transport(&e);
                warn!(book_id, chapter, error = %format!("{e:#}"), class = class.code(), "watch request failed");
                WatchResult::failed(book_id, chapter, class)
            }
        }
    }

    /// Look a title up by identity across search, for-you and new releases.
    /// A failing source is skipped.
    pub async fn find_item(&self, book_id: &str) -> Option<CatalogItem> {
        for source in 0..3 {
            let found = match source {
                0 => self.search(book_id, 1).await,
                1 => self.for_you(1).await,
                _ => self.new_releases(1, 50).await,
            };
            match found {
                Ok(items) => {
                    if let Some(item) = items.into_iter().find(|d| d.book_id == book_id) {
                        return Some(item);
                    }
                }
                Err(e) => debug!(source, error = %format!("{e:#}"), "lookup source failed"),
            }
        }
        None
    }
}
