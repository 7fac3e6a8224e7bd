//! Listing endpoints that span several pages.
//!
//! Versioned Auth0 APIs (`.../api/v2`) page their collections. The first page
//! is fetched with `include_totals=true`; if the reported `total` exceeds one
//! page, the remaining pages are fetched concurrently by a small worker pool
//! and merged in page order. Every page request goes through the client's
//! requester, so the per-route rate limiter paces the fan-out.

use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::Arc,
};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::{sync::mpsc, task::JoinSet};

use crate::{
    client::{Client, with_headers},
    error::{TransportError, TransportResult},
    transport::Request,
};

/// Pagination settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingConfig {
    /// Items requested per page. Auth0 caps this at 100.
    pub page_size: usize,
    /// Concurrent page fetches once the first page is known.
    pub workers: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            workers: 2,
        }
    }
}

type PageJob = (usize, String);

impl Client {
    /// GET every page of `endpoint` and decode the merged items into `T`.
    ///
    /// Against an unversioned API base the endpoint is fetched once and the
    /// body is decoded as is. An empty body decodes as an empty list on
    /// either kind of base.
    pub async fn get_paged<T: DeserializeOwned>(&self, endpoint: &str) -> TransportResult<T> {
        self.get_paged_with_headers(endpoint, &HashMap::new()).await
    }

    /// [`get_paged`](Self::get_paged) with extra headers on every page request.
    pub async fn get_paged_with_headers<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        headers: &HashMap<String, String>,
    ) -> TransportResult<T> {
        let url = self.url(endpoint);

        if !is_versioned_api(self.api()) {
            let value = self.get_value(&url, headers).await?;
            return convert(value.unwrap_or_else(|| Value::Array(Vec::new())));
        }

        let page_size = self.paging.page_size.max(1);
        let key = extract_key(&url)?;
        let first = self
            .get_value(&add_paging_params(&url, 0, page_size)?, headers)
            .await?;
        let (total, mut items) = split_page(first, &key);

        if total <= page_size {
            return convert(Value::Array(items));
        }

        let pages = total.div_ceil(page_size);
        let jobs = (1..pages)
            .map(|page| add_paging_params(&url, page, page_size).map(|u| (page, u)))
            .collect::<TransportResult<Vec<PageJob>>>()?;

        tracing::debug!(
            endpoint = %endpoint,
            total = total,
            pages = pages,
            "Fetching remaining pages"
        );

        for (_, page_items) in self.fan_out(jobs, headers, &key).await? {
            items.extend(page_items);
        }
        convert(Value::Array(items))
    }

    /// Number of records behind `endpoint`, from a one-item page.
    pub async fn count(&self, endpoint: &str) -> TransportResult<u64> {
        self.count_with_headers(endpoint, &HashMap::new()).await
    }

    /// [`count`](Self::count) with extra headers.
    pub async fn count_with_headers(
        &self,
        endpoint: &str,
        headers: &HashMap<String, String>,
    ) -> TransportResult<u64> {
        let url = add_paging_params(&self.url(endpoint), 0, 1)?;
        match self.get_value(&url, headers).await? {
            Some(Value::Object(map)) => total_of(&map)
                .ok_or_else(|| TransportError::unexpected(&url, "no total record count returned")),
            _ => Err(TransportError::unexpected(&url, "unable to process response")),
        }
    }

    async fn get_value(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> TransportResult<Option<Value>> {
        self.execute(with_headers(Request::get(url), headers)).await
    }

    /// Fetch `jobs` with a bounded pool and return the items keyed by page.
    ///
    /// The first failure wins: the queue is emptied, remaining workers are
    /// detached and their results dropped.
    async fn fan_out(
        &self,
        jobs: Vec<PageJob>,
        headers: &HashMap<String, String>,
        key: &str,
    ) -> TransportResult<BTreeMap<usize, Vec<Value>>> {
        let job_count = jobs.len();
        let queue = Arc::new(Mutex::new(VecDeque::from(jobs)));
        let (tx, mut rx) = mpsc::channel(job_count.max(1));
        let mut workers = JoinSet::new();

        for _ in 0..self.paging.workers.clamp(1, job_count.max(1)) {
            let queue = Arc::clone(&queue);
            let tx = tx.clone();
            let client = self.clone();
            let headers = headers.clone();
            workers.spawn(async move {
                while let Some((page, url)) = next_job(&queue) {
                    let value = client.get_value(&url, &headers).await?;
                    if tx.send((page, value)).await.is_err() {
                        break;
                    }
                }
                Ok::<(), TransportError>(())
            });
        }
        drop(tx);

        while let Some(joined) = workers.join_next().await {
            let outcome = joined
                .map_err(|e| TransportError::internal(format!("page worker failed: {e}")))
                .and_then(|result| result);
            if let Err(err) = outcome {
                queue.lock().clear();
                workers.detach_all();
                return Err(err);
            }
        }

        let mut pages = BTreeMap::new();
        while let Some((page, value)) = rx.recv().await {
            let (_, items) = split_page(value, key);
            pages.insert(page, items);
        }
        Ok(pages)
    }
}

fn next_job(queue: &Mutex<VecDeque<PageJob>>) -> Option<PageJob> {
    queue.lock().pop_front()
}

/// Total and items of one page. A bare array is taken as the items themselves.
fn split_page(value: Option<Value>, key: &str) -> (usize, Vec<Value>) {
    match value {
        Some(Value::Object(mut map)) => {
            let total = total_of(&map)
                .and_then(|t| usize::try_from(t).ok())
                .unwrap_or(0);
            let items = match map.remove(key) {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };
            (total, items)
        }
        Some(Value::Array(items)) => (items.len(), items),
        _ => (0, Vec::new()),
    }
}

/// The `total` field as a record count. Integral floats such as `52.0` count.
fn total_of(map: &Map<String, Value>) -> Option<u64> {
    let total = map.get("total")?;
    total.as_u64().or_else(|| {
        total
            .as_f64()
            .filter(|t| t.is_finite() && *t >= 0.0 && t.fract() == 0.0 && *t <= u64::MAX as f64)
            .map(|t| t as u64)
    })
}

fn convert<T: DeserializeOwned>(value: Value) -> TransportResult<T> {
    serde_json::from_value(value).map_err(|e| TransportError::unmarshal(e, None))
}

/// Whether the base path ends in a version segment such as `v2`.
pub fn is_versioned_api(api: &str) -> bool {
    let last = api.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
    last.strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// The JSON field holding a page's items: the last path segment, `-` as `_`.
pub fn extract_key(url: &str) -> TransportResult<String> {
    let parsed = url::Url::parse(url)
        .map_err(|e| TransportError::request(format!("invalid URL {url}: {e}")))?;
    let last = parsed.path().rsplit('/').next().unwrap_or_default();
    Ok(last.replace('-', "_"))
}

/// Set `page`, `per_page` and `include_totals=true`, keeping other parameters.
pub fn add_paging_params(url: &str, page: usize, per_page: usize) -> TransportResult<String> {
    let mut parsed = url::Url::parse(url)
        .map_err(|e| TransportError::request(format!("invalid URL {url}: {e}")))?;
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !matches!(k.as_ref(), "page" | "per_page" | "include_totals"))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    parsed
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("page", &page.to_string())
        .append_pair("per_page", &per_page.to_string())
        .append_pair("include_totals", "true");
    Ok(parsed.into())
}
