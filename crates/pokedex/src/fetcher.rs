//! Bulk catalog fetch.
//!
//! One tokio task per id. Successful records are appended to the shared
//! `CatalogStore` as they arrive; failures are logged, collected in the
//! `FetchReport` and otherwise skipped, so one bad id never affects the rest
//! of the batch.

use crate::api::RecordSource;
use crate::catalog::CatalogStore;
use crate::error::FetchError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// One id that did not make it into the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub id: u32,
    pub kind: String,
    pub reason: String,
}

impl From<&FetchError> for FetchFailure {
    fn from(err: &FetchError) -> Self {
        Self {
            id: err.id(),
            kind: err.kind().to_string(),
            reason: err.to_string(),
        }
    }
}

/// Outcome of a `fetch_all` batch
#[derive(Debug, Clone, Serialize)]
pub struct FetchReport {
    pub requested: usize,
    pub fetched: usize,
    pub failures: Vec<FetchFailure>,
    pub cancelled: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl FetchReport {
    fn started(requested: usize) -> Self {
        let now = Utc::now();
        Self {
            requested,
            fetched: 0,
            failures: Vec::new(),
            cancelled: 0,
            started_at: now,
            finished_at: now,
        }
    }

    /// Every requested id ended up in the catalog
    pub fn is_complete(&self) -> bool {
        self.fetched == self.requested
    }

    /// Ids that failed, in request order
    pub fn failed_ids(&self) -> Vec<u32> {
        self.failures.iter().map(|f| f.id).collect()
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

enum Outcome {
    Fetched,
    Failed(FetchError),
    Cancelled,
}

/// Populates a `CatalogStore` from a `RecordSource`
pub struct RecordFetcher {
    source: Arc<dyn RecordSource>,
    store: CatalogStore,
    /// In-flight cap; `None` launches every id at once
    limiter: Option<Arc<Semaphore>>,
    max_concurrent: Option<usize>,
    cancel: CancellationToken,
}

impl RecordFetcher {
    /// Create a fetcher that appends into `store`
    pub fn new(source: Arc<dyn RecordSource>, store: CatalogStore) -> Self {
        Self {
            source,
            store,
            limiter: None,
            max_concurrent: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Cap the number of requests in flight (`None` or 0 = unbounded)
    pub fn with_max_concurrent(mut self, max: Option<usize>) -> Self {
        self.max_concurrent = max.filter(|&n| n > 0);
        self.limiter = self.max_concurrent.map(|n| Arc::new(Semaphore::new(n)));
        self
    }

    /// Stop outstanding fetches when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that aborts the batch when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Fetch every id concurrently and append successes to the store.
    ///
    /// Never fails: per-id errors are logged and reported, and the store
    /// simply lacks those entries. Append order follows completion order.
    pub async fn fetch_all(&self, ids: impl IntoIterator<Item = u32>) -> FetchReport {
        let ids: Vec<u32> = ids.into_iter().collect();
        let mut report = FetchReport::started(ids.len());

        info!(
            requested = ids.len(),
            max_concurrent = ?self.max_concurrent,
            "Starting catalog fetch"
        );

        let mut handles = Vec::with_capacity(ids.len());
        for &id in &ids {
            let source = Arc::clone(&self.source);
            let store = self.store.clone();
            let limiter = self.limiter.clone();
            let cancel = self.cancel.clone();

            handles.push(tokio::spawn(async move {
                fetch_one(id, source, store, limiter, cancel).await
            }));
        }

        for (id, handle) in ids.iter().copied().zip(handles) {
            match handle.await {
                Ok(Outcome::Fetched) => report.fetched += 1,
                Ok(Outcome::Failed(e)) => report.failures.push(FetchFailure::from(&e)),
                Ok(Outcome::Cancelled) => report.cancelled += 1,
                Err(e) => {
                    error!(id = id, error = %e, "Fetch task panicked");
                    report.failures.push(FetchFailure {
                        id,
                        kind: "panic".to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        report.finished_at = Utc::now();

        info!(
            requested = report.requested,
            fetched = report.fetched,
            failed = report.failures.len(),
            cancelled = report.cancelled,
            elapsed_ms = report.elapsed_ms(),
            "Catalog fetch complete"
        );

        report
    }
}

async fn fetch_one(
    id: u32,
    source: Arc<dyn RecordSource>,
    store: CatalogStore,
    limiter: Option<Arc<Semaphore>>,
    cancel: CancellationToken,
) -> Outcome {
    let _permit = match limiter {
        Some(semaphore) => tokio::select! {
            biased;
            _ = cancel.cancelled() => return Outcome::Cancelled,
            permit = semaphore.acquire_owned() => match permit {
                Ok(permit) => Some(permit),
                Err(_) => return Outcome::Cancelled,
            },
        },
        None => None,
    };

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!(id = id, "Fetch cancelled");
            return Outcome::Cancelled;
        }
        result = source.fetch(id) => result,
    };

    let record = match result {
        Ok(record) if record.id == id => record,
        Ok(record) => {
            let err = FetchError::Decode {
                id,
                reason: format!("source returned id {}", record.id),
            };
            warn!(id = id, error = %err, "Skipping entry");
            return Outcome::Failed(err);
        }
        Err(e) => {
            warn!(id = id, kind = e.kind(), error = %e, "Skipping entry");
            return Outcome::Failed(e);
        }
    };

    if cancel.is_cancelled() {
        return Outcome::Cancelled;
    }

    store.append(record);
    debug!(id = id, "Fetched entry");
    Outcome::Fetched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::decode_record;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use serde_json::json;
    use shared::Record;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves canned PokeAPI bodies; ids without a body answer 404
    struct FakeSource {
        bodies: HashMap<u32, String>,
        require_thumbnail: bool,
        delay: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeSource {
        fn new(bodies: HashMap<u32, String>) -> Self {
            Self {
                bodies,
                require_thumbnail: true,
                delay: Duration::from_millis(5),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RecordSource for FakeSource {
        async fn fetch(&self, id: u32) -> Result<Record, FetchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            // Later ids answer first so arrival order differs from id order
            let jitter = Duration::from_micros(u64::from(200 - id.min(200)) * 10);
            tokio::time::sleep(self.delay + jitter).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            match self.bodies.get(&id) {
                Some(body) => decode_record(id, body.as_bytes(), self.require_thumbnail),
                None => Err(FetchError::Status {
                    id,
                    status: StatusCode::NOT_FOUND,
                }),
            }
        }
    }

    fn body(id: u32, with_thumbnail: bool) -> String {
        let sprites = if with_thumbnail {
            json!({ "front_default": format!("https://sprites.test/{}.png", id) })
        } else {
            json!({ "back_default": null })
        };
        json!({
            "id": id,
            "name": format!("mon-{}", id),
            "sprites": sprites,
            "types": [{ "slot": 1, "type": { "name": "normal", "url": "" } }],
            "weight": 10
        })
        .to_string()
    }

    fn catalog_with_missing_thumbnail(missing: u32) -> HashMap<u32, String> {
        (1..=151).map(|id| (id, body(id, id != missing))).collect()
    }

    #[tokio::test]
    async fn test_missing_thumbnail_is_skipped() {
        let store = CatalogStore::new();
        let source = Arc::new(FakeSource::new(catalog_with_missing_thumbnail(7)));
        let fetcher = RecordFetcher::new(source, store.clone());

        let report = fetcher.fetch_all(1..=151).await;

        assert_eq!(store.len(), 150);
        assert!(store.get(7).is_none());
        assert_eq!(report.requested, 151);
        assert_eq!(report.fetched, 150);
        assert_eq!(report.failed_ids(), vec![7]);
        assert_eq!(report.failures[0].kind, "decode");
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_missing_thumbnail_kept_when_lenient() {
        let store = CatalogStore::new();
        let mut source = FakeSource::new(catalog_with_missing_thumbnail(7));
        source.require_thumbnail = false;
        let fetcher = RecordFetcher::new(Arc::new(source), store.clone());

        let report = fetcher.fetch_all(1..=151).await;

        assert!(report.is_complete());
        assert_eq!(store.get(7).map(|r| r.thumbnail_url), Some(None));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_records_match_requested_ids() {
        let store = CatalogStore::new();
        let bodies = (1..=151).map(|id| (id, body(id, true))).collect();
        let fetcher = RecordFetcher::new(Arc::new(FakeSource::new(bodies)), store.clone());

        let report = fetcher.fetch_all(1..=151).await;
        assert!(report.is_complete());

        let mut ids: Vec<u32> = store.all().iter().map(|r| r.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=151).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_transport_failures_do_not_abort_batch() {
        let store = CatalogStore::new();
        let bodies = [1, 2, 4].into_iter().map(|id| (id, body(id, true))).collect();
        let fetcher = RecordFetcher::new(Arc::new(FakeSource::new(bodies)), store.clone());

        let report = fetcher.fetch_all(1..=5).await;

        assert_eq!(store.len(), 3);
        assert_eq!(report.failed_ids(), vec![3, 5]);
        assert!(report.failures.iter().all(|f| f.kind == "status"));
    }

    #[tokio::test]
    async fn test_unbounded_by_default() {
        let bodies = (1..=20).map(|id| (id, body(id, true))).collect();
        let source = Arc::new(FakeSource::new(bodies));
        let fetcher = RecordFetcher::new(source.clone(), CatalogStore::new());

        fetcher.fetch_all(1..=20).await;

        assert!(source.max_in_flight.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_cap() {
        let store = CatalogStore::new();
        let bodies = (1..=40).map(|id| (id, body(id, true))).collect();
        let source = Arc::new(FakeSource::new(bodies));
        let fetcher =
            RecordFetcher::new(source.clone(), store.clone()).with_max_concurrent(Some(3));

        let report = fetcher.fetch_all(1..=40).await;

        assert!(report.is_complete());
        assert_eq!(store.len(), 40);
        assert!(source.max_in_flight.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let store = CatalogStore::new();
        let bodies = (1..=10).map(|id| (id, body(id, true))).collect();
        let token = CancellationToken::new();
        let fetcher = RecordFetcher::new(Arc::new(FakeSource::new(bodies)), store.clone())
            .with_cancellation(token.clone());

        token.cancel();
        let report = fetcher.fetch_all(1..=10).await;

        assert!(store.is_empty());
        assert_eq!(report.cancelled, 10);
        assert_eq!(report.fetched, 0);
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let fetcher = RecordFetcher::new(
            Arc::new(FakeSource::new(HashMap::new())),
            CatalogStore::new(),
        );

        let report = fetcher.fetch_all(Vec::<u32>::new()).await;
        assert_eq!(report.requested, 0);
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_fetch_then_aggregate() {
        use crate::stats::{aggregate, selected, TranslationTable};

        let types = [vec!["fire"], vec!["fire", "flying"], vec!["water"]];
        let bodies = types
            .iter()
            .zip(1u32..)
            .map(|(names, id)| {
                let slots: Vec<_> = names
                    .iter()
                    .map(|n| json!({ "type": { "name": n } }))
                    .collect();
                let body = json!({
                    "id": id,
                    "name": format!("mon-{}", id),
                    "sprites": { "front_default": "x" },
                    "types": slots
                });
                (id, body.to_string())
            })
            .collect();

        let store = CatalogStore::new();
        let fetcher = RecordFetcher::new(Arc::new(FakeSource::new(bodies)), store.clone());
        fetcher.fetch_all(1..=3).await;

        let table = TranslationTable::pokemon_types();
        let all = aggregate(&store.all(), table);
        assert_eq!(all.get("Fogo"), Some(&2));
        assert_eq!(all.get("Voador"), Some(&1));
        assert_eq!(all.get("Água"), Some(&1));
        assert_eq!(all.len(), 3);

        store.toggle_selected(2).unwrap();
        let captured = aggregate(&selected(&store.all()), table);
        assert_eq!(captured.get("Fogo"), Some(&1));
        assert_eq!(captured.get("Voador"), Some(&1));
        assert_eq!(captured.len(), 2);
    }
}
