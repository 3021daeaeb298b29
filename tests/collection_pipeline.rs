//! End-to-end collection runs driven by scripted fetchers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::Notify;

use docharvest::collector::{Collector, ProgressTracker, TriggerError};
use docharvest::config::SourceConfig;
use docharvest::fetcher::{FetchError, FetchSession, Fetcher};
use docharvest::models::{
    CollectionSource, Document, DocumentVersion, LogStatus, ProgressStatus, RunOutcome,
    SourceType, UrlOutcomeKind,
};
use docharvest::repository::{DbContext, LogQuery};
use docharvest::store::{MemoryVersionStore, StoreError, UpsertResult, VersionStore};

const SEARCH_URL: &str = "https://news.example.com/search";

fn article(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{title}</title></head><body>\
         <nav>Home | About | Contact</nav>\
         <article><h1>{title}</h1><p>{body}</p></article>\
         <footer>Copyright</footer></body></html>"
    )
}

const LONG_BODY: &str = "The committee met on Tuesday to review the quarterly \
    budget and agreed to fund three new research programs next year.";

/// Fetcher that serves canned pages and counts how often it was opened.
#[derive(Clone, Default)]
struct ScriptedFetcher {
    pages: Arc<HashMap<String, Result<String, FetchError>>>,
    links: Arc<Vec<String>>,
    opens: Arc<AtomicUsize>,
    gate: Option<Arc<Notify>>,
    panic_on: Option<String>,
    /// Shared with the collector so sessions can sample live progress.
    tracker: ProgressTracker,
    observed: Arc<Mutex<Vec<(ProgressStatus, u8)>>>,
}

impl ScriptedFetcher {
    fn new(pages: Vec<(&str, Result<String, FetchError>)>, links: Vec<&str>) -> Self {
        Self {
            pages: Arc::new(
                pages
                    .into_iter()
                    .map(|(url, page)| (url.to_string(), page))
                    .collect(),
            ),
            links: Arc::new(links.into_iter().map(String::from).collect()),
            ..Default::default()
        }
    }

    /// Block `open` until the returned notify is signalled.
    fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(gate.clone());
        (self, gate)
    }

    /// Panic inside `fetch` when asked for `url`.
    fn panicking_on(mut self, url: &str) -> Self {
        self.panic_on = Some(url.to_string());
        self
    }

    fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    fn observed(&self) -> Vec<(ProgressStatus, u8)> {
        self.observed.lock().unwrap().clone()
    }
}

struct ScriptedSession {
    pages: Arc<HashMap<String, Result<String, FetchError>>>,
    links: Arc<Vec<String>>,
    panic_on: Option<String>,
    source_id: String,
    tracker: ProgressTracker,
    observed: Arc<Mutex<Vec<(ProgressStatus, u8)>>>,
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn open(
        &self,
        source: &CollectionSource,
        _config: &SourceConfig,
    ) -> Result<Box<dyn FetchSession>, FetchError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(Box::new(ScriptedSession {
            pages: self.pages.clone(),
            links: self.links.clone(),
            panic_on: self.panic_on.clone(),
            source_id: source.id.clone(),
            tracker: self.tracker.clone(),
            observed: self.observed.clone(),
        }))
    }
}

#[async_trait]
impl FetchSession for ScriptedSession {
    async fn fetch(&mut self, url: &str) -> Result<String, FetchError> {
        let record = self.tracker.get(&self.source_id);
        self.observed
            .lock()
            .unwrap()
            .push((record.status, record.progress));
        if self.panic_on.as_deref() == Some(url) {
            panic!("scripted panic fetching {}", url);
        }
        self.pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| {
                Err(FetchError::HttpStatus {
                    status: 404,
                    url: url.to_string(),
                })
            })
    }

    async fn discover_links(&mut self, _search_url: &str) -> Result<Vec<String>, FetchError> {
        Ok(self.links.as_ref().clone())
    }

    async fn fetch_bytes(&mut self, url: &str) -> Result<Vec<u8>, FetchError> {
        Err(FetchError::Network(format!("no bytes for {}", url)))
    }

    async fn close(&mut self) {}
}

struct Harness {
    collector: Collector,
    store: Arc<MemoryVersionStore>,
    _dir: TempDir,
}

async fn harness(fetcher: ScriptedFetcher) -> Harness {
    let store = Arc::new(MemoryVersionStore::new());
    let (collector, dir) = collector_with_store(fetcher, store.clone()).await;
    Harness {
        collector,
        store,
        _dir: dir,
    }
}

async fn collector_with_store(
    fetcher: ScriptedFetcher,
    store: Arc<dyn VersionStore>,
) -> (Collector, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = DbContext::from_url(&format!("sqlite:{}", dir.path().join("test.db").display()));
    db.init_schema().await.unwrap();

    let tracker = fetcher.tracker.clone();
    (Collector::new(db, store, Arc::new(fetcher), tracker), dir)
}

/// Store that accepts `limit` upserts and then reports itself unavailable.
struct FlakyStore {
    inner: MemoryVersionStore,
    limit: usize,
    upserts: AtomicUsize,
}

impl FlakyStore {
    fn failing_after(limit: usize) -> Self {
        Self {
            inner: MemoryVersionStore::new(),
            limit,
            upserts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl VersionStore for FlakyStore {
    async fn current(&self, source_id: &str, url: &str) -> Result<Option<Document>, StoreError> {
        self.inner.current(source_id, url).await
    }

    async fn upsert(&self, doc: Document) -> Result<UpsertResult, StoreError> {
        if self.upserts.fetch_add(1, Ordering::SeqCst) >= self.limit {
            return Err(StoreError::Unavailable("database is locked".into()));
        }
        self.inner.upsert(doc).await
    }

    async fn get(&self, document_id: &str) -> Result<Option<Document>, StoreError> {
        self.inner.get(document_id).await
    }

    async fn get_version(
        &self,
        document_id: &str,
        version: i32,
    ) -> Result<Option<DocumentVersion>, StoreError> {
        self.inner.get_version(document_id, version).await
    }

    async fn versions(&self, document_id: &str) -> Result<Vec<DocumentVersion>, StoreError> {
        self.inner.versions(document_id).await
    }
}

fn page_source(id: &str, url: &str) -> CollectionSource {
    CollectionSource::new(id.into(), id.into(), url.into(), SourceType::Webpage)
}

fn search_source(id: &str) -> CollectionSource {
    let mut source = page_source(id, SEARCH_URL);
    source.search_params.insert("q".into(), "budget".into());
    source
}

#[tokio::test]
async fn test_search_run_with_one_timeout_is_partial() {
    let links = vec![
        "https://news.example.com/a",
        "https://news.example.com/b",
        "https://news.example.com/c",
    ];
    let fetcher = ScriptedFetcher::new(
        vec![
            (links[0], Ok(article("First story", LONG_BODY))),
            (
                links[1],
                Err(FetchError::Timeout("https://news.example.com/b".into())),
            ),
            (links[2], Ok(article("Third story", LONG_BODY))),
        ],
        links.clone(),
    );
    let h = harness(fetcher.clone()).await;
    h.collector
        .db()
        .sources()
        .save(&search_source("news"))
        .await
        .unwrap();

    let run = h.collector.trigger("news").await.unwrap().await.unwrap();

    assert_eq!(run.outcome, RunOutcome::Partial);
    assert_eq!(run.urls.len(), 3);
    let kinds: Vec<_> = run.urls.iter().map(|u| u.kind).collect();
    assert_eq!(
        kinds,
        vec![
            UrlOutcomeKind::Success,
            UrlOutcomeKind::Failed,
            UrlOutcomeKind::Success
        ]
    );

    let logs = h
        .collector
        .db()
        .logs()
        .list_logs(&LogQuery {
            source_id: Some("news".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(logs.len(), 3);
    assert_eq!(
        logs.iter()
            .filter(|l| l.status == LogStatus::Failed)
            .count(),
        1
    );

    let progress = h.collector.progress("news");
    assert_eq!(progress.status, ProgressStatus::Completed);
    assert_eq!(progress.progress, 100);
    assert_eq!(h.store.len().await, 2);

    // Sampled before each fetch: running, rising, never 100 mid-run.
    let observed = fetcher.observed();
    assert_eq!(observed.len(), 3);
    assert!(observed
        .iter()
        .all(|(status, _)| *status == ProgressStatus::Running));
    let percents: Vec<u8> = observed.iter().map(|(_, p)| *p).collect();
    assert_eq!(percents, vec![0, 33, 66]);
}

#[tokio::test]
async fn test_disabled_source_is_rejected_without_fetching() {
    let fetcher = ScriptedFetcher::new(vec![], vec![]);
    let h = harness(fetcher.clone()).await;

    let mut source = page_source("off", "https://example.com/page");
    source.enabled = false;
    h.collector.db().sources().save(&source).await.unwrap();

    let err = h.collector.trigger("off").await.unwrap_err();
    assert!(matches!(err, TriggerError::Disabled(_)));
    assert_eq!(h.collector.progress("off").status, ProgressStatus::Idle);
    assert_eq!(fetcher.open_count(), 0);

    let logs = h
        .collector
        .db()
        .logs()
        .list_logs(&LogQuery::default())
        .await
        .unwrap();
    assert!(logs.is_empty());
}

#[tokio::test]
async fn test_unknown_source_and_invalid_config_are_rejected() {
    let fetcher = ScriptedFetcher::new(vec![], vec![]);
    let h = harness(fetcher.clone()).await;

    let err = h.collector.trigger("ghost").await.unwrap_err();
    assert!(matches!(err, TriggerError::NotFound(_)));

    let mut source = page_source("bad", "https://example.com/page");
    source.config = serde_json::json!({ "selectors": { "content": "div[[" } });
    h.collector.db().sources().save(&source).await.unwrap();

    let err = h.collector.trigger("bad").await.unwrap_err();
    assert!(matches!(err, TriggerError::InvalidConfig { .. }));
    assert_eq!(h.collector.progress("bad").status, ProgressStatus::Idle);
    assert_eq!(fetcher.open_count(), 0);
}

#[tokio::test]
async fn test_unchanged_page_keeps_version() {
    let url = "https://example.com/page";
    let fetcher = ScriptedFetcher::new(vec![(url, Ok(article("Budget", LONG_BODY)))], vec![]);
    let h = harness(fetcher).await;
    h.collector
        .db()
        .sources()
        .save(&page_source("page", url))
        .await
        .unwrap();

    let first = h.collector.trigger("page").await.unwrap().await.unwrap();
    assert_eq!(first.outcome, RunOutcome::Completed);
    assert_eq!(first.urls[0].kind, UrlOutcomeKind::Success);
    let doc_id = first.urls[0].document_id.clone().unwrap();
    let stored = h.store.get(&doc_id).await.unwrap().unwrap();

    let second = h.collector.trigger("page").await.unwrap().await.unwrap();
    assert_eq!(second.outcome, RunOutcome::Completed);
    assert_eq!(second.urls[0].kind, UrlOutcomeKind::Unchanged);
    assert_eq!(second.urls[0].document_id.as_deref(), Some(doc_id.as_str()));

    let after = h.store.get(&doc_id).await.unwrap().unwrap();
    assert_eq!(after.version, 1);
    assert_eq!(after.updated_at, stored.updated_at);
    assert_eq!(h.store.versions(&doc_id).await.unwrap().len(), 1);

    let skipped = h
        .collector
        .db()
        .logs()
        .list_logs(&LogQuery {
            status: Some(LogStatus::Skipped),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(skipped.len(), 1);
}

#[tokio::test]
async fn test_second_trigger_while_running_is_refused() {
    let url = "https://example.com/page";
    let (fetcher, gate) =
        ScriptedFetcher::new(vec![(url, Ok(article("Budget", LONG_BODY)))], vec![]).gated();
    let h = harness(fetcher.clone()).await;
    h.collector
        .db()
        .sources()
        .save(&page_source("page", url))
        .await
        .unwrap();

    let handle = h.collector.trigger("page").await.unwrap();
    assert!(h.collector.progress("page").status.is_active());

    let err = h.collector.trigger("page").await.unwrap_err();
    assert!(matches!(err, TriggerError::AlreadyRunning(_)));

    let reports = h.collector.trigger_all().await.unwrap();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].is_skipped());

    gate.notify_one();
    let run = handle.await.unwrap();
    assert_eq!(run.outcome, RunOutcome::Completed);
    assert_eq!(fetcher.open_count(), 1);

    // Terminal state allows a new run.
    assert!(h.collector.tracker().try_begin("page"));
}

#[tokio::test]
async fn test_empty_search_results_fail_the_run() {
    let fetcher = ScriptedFetcher::new(vec![], vec![]);
    let h = harness(fetcher).await;
    h.collector
        .db()
        .sources()
        .save(&search_source("empty"))
        .await
        .unwrap();

    let run = h.collector.trigger("empty").await.unwrap().await.unwrap();
    assert_eq!(run.outcome, RunOutcome::Failed);
    assert!(run.message.starts_with("No result links found"));
    assert_eq!(h.collector.progress("empty").status, ProgressStatus::Failed);
}

#[tokio::test]
async fn test_thin_page_fails_extraction() {
    let url = "https://example.com/thin";
    let fetcher = ScriptedFetcher::new(
        vec![(url, Ok(article("Thin", "Too short.")))],
        vec![],
    );
    let h = harness(fetcher).await;
    h.collector
        .db()
        .sources()
        .save(&page_source("thin", url))
        .await
        .unwrap();

    let run = h.collector.trigger("thin").await.unwrap().await.unwrap();
    assert_eq!(run.outcome, RunOutcome::Failed);
    assert_eq!(run.urls[0].kind, UrlOutcomeKind::Failed);
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn test_store_failure_aborts_the_run() {
    let links = vec![
        "https://news.example.com/a",
        "https://news.example.com/b",
        "https://news.example.com/c",
    ];
    let fetcher = ScriptedFetcher::new(
        links
            .iter()
            .map(|url| (*url, Ok(article("Story", LONG_BODY))))
            .collect(),
        links.clone(),
    );
    let (collector, _dir) =
        collector_with_store(fetcher.clone(), Arc::new(FlakyStore::failing_after(1))).await;
    collector
        .db()
        .sources()
        .save(&search_source("news"))
        .await
        .unwrap();

    let run = collector.trigger("news").await.unwrap().await.unwrap();
    assert_eq!(run.outcome, RunOutcome::Failed);
    assert!(run.message.starts_with("Aborted"));
    let kinds: Vec<_> = run.urls.iter().map(|u| u.kind).collect();
    assert_eq!(kinds, vec![UrlOutcomeKind::Success, UrlOutcomeKind::Failed]);

    // The third URL is never fetched.
    assert_eq!(fetcher.observed().len(), 2);

    let logs = collector
        .db()
        .logs()
        .list_logs(&LogQuery {
            source_id: Some("news".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(logs.len(), 2);

    let progress = collector.progress("news");
    assert_eq!(progress.status, ProgressStatus::Failed);
    assert_eq!(progress.progress, 100);
}

#[tokio::test]
async fn test_panicking_run_releases_the_source() {
    let url = "https://example.com/page";
    let fetcher = ScriptedFetcher::new(vec![(url, Ok(article("Budget", LONG_BODY)))], vec![])
        .panicking_on(url);
    let h = harness(fetcher).await;
    h.collector
        .db()
        .sources()
        .save(&page_source("page", url))
        .await
        .unwrap();

    let joined = h.collector.trigger("page").await.unwrap().await;
    assert!(joined.unwrap_err().is_panic());

    let progress = h.collector.progress("page");
    assert_eq!(progress.status, ProgressStatus::Failed);
    assert_eq!(progress.progress, 100);

    // A fresh trigger is accepted rather than refused as already running.
    assert!(h.collector.trigger("page").await.is_ok());
}
