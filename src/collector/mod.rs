//! Collection orchestration.
//!
//! A run takes one source from pending to a terminal state: resolve the work
//! list, then fetch, extract, convert and store each URL in order. Per-URL
//! failures are recorded and skipped; only setup failures and version store
//! errors end a run early.

mod archive;
mod progress;
mod scheduler;

pub use archive::{sanitize_filename, Archive};
pub use progress::{ProgressTracker, RunGuard};
pub use scheduler::{next_tick, Scheduler};

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, SourceConfig};
use crate::converter::{convert, ConversionError, MarkdownDocument};
use crate::extractor::{ExtractionError, Extractor};
use crate::fetcher::{search, FetchError, FetchSession, Fetcher};
use crate::models::{
    CollectionRun, CollectionSource, Document, ProgressRecord, RunOutcome, SourceType, UrlOutcome,
};
use crate::repository::DbContext;
use crate::store::{StoreError, VersionOutcome, VersionStore};

/// Reasons a trigger is refused before any work starts.
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("source not found: {0}")]
    NotFound(String),
    #[error("source is disabled: {0}")]
    Disabled(String),
    #[error("invalid configuration for source {source_id}: {error}")]
    InvalidConfig { source_id: String, error: ConfigError },
    #[error("a collection is already running for source {0}")]
    AlreadyRunning(String),
    #[error("store error: {0}")]
    Store(String),
}

/// Why a single URL failed.
#[derive(Debug, Error)]
enum UrlError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractionError),
    #[error(transparent)]
    Convert(#[from] ConversionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Per-source result of [`Collector::trigger_all`].
#[derive(Debug)]
pub struct TriggerReport {
    pub source_id: String,
    pub result: Result<(), TriggerError>,
}

impl TriggerReport {
    /// Sources that were already running are skipped, not failed.
    pub fn is_skipped(&self) -> bool {
        matches!(self.result, Err(TriggerError::AlreadyRunning(_)))
    }
}

/// Drives collection runs and owns the live progress map.
#[derive(Clone)]
pub struct Collector {
    db: DbContext,
    store: Arc<dyn VersionStore>,
    fetcher: Arc<dyn Fetcher>,
    progress: ProgressTracker,
    archive: Option<Archive>,
}

impl Collector {
    pub fn new(
        db: DbContext,
        store: Arc<dyn VersionStore>,
        fetcher: Arc<dyn Fetcher>,
        progress: ProgressTracker,
    ) -> Self {
        Self {
            db,
            store,
            fetcher,
            progress,
            archive: None,
        }
    }

    /// Also write collected documents and their images under `archive`.
    pub fn with_archive(mut self, archive: Archive) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn db(&self) -> &DbContext {
        &self.db
    }

    pub fn store(&self) -> &Arc<dyn VersionStore> {
        &self.store
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.progress
    }

    /// Live progress for `source_id`.
    pub fn progress(&self, source_id: &str) -> ProgressRecord {
        self.progress.get(source_id)
    }

    /// Validate and start a run for `source_id` on a background task.
    ///
    /// Returns as soon as the run is pending. Every rejection happens before
    /// any fetch and leaves the progress record untouched.
    pub async fn trigger(
        &self,
        source_id: &str,
    ) -> Result<JoinHandle<CollectionRun>, TriggerError> {
        let (source, config) = self.prepare(source_id).await?;

        if !self.progress.try_begin(&source.id) {
            return Err(TriggerError::AlreadyRunning(source.id));
        }
        info!("Collection triggered for source {} ({})", source.id, source.name);

        let collector = self.clone();
        Ok(tokio::spawn(async move { collector.run(source, config).await }))
    }

    /// Trigger every enabled source.
    pub async fn trigger_all(&self) -> Result<Vec<TriggerReport>, TriggerError> {
        let sources = self
            .db
            .sources()
            .get_enabled()
            .await
            .map_err(|e| TriggerError::Store(e.to_string()))?;

        let mut reports = Vec::with_capacity(sources.len());
        for source in sources {
            let result = self.trigger(&source.id).await.map(|_| ());
            match &result {
                Err(TriggerError::AlreadyRunning(_)) => {
                    info!("Skipping {}: already running", source.id)
                }
                Err(e) => warn!("Could not trigger {}: {}", source.id, e),
                Ok(()) => {}
            }
            reports.push(TriggerReport {
                source_id: source.id,
                result,
            });
        }
        Ok(reports)
    }

    /// Load `source_id` and validate its configuration.
    async fn prepare(
        &self,
        source_id: &str,
    ) -> Result<(CollectionSource, SourceConfig), TriggerError> {
        let source = self
            .db
            .sources()
            .get(source_id)
            .await
            .map_err(|e| TriggerError::Store(e.to_string()))?
            .ok_or_else(|| TriggerError::NotFound(source_id.to_string()))?;

        if !source.enabled {
            return Err(TriggerError::Disabled(source.id));
        }

        let config =
            SourceConfig::from_value(&source.config).map_err(|error| TriggerError::InvalidConfig {
                source_id: source.id.clone(),
                error,
            })?;

        Ok((source, config))
    }

    /// Execute a run whose progress record is already pending.
    pub async fn run(&self, source: CollectionSource, config: SourceConfig) -> CollectionRun {
        let guard = self.progress.guard(&source.id);
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();

        let mut session = match self.fetcher.open(&source, &config).await {
            Ok(session) => session,
            Err(e) => {
                return self
                    .finish_setup_failure(guard, run_id, &source, started_at, e.to_string())
                    .await
            }
        };

        let urls = match self.work_list(session.as_mut(), &source).await {
            Ok(urls) => urls,
            Err(message) => {
                session.close().await;
                return self
                    .finish_setup_failure(guard, run_id, &source, started_at, message)
                    .await;
            }
        };

        let extractor = match Extractor::from_config(&config) {
            Ok(extractor) => extractor,
            Err(e) => {
                session.close().await;
                return self
                    .finish_setup_failure(guard, run_id, &source, started_at, e.to_string())
                    .await;
            }
        };

        let total = urls.len();
        self.progress.start_running(&source.id, total);
        info!("Collecting {} URL(s) for source {}", total, source.id);

        let mut outcomes = Vec::with_capacity(total);
        let mut fatal: Option<String> = None;

        for (index, url) in urls.iter().enumerate() {
            match self
                .process_url(session.as_mut(), &source, &extractor, url)
                .await
            {
                Ok(outcome) => outcomes.push(outcome),
                Err(UrlError::Store(e)) => {
                    error!("Version store failed on {}: {}", url, e);
                    outcomes.push(UrlOutcome::failed(url, &e));
                    fatal = Some(e.to_string());
                    break;
                }
                Err(e) => {
                    warn!("Failed to collect {}: {}", url, e);
                    outcomes.push(UrlOutcome::failed(url, &e));
                }
            }
            self.progress.advance(
                &source.id,
                index + 1,
                format!("Processed {}/{}: {}", index + 1, total, url),
            );
        }

        session.close().await;

        let succeeded = outcomes.iter().filter(|o| !o.kind.is_failure()).count();
        let failed = outcomes.len() - succeeded;
        let (outcome, message) = match fatal {
            Some(e) => (RunOutcome::Failed, format!("Aborted: {}", e)),
            None => {
                let outcome = RunOutcome::from_counts(succeeded, failed);
                let message = match outcome {
                    RunOutcome::Completed => format!("Collected {} URL(s)", succeeded),
                    RunOutcome::Partial => {
                        format!("Collected {} URL(s), {} failed", succeeded, failed)
                    }
                    RunOutcome::Failed => format!("All {} URL(s) failed", failed),
                };
                (outcome, message)
            }
        };

        self.finish(
            guard,
            CollectionRun {
                id: run_id,
                source_id: source.id.clone(),
                started_at,
                finished_at: Utc::now(),
                outcome,
                message,
                urls: outcomes,
            },
        )
        .await
    }

    /// URLs to process: the literal URL, or the links found on the search page.
    async fn work_list(
        &self,
        session: &mut dyn FetchSession,
        source: &CollectionSource,
    ) -> Result<Vec<String>, String> {
        if !source.is_search() {
            return Ok(vec![source.url_pattern.clone()]);
        }

        let search_url = search::build_search_url(&source.url_pattern, &source.search_params)
            .map_err(|e| e.to_string())?;
        info!("Discovering result links on {}", search_url);
        let links = session
            .discover_links(&search_url)
            .await
            .map_err(|e| e.to_string())?;

        if links.is_empty() {
            return Err(format!("No result links found on {}", search_url));
        }
        Ok(links)
    }

    async fn process_url(
        &self,
        session: &mut dyn FetchSession,
        source: &CollectionSource,
        extractor: &Extractor,
        url: &str,
    ) -> Result<UrlOutcome, UrlError> {
        debug!("Fetching {}", url);
        let html = session.fetch(url).await?;

        let extracted = match source.source_type {
            SourceType::Video => extractor.extract_metadata_only(&html, url),
            SourceType::Webpage => extractor.extract(&html, url)?,
        };
        let rendered = convert(&extracted, source.source_type)?;

        let mut doc = Document::new(&source.id, url, &rendered.title, rendered.markdown.clone());
        doc.video_url = rendered.video_url.clone();
        doc.summary = rendered.summary.clone();
        doc.tags = rendered.tags.clone();

        let relative = self.archive.as_ref().map(|archive| {
            archive.relative_path(&source.name, &rendered.title, Utc::now().date_naive())
        });
        doc.file_path = relative
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());

        let result = self.store.upsert(doc).await?;
        let document_id = result.document.id.clone();

        match result.outcome {
            VersionOutcome::Unchanged => {
                debug!("Unchanged: {}", url);
                Ok(UrlOutcome::unchanged(url, document_id))
            }
            VersionOutcome::Created | VersionOutcome::Updated => {
                info!(
                    "{} {} (version {})",
                    result.outcome.as_str(),
                    url,
                    result.document.version
                );
                if let (Some(archive), Some(relative)) = (&self.archive, relative.as_deref()) {
                    self.write_archive(session, archive, relative, &rendered)
                        .await;
                }
                Ok(UrlOutcome::success(url, document_id))
            }
        }
    }

    /// Best-effort archive write; failures are logged, not fatal.
    async fn write_archive(
        &self,
        session: &mut dyn FetchSession,
        archive: &Archive,
        relative: &Path,
        rendered: &MarkdownDocument,
    ) {
        if let Err(e) = archive.write_markdown(relative, &rendered.markdown).await {
            warn!("Could not write {}: {}", relative.display(), e);
            return;
        }
        for image in &rendered.images {
            match session.fetch_bytes(&image.url).await {
                Ok(bytes) => {
                    if let Err(e) = archive.write_image(relative, &image.filename, &bytes).await {
                        warn!("Could not save image {}: {}", image.filename, e);
                    }
                }
                Err(e) => warn!("Could not download image {}: {}", image.url, e),
            }
        }
    }

    async fn finish_setup_failure(
        &self,
        guard: RunGuard,
        run_id: String,
        source: &CollectionSource,
        started_at: chrono::DateTime<Utc>,
        message: String,
    ) -> CollectionRun {
        error!("Collection for source {} failed: {}", source.id, message);
        self.finish(
            guard,
            CollectionRun {
                id: run_id,
                source_id: source.id.clone(),
                started_at,
                finished_at: Utc::now(),
                outcome: RunOutcome::Failed,
                message: message.clone(),
                urls: vec![UrlOutcome::failed(&source.url_pattern, &message)],
            },
        )
        .await
    }

    /// Persist the run log and publish the terminal progress state.
    async fn finish(&self, guard: RunGuard, run: CollectionRun) -> CollectionRun {
        if let Err(e) = self.db.logs().record_run(&run).await {
            error!("Could not record run {}: {}", run.id, e);
        }
        info!(
            "Collection for source {} finished: {} ({})",
            run.source_id,
            run.outcome.as_str(),
            run.message
        );
        guard.finish(run.outcome, run.message.clone());
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_report_skipped() {
        let report = TriggerReport {
            source_id: "s".into(),
            result: Err(TriggerError::AlreadyRunning("s".into())),
        };
        assert!(report.is_skipped());

        let report = TriggerReport {
            source_id: "s".into(),
            result: Err(TriggerError::Disabled("s".into())),
        };
        assert!(!report.is_skipped());
    }
}
