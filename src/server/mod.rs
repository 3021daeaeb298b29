//! JSON API for sources, collection runs and collected documents.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::collector::{Archive, Collector, ProgressTracker, Scheduler};
use crate::config::Settings;
use crate::fetcher::DefaultFetcher;
use crate::repository::DbContext;
use crate::store::VersionStore;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub collector: Collector,
}

impl AppState {
    pub fn new(collector: Collector) -> Self {
        Self { collector }
    }

    /// Wire the production collector from settings.
    pub async fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self::new(build_collector(settings).await?))
    }

    pub fn db(&self) -> &DbContext {
        self.collector.db()
    }

    pub fn store(&self) -> &Arc<dyn VersionStore> {
        self.collector.store()
    }
}

/// Build the SQLite-backed collector used by the CLI and the server.
pub async fn build_collector(settings: &Settings) -> anyhow::Result<Collector> {
    settings.ensure_directories()?;
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    let store: Arc<dyn VersionStore> = Arc::new(ctx.documents());
    let fetcher = Arc::new(DefaultFetcher::from_settings(settings));
    Ok(
        Collector::new(ctx, store, fetcher, ProgressTracker::new())
            .with_archive(Archive::new(&settings.collections_dir)),
    )
}

/// Start the web server and, if enabled, the daily schedule.
pub async fn serve(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let state = AppState::from_settings(settings).await?;

    let schedule = Scheduler::new(state.collector.clone(), &settings.schedule).map(Scheduler::spawn);

    let app = create_router(state);
    let addr: SocketAddr = bind.parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let result = axum::serve(listener, app).await;

    if let Some(handle) = schedule {
        handle.abort();
    }
    result?;
    Ok(())
}
