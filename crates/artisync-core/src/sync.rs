use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::pipeline::{ArtifactPipeline, SUCCESS_STATUS};
use crate::poller;
use crate::provider::CiProvider;
use crate::settings::Settings;
use crate::state::{RunIdentity, StateStore, SyncState};

/// What a successful invocation produced.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub run: RunIdentity,
    pub state: SyncState,
}

/// One invocation: wait for a new run, then sync its artifacts.
pub struct Syncer<P> {
    provider: Arc<P>,
    settings: Settings,
    store: StateStore,
    root: PathBuf,
    shutdown: CancellationToken,
}

impl<P: CiProvider> Syncer<P> {
    pub fn new(provider: Arc<P>, settings: Settings, root: &Path) -> Self {
        Self {
            provider,
            settings,
            store: StateStore::new(root),
            root: root.to_path_buf(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Abort the long-poll wait when `shutdown` is cancelled.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Run the invocation to completion.
    ///
    /// Whatever happens, the final status (`"success"` or the error text)
    /// and the wall-clock time of the whole invocation are written before
    /// returning.
    pub async fn run(&self) -> Result<SyncOutcome> {
        let started = Instant::now();
        let result = self.run_inner().await;
        let elapsed = started.elapsed().as_secs_f64();

        let status = match &result {
            Ok(_) => SUCCESS_STATUS.to_string(),
            Err(e) => e.status(),
        };
        let finalize = SyncState {
            status,
            elapsed_seconds: elapsed,
            ..Default::default()
        };

        match (result, self.store.merge_update(finalize)) {
            (Ok(run), Ok(state)) => {
                tracing::info!(run_id = run.id, elapsed_secs = elapsed, "sync complete");
                Ok(SyncOutcome { run, state })
            }
            (Ok(_), Err(write_err)) => Err(write_err),
            (Err(e), write) => {
                if let Err(write_err) = write {
                    tracing::warn!(error = %write_err, "failed to record final status");
                }
                tracing::error!(error = %e, elapsed_secs = elapsed, "sync failed");
                Err(e)
            }
        }
    }

    async fn run_inner(&self) -> Result<RunIdentity> {
        // Built first so an unusable output directory fails before any polling.
        let pipeline = ArtifactPipeline::new(Arc::clone(&self.provider), &self.settings, &self.root)?;

        let run = poller::poll_for_new_run(
            self.provider.as_ref(),
            &self.settings,
            &self.store,
            &self.shutdown,
        )
        .await?;

        pipeline.sync(run.id, &self.store).await?;
        Ok(run)
    }
}
