use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::commits;
use crate::error::{Result, SyncError};
use crate::provider::CiProvider;
use crate::settings::Settings;
use crate::state::{RunIdentity, StateStore, SyncState};

/// Long-poll until the newest successful run differs from the stored one.
///
/// Each round lists successful runs, newest first. A rate limit or an empty
/// listing ends the poll with the status recorded. When the newest run is
/// the stored one, the poller sleeps `poll_delay_seconds` and asks again,
/// indefinitely, until `shutdown` fires.
///
/// On a new run the commit log is rebuilt from the window between the
/// creation of the runner-up run and the new one (or cleared when there is
/// no runner-up), then the new identity is stored and returned. The identity
/// is only stored once the commit log is in place, so a failed collection
/// leaves the run to be picked up again next time.
pub async fn poll_for_new_run<P: CiProvider>(
    provider: &P,
    settings: &Settings,
    store: &StateStore,
    shutdown: &CancellationToken,
) -> Result<RunIdentity> {
    let stored = store.load()?.workflow;
    let delay = Duration::from_secs(settings.poll_delay_seconds);
    let mut attempt: u64 = 0;

    loop {
        attempt += 1;
        let runs = provider
            .list_successful_runs(&settings.workflow)
            .await
            .map_err(|e| store.note(e))?;

        let Some(newest) = runs.first() else {
            return Err(store.note(SyncError::NoRunsFound));
        };

        if newest.id == stored.id {
            tracing::info!(
                run_id = newest.id,
                attempt,
                delay_secs = settings.poll_delay_seconds,
                "no new run yet, waiting"
            );
            tokio::select! {
                _ = shutdown.cancelled() => return Err(SyncError::Cancelled),
                _ = tokio::time::sleep(delay) => continue,
            }
        }

        tracing::info!(
            run_id = newest.id,
            title = %newest.display_title,
            previous = stored.id,
            "found new workflow run"
        );

        match runs.get(1) {
            Some(previous) => {
                commits::collect_commits(
                    provider,
                    settings,
                    store,
                    previous.created_at,
                    newest.created_at,
                )
                .await?;
            }
            None => {
                tracing::info!("only one run on record, commit log left empty");
                store.update(|s| s.commit_log.clear())?;
            }
        }

        let identity = RunIdentity::new(newest.id, newest.display_title.clone());
        store.merge_update(SyncState::with_workflow(identity.clone()))?;
        return Ok(identity);
    }
}
