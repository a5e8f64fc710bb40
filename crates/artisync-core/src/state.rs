use crate::error::{Result, SyncError};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// RunIdentity
// ---------------------------------------------------------------------------

/// Identity of a workflow run. Novelty is decided on `id` alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunIdentity {
    pub id: u64,
    pub title: String,
}

impl RunIdentity {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.id == 0 && self.title.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SyncState
// ---------------------------------------------------------------------------

/// The persisted record of what the last invocation did.
///
/// Also used as a *partial* record for [`StateStore::merge_update`]: a field
/// left at its zero value (empty string, `0.0`, zero identity) means "keep
/// what is stored".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SyncState {
    pub commit_log: String,
    pub status: String,
    #[serde(rename = "elapsed-time")]
    pub elapsed_seconds: f64,
    pub workflow: RunIdentity,
}

impl SyncState {
    pub fn with_status(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            ..Default::default()
        }
    }

    pub fn with_workflow(workflow: RunIdentity) -> Self {
        Self {
            workflow,
            ..Default::default()
        }
    }

    pub fn with_commit_log(commit_log: impl Into<String>) -> Self {
        Self {
            commit_log: commit_log.into(),
            ..Default::default()
        }
    }

    /// Overlay the non-zero fields of `self` onto `stored`.
    ///
    /// Fields are compared whole: a `workflow` with a new id and an empty
    /// title is non-zero and replaces both stored id and title.
    pub fn merged_over(self, stored: &SyncState) -> SyncState {
        SyncState {
            commit_log: if self.commit_log.is_empty() {
                stored.commit_log.clone()
            } else {
                self.commit_log
            },
            status: if self.status.is_empty() {
                stored.status.clone()
            } else {
                self.status
            },
            elapsed_seconds: if self.elapsed_seconds == 0.0 {
                stored.elapsed_seconds
            } else {
                self.elapsed_seconds
            },
            workflow: if self.workflow.is_zero() {
                stored.workflow.clone()
            } else {
                self.workflow
            },
        }
    }
}

// ---------------------------------------------------------------------------
// StateStore
// ---------------------------------------------------------------------------

/// File-backed home of the single [`SyncState`] record.
///
/// Every operation goes to disk; nothing is cached between calls. Only one
/// process may use a given file at a time and callers serialize their own
/// updates.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Store at `<root>/data/info.json`.
    pub fn new(root: &Path) -> Self {
        Self::at(paths::state_path(root))
    }

    fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored record. A missing file is the zero record (first run);
    /// an unparseable one is an error.
    pub fn load(&self) -> Result<SyncState> {
        if !self.path.exists() {
            return Ok(SyncState::default());
        }
        let data = std::fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(SyncState::default());
        }
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, state: &SyncState) -> Result<()> {
        let data = serde_json::to_string_pretty(state)?;
        crate::io::atomic_write(&self.path, data.as_bytes())
    }

    /// Merge `partial` over the stored record, persist and return the result.
    pub fn merge_update(&self, partial: SyncState) -> Result<SyncState> {
        let stored = self.load()?;
        let merged = partial.merged_over(&stored);
        self.save(&merged)?;
        tracing::debug!(path = %self.path.display(), status = %merged.status, "state updated");
        Ok(merged)
    }

    /// Load, apply `f`, persist. For the rare write that has to set a field
    /// back to its zero value, which `merge_update` cannot express.
    pub fn update<F: FnOnce(&mut SyncState)>(&self, f: F) -> Result<SyncState> {
        let mut state = self.load()?;
        f(&mut state);
        self.save(&state)?;
        Ok(state)
    }

    /// Record `err` as the status if it is one of the eagerly recorded
    /// kinds, then hand it back for propagation.
    ///
    /// A failure to write is logged rather than allowed to mask `err`.
    pub fn note(&self, err: impl Into<SyncError>) -> SyncError {
        let err = err.into();
        if err.is_recorded_eagerly() {
            if let Err(write_err) = self.merge_update(SyncState::with_status(err.status())) {
                tracing::warn!(error = %write_err, "failed to record status");
            }
        }
        err
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
