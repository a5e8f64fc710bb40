use ci_client::ClientError;
use std::path::PathBuf;
use thiserror::Error;

/// Every failure the engine can report.
///
/// The `Display` text of a variant doubles as the `status` string recorded in
/// the state file, so the first two read the way the status field expects.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("hit rate limit")]
    RateLimited,

    #[error("no workflow runs found")]
    NoRunsFound,

    #[error("artifact expired: {0}")]
    ArtifactExpired(String),

    /// Names the artifact, never the pre-signed blob URL: this text ends up
    /// in the state file.
    #[error("download of {artifact} failed with HTTP {status}")]
    DownloadStatus { artifact: String, status: u16 },

    #[error("transfer of {artifact} failed: {source}")]
    Transfer {
        artifact: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unsafe output directory {}: {reason}", .path.display())]
    UnsafeOutputDir { path: PathBuf, reason: String },

    #[error("settings not found: {}", .0.display())]
    SettingsNotFound(PathBuf),

    #[error("cancelled")]
    Cancelled,

    #[error("background task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Client(ClientError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

impl SyncError {
    /// The string recorded as `status` when this error ends an invocation.
    pub fn status(&self) -> String {
        self.to_string()
    }

    /// Errors that are written to the state file as soon as they are seen,
    /// not only when the driver finalizes.
    pub fn is_recorded_eagerly(&self) -> bool {
        matches!(self, SyncError::RateLimited | SyncError::NoRunsFound)
    }
}

impl From<ClientError> for SyncError {
    fn from(err: ClientError) -> Self {
        if err.is_rate_limited() {
            SyncError::RateLimited
        } else {
            SyncError::Client(err)
        }
    }
}

impl From<tokio::task::JoinError> for SyncError {
    fn from(err: tokio::task::JoinError) -> Self {
        SyncError::Task(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
