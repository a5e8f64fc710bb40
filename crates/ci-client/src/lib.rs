//! Async client for the slice of the GitHub Actions REST API that `artisync`
//! needs: successful runs of a workflow, the artifacts of a run, the
//! short-lived download URL of an artifact, and the commits of a branch in a
//! time window.
//!
//! Every call can fail with [`ClientError::RateLimited`], which callers treat
//! as fatal for the current attempt.
//!
//! ```rust,ignore
//! use ci_client::GitHubClient;
//!
//! let client = GitHubClient::new(token)?;
//! let runs = client
//!     .list_successful_runs("rebelonion", "Dantotsu", "beta.yml", "dev")
//!     .await?;
//! ```

pub mod client;
pub mod error;
pub mod types;

pub use client::{GitHubClient, DEFAULT_API_URL};
pub use error::ClientError;
pub use types::{Artifact, Commit, RunSummary};

/// Re-exported so downstream crates can name download URLs without a direct
/// `url` dependency.
pub use url::Url;

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, ClientError>;
