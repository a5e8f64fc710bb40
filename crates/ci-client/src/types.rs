use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Public models ────────────────────────────────────────────────────────

/// One completed run of a workflow, as returned by the runs listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub id: u64,
    /// The title shown in the Actions UI (usually the head commit subject).
    #[serde(default)]
    pub display_title: String,
    pub created_at: DateTime<Utc>,
}

/// A downloadable bundle produced by a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: u64,
    pub name: String,
    /// `true` once the retention window has lapsed; the blob is gone.
    #[serde(default)]
    pub expired: bool,
}

/// A commit flattened to the fields the changelog needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub message: String,
    pub author_name: String,
    pub timestamp: Option<DateTime<Utc>>,
}

// ─── Wire envelopes ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct RunList {
    #[serde(default)]
    pub workflow_runs: Vec<RunSummary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArtifactList {
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitEntry {
    pub commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitDetail {
    #[serde(default)]
    pub message: String,
    pub author: Option<GitSignature>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GitSignature {
    #[serde(default)]
    pub name: String,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiMessage {
    pub message: String,
}

impl From<CommitEntry> for Commit {
    fn from(entry: CommitEntry) -> Self {
        let (author_name, timestamp) = match entry.commit.author {
            Some(sig) => (sig.name, sig.date),
            None => (String::new(), None),
        };
        Commit {
            message: entry.commit.message,
            author_name,
            timestamp,
        }
    }
}
