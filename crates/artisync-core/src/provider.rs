//! The seam between the engine and the CI provider.
//!
//! The engine only ever talks to a [`CiProvider`]; production wires in
//! [`ci_client::GitHubClient`], tests wire in a scripted fake.

use std::future::Future;

use chrono::{DateTime, Utc};
use ci_client::{Artifact, Commit, GitHubClient, RunSummary, Url};

use crate::settings::WatchTarget;

pub trait CiProvider: Send + Sync + 'static {
    /// Successful runs of the target workflow on the target branch, newest
    /// first.
    fn list_successful_runs(
        &self,
        target: &WatchTarget,
    ) -> impl Future<Output = ci_client::Result<Vec<RunSummary>>> + Send;

    fn list_artifacts(
        &self,
        target: &WatchTarget,
        run_id: u64,
    ) -> impl Future<Output = ci_client::Result<Vec<Artifact>>> + Send;

    /// A short-lived URL the artifact archive can be fetched from without
    /// credentials.
    fn artifact_download_url(
        &self,
        target: &WatchTarget,
        artifact_id: u64,
    ) -> impl Future<Output = ci_client::Result<Url>> + Send;

    fn list_commits(
        &self,
        target: &WatchTarget,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> impl Future<Output = ci_client::Result<Vec<Commit>>> + Send;
}

impl CiProvider for GitHubClient {
    async fn list_successful_runs(&self, target: &WatchTarget) -> ci_client::Result<Vec<RunSummary>> {
        GitHubClient::list_successful_runs(
            self,
            &target.owner,
            &target.repo,
            &target.workflow_file,
            &target.branch,
        )
        .await
    }

    async fn list_artifacts(&self, target: &WatchTarget, run_id: u64) -> ci_client::Result<Vec<Artifact>> {
        GitHubClient::list_artifacts(self, &target.owner, &target.repo, run_id).await
    }

    async fn artifact_download_url(&self, target: &WatchTarget, artifact_id: u64) -> ci_client::Result<Url> {
        GitHubClient::artifact_download_url(self, &target.owner, &target.repo, artifact_id).await
    }

    async fn list_commits(
        &self,
        target: &WatchTarget,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> ci_client::Result<Vec<Commit>> {
        GitHubClient::list_commits(self, &target.owner, &target.repo, &target.branch, since, until).await
    }
}
