use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, ACCEPT, LOCATION};
use reqwest::{redirect, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::types::{ApiMessage, Artifact, ArtifactList, Commit, CommitEntry, RunList, RunSummary};
use crate::{ClientError, Result};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const MEDIA_TYPE: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("artisync/", env!("CARGO_PKG_VERSION"));
const PER_PAGE: usize = 100;

// ─── GitHubClient ─────────────────────────────────────────────────────────

/// Token-authenticated handle on the GitHub REST API.
///
/// Cheap to clone; both inner `reqwest::Client`s share their connection
/// pools across clones.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    /// Used only for the artifact download endpoint, whose 302 must be
    /// captured rather than followed.
    no_redirect: reqwest::Client,
    base_url: Url,
    token: String,
}

impl GitHubClient {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(token, DEFAULT_API_URL)
    }

    /// Point the client at another API root (GitHub Enterprise, or a mock
    /// server in tests).
    pub fn with_base_url(token: impl Into<String>, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        let no_redirect = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self {
            http,
            no_redirect,
            base_url,
            token: token.into(),
        })
    }

    /// Successful runs of `workflow_file` on `branch`, newest first.
    pub async fn list_successful_runs(
        &self,
        owner: &str,
        repo: &str,
        workflow_file: &str,
        branch: &str,
    ) -> Result<Vec<RunSummary>> {
        let url = self.endpoint(&[
            "repos",
            owner,
            repo,
            "actions",
            "workflows",
            workflow_file,
            "runs",
        ])?;
        let query = [
            ("branch", branch.to_string()),
            ("status", "success".to_string()),
            ("per_page", PER_PAGE.to_string()),
        ];
        let list: RunList = self.get_json(url, &query).await?;
        tracing::debug!(workflow = workflow_file, count = list.workflow_runs.len(), "listed runs");
        Ok(list.workflow_runs)
    }

    pub async fn list_artifacts(&self, owner: &str, repo: &str, run_id: u64) -> Result<Vec<Artifact>> {
        let run_id = run_id.to_string();
        let url = self.endpoint(&["repos", owner, repo, "actions", "runs", &run_id, "artifacts"])?;
        let query = [("per_page", PER_PAGE.to_string())];
        let list: ArtifactList = self.get_json(url, &query).await?;
        tracing::debug!(run_id = %run_id, count = list.artifacts.len(), "listed artifacts");
        Ok(list.artifacts)
    }

    /// Resolve the short-lived blob URL an artifact can be fetched from.
    ///
    /// The endpoint answers with a 302; the `Location` header is the URL.
    /// The blob URL is pre-signed and must be fetched without the API token.
    pub async fn artifact_download_url(&self, owner: &str, repo: &str, artifact_id: u64) -> Result<Url> {
        let id = artifact_id.to_string();
        let url = self.endpoint(&["repos", owner, repo, "actions", "artifacts", &id, "zip"])?;
        let resp = self.authorized(self.no_redirect.get(url)).send().await?;
        let resp = check_status(resp).await?;
        let location = resp
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ClientError::MissingRedirect { artifact_id })?;
        Ok(resp.url().join(location)?)
    }

    /// Commits reachable from `branch` with an author date in `[since, until]`,
    /// in the order GitHub returns them (newest first). Follows pagination.
    pub async fn list_commits(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Commit>> {
        let url = self.endpoint(&["repos", owner, repo, "commits"])?;
        let mut commits = Vec::new();
        let mut page = 1usize;
        loop {
            let query = [
                ("sha", branch.to_string()),
                ("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("until", until.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
            ];
            let entries: Vec<CommitEntry> = self.get_json(url.clone(), &query).await?;
            let short_page = entries.len() < PER_PAGE;
            commits.extend(entries.into_iter().map(Commit::from));
            if short_page {
                break;
            }
            page += 1;
        }
        tracing::debug!(branch, count = commits.len(), "listed commits");
        Ok(commits)
    }

    // ─── Internal ─────────────────────────────────────────────────────────

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(&self.token)
            .header(ACCEPT, MEDIA_TYPE)
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, String)]) -> Result<T> {
        let resp = self.authorized(self.http.get(url)).query(query).send().await?;
        let resp = check_status(resp).await?;
        Ok(resp.json::<T>().await?)
    }
}

/// Pass through 2xx and 3xx responses; turn everything else into a
/// [`ClientError`], singling out rate limiting.
async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() || status.is_redirection() {
        return Ok(resp);
    }
    if is_rate_limited(status, resp.headers()) {
        let reset = resp
            .headers()
            .get("x-ratelimit-reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0));
        tracing::warn!(status = status.as_u16(), ?reset, "GitHub API rate limit hit");
        return Err(ClientError::RateLimited { reset });
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiMessage>(&body)
        .map(|m| m.message)
        .unwrap_or(body);
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }
    status == StatusCode::FORBIDDEN
        && headers
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim() == "0")
}

// ─── Tests ────────────────────────────────────────────────────────────────
