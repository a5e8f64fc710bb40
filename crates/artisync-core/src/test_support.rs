//! Scripted [`CiProvider`] and fixtures shared by the engine's unit tests.

use std::collections::{HashMap, VecDeque};
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use ci_client::{Artifact, ClientError, Commit, RunSummary, Url};
use zip::write::SimpleFileOptions;

use crate::provider::CiProvider;
use crate::settings::{Settings, WatchTarget};

/// Each call to `list_successful_runs` pops the next scripted response; an
/// exhausted script answers with an empty list.
#[derive(Default)]
pub(crate) struct FakeProvider {
    pub runs: Mutex<VecDeque<ci_client::Result<Vec<RunSummary>>>>,
    pub run_calls: AtomicUsize,
    pub artifacts: Vec<Artifact>,
    pub rate_limit_artifacts: bool,
    /// Artifact id → blob URL. Ids missing here answer with a rate limit.
    pub download_urls: HashMap<u64, String>,
    pub commits: Vec<Commit>,
    pub rate_limit_commits: bool,
    pub commit_windows: Mutex<Vec<(DateTime<Utc>, DateTime<Utc>)>>,
}

impl FakeProvider {
    pub fn with_runs(script: Vec<ci_client::Result<Vec<RunSummary>>>) -> Self {
        Self {
            runs: Mutex::new(script.into()),
            ..Default::default()
        }
    }

    pub fn run_calls(&self) -> usize {
        self.run_calls.load(Ordering::SeqCst)
    }

    pub fn windows(&self) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        self.commit_windows.lock().unwrap().clone()
    }
}

fn rate_limited() -> ClientError {
    ClientError::RateLimited { reset: None }
}

impl CiProvider for FakeProvider {
    async fn list_successful_runs(&self, _target: &WatchTarget) -> ci_client::Result<Vec<RunSummary>> {
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.runs.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn list_artifacts(&self, _target: &WatchTarget, _run_id: u64) -> ci_client::Result<Vec<Artifact>> {
        if self.rate_limit_artifacts {
            return Err(rate_limited());
        }
        Ok(self.artifacts.clone())
    }

    async fn artifact_download_url(&self, _target: &WatchTarget, artifact_id: u64) -> ci_client::Result<Url> {
        match self.download_urls.get(&artifact_id) {
            Some(url) => Ok(Url::parse(url)?),
            None => Err(rate_limited()),
        }
    }

    async fn list_commits(
        &self,
        _target: &WatchTarget,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> ci_client::Result<Vec<Commit>> {
        self.commit_windows.lock().unwrap().push((since, until));
        if self.rate_limit_commits {
            return Err(rate_limited());
        }
        Ok(self.commits.clone())
    }
}

pub(crate) fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
}

pub(crate) fn run(id: u64, title: &str, day: u32) -> RunSummary {
    RunSummary {
        id,
        display_title: title.to_string(),
        created_at: at(day),
    }
}

pub(crate) fn commit(message: &str, author: &str) -> Commit {
    Commit {
        message: message.to_string(),
        author_name: author.to_string(),
        timestamp: Some(at(1)),
    }
}

pub(crate) fn artifact(id: u64, name: &str, expired: bool) -> Artifact {
    Artifact {
        id,
        name: name.to_string(),
        expired,
    }
}

pub(crate) fn settings() -> Settings {
    let mut s = Settings::new(WatchTarget {
        owner: "octo".into(),
        repo: "app".into(),
        workflow_file: "beta.yml".into(),
        branch: "dev".into(),
    });
    s.poll_delay_seconds = 0;
    s
}

/// Build an in-memory zip archive holding `entries` as `(name, contents)`.
pub(crate) fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
