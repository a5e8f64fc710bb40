//! Artifact download and extraction.
//!
//! ```text
//! list_artifacts(run)
//!     │
//!     ▼  run_parallel, one unit per artifact
//! expired? ── yes ──▶ skip
//!     │ no
//!     ▼
//! download URL ─▶ stream to <out>/<filename> ─▶ extract *<ext> entries
//!     │
//!     ▼  full join
//! cleanup: delete everything in <out> not ending in <ext>
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use ci_client::{Artifact, Url};
use futures::StreamExt;
use reqwest::header::CONTENT_DISPOSITION;
use tokio::io::AsyncWriteExt;
use zip::ZipArchive;

use crate::disposition;
use crate::error::{Result, SyncError};
use crate::parallel::run_parallel;
use crate::provider::CiProvider;
use crate::settings::{Settings, WatchTarget};
use crate::state::{StateStore, SyncState};

pub const SUCCESS_STATUS: &str = "success";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Longest silence tolerated between two reads of a download. A stalled blob
/// server fails its own unit instead of holding up the join.
const READ_TIMEOUT: Duration = Duration::from_secs(60);

// ─── ArtifactPipeline ─────────────────────────────────────────────────────

/// Downloads a run's artifacts into one output directory and leaves only the
/// files carrying the target extension behind.
///
/// Concurrent units share the output directory. Names are not de-duplicated:
/// two archives or entries with the same file name overwrite each other.
pub struct ArtifactPipeline<P> {
    provider: Arc<P>,
    http: reqwest::Client,
    target: Arc<WatchTarget>,
    out_dir: Arc<Path>,
    extension: Arc<str>,
}

impl<P> Clone for ArtifactPipeline<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            http: self.http.clone(),
            target: Arc::clone(&self.target),
            out_dir: Arc::clone(&self.out_dir),
            extension: Arc::clone(&self.extension),
        }
    }
}

impl<P: CiProvider> ArtifactPipeline<P> {
    pub fn new(provider: Arc<P>, settings: &Settings, root: &Path) -> Result<Self> {
        Self::with_timeouts(provider, settings, root, CONNECT_TIMEOUT, READ_TIMEOUT)
    }

    /// Refuses an output directory that would take `data/` down with it on
    /// cleanup.
    pub fn with_timeouts(
        provider: Arc<P>,
        settings: &Settings,
        root: &Path,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self> {
        let out_dir = settings.output_dir(root);
        if let Some(reason) = settings.output_dir_conflict(root) {
            return Err(SyncError::UnsafeOutputDir {
                path: out_dir,
                reason,
            });
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("artisync/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .build()?;
        Ok(Self {
            provider,
            http,
            target: Arc::new(settings.workflow.clone()),
            out_dir: Arc::from(out_dir),
            extension: Arc::from(settings.extension.as_str()),
        })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Fetch and extract every artifact of `run_id`, then clean the output
    /// directory.
    ///
    /// The cleanup always runs, after every dispatched unit has finished,
    /// whether or not one of them failed. The outcome is recorded as the
    /// status: `"success"`, or the first captured error.
    pub async fn sync(&self, run_id: u64, store: &StateStore) -> Result<()> {
        let fetched = self.fetch_all(run_id, store).await;
        let cleaned = self.cleanup().await;
        let outcome = fetched.and(cleaned);

        let status = match &outcome {
            Ok(()) => SUCCESS_STATUS.to_string(),
            Err(e) => e.status(),
        };
        store.merge_update(SyncState::with_status(status))?;

        match &outcome {
            Ok(()) => tracing::info!(run_id, dir = %self.out_dir.display(), "artifacts synced"),
            Err(e) => tracing::error!(run_id, error = %e, "artifact sync failed"),
        }
        outcome
    }

    async fn fetch_all(&self, run_id: u64, store: &StateStore) -> Result<()> {
        let artifacts = self
            .provider
            .list_artifacts(&self.target, run_id)
            .await
            .map_err(|e| store.note(e))?;
        tracing::info!(run_id, count = artifacts.len(), "fetching artifacts");

        crate::io::ensure_dir(&self.out_dir)?;

        run_parallel(artifacts, |artifact| {
            let this = self.clone();
            async move {
                match this.fetch_one(artifact).await {
                    Err(SyncError::ArtifactExpired(name)) => {
                        tracing::warn!(artifact = %name, "artifact expired, skipping");
                        Ok(())
                    }
                    other => other,
                }
            }
        })
        .await
    }

    async fn fetch_one(&self, artifact: Artifact) -> Result<()> {
        if artifact.expired {
            return Err(SyncError::ArtifactExpired(artifact.name));
        }
        let url = self
            .provider
            .artifact_download_url(&self.target, artifact.id)
            .await?;
        let archive = self.download(&artifact, url).await?;
        extract_matching(archive, Arc::clone(&self.out_dir), Arc::clone(&self.extension)).await
    }

    /// Stream the archive at `url` into the output directory, named after the
    /// response's `Content-Disposition` filename (or `<artifact>.zip`).
    ///
    /// Transport errors are stripped of the URL, which carries a signature.
    async fn download(&self, artifact: &Artifact, url: Url) -> Result<PathBuf> {
        let transfer = |e: reqwest::Error| SyncError::Transfer {
            artifact: artifact.name.clone(),
            source: e.without_url(),
        };

        let resp = self.http.get(url).send().await.map_err(transfer)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SyncError::DownloadStatus {
                artifact: artifact.name.clone(),
                status: status.as_u16(),
            });
        }

        let name = resp
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition::filename)
            .or_else(|| disposition::sanitize(&format!("{}.zip", artifact.name)))
            .unwrap_or_else(|| format!("artifact-{}.zip", artifact.id));
        let path = self.out_dir.join(&name);

        let mut file = tokio::fs::File::create(&path).await?;
        let mut body = resp.bytes_stream();
        while let Some(chunk) = body.next().await {
            file.write_all(&chunk.map_err(transfer)?).await?;
        }
        file.flush().await?;

        tracing::info!(artifact = %artifact.name, file = %name, "downloaded artifact");
        Ok(path)
    }

    /// Delete every entry of the output directory whose name does not end
    /// with the extension. Directories are removed recursively.
    async fn cleanup(&self) -> Result<()> {
        let mut dir = match tokio::fs::read_dir(&*self.out_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let mut doomed = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let is_file = entry.file_type().await?.is_file();
            let matches = entry.file_name().to_string_lossy().ends_with(&*self.extension);
            if !(is_file && matches) {
                doomed.push(entry.path());
            }
        }

        tracing::debug!(count = doomed.len(), "removing non-matching entries");
        run_parallel(doomed, |path| async move {
            let meta = tokio::fs::symlink_metadata(&path).await?;
            if meta.is_dir() {
                tokio::fs::remove_dir_all(&path).await?;
            } else {
                tokio::fs::remove_file(&path).await?;
            }
            tracing::debug!(path = %path.display(), "removed");
            Ok::<(), SyncError>(())
        })
        .await
    }
}

// ─── Extraction ───────────────────────────────────────────────────────────

/// Extract every entry of `archive` whose name ends with `extension` into
/// `out_dir`, flattened to the entry's base name. One unit per entry.
async fn extract_matching(archive: PathBuf, out_dir: Arc<Path>, extension: Arc<str>) -> Result<()> {
    let entries = {
        let archive = archive.clone();
        tokio::task::spawn_blocking(move || matching_entries(&archive, &extension)).await??
    };

    run_parallel(entries, |entry| {
        let archive = archive.clone();
        let out_dir = Arc::clone(&out_dir);
        async move {
            tokio::task::spawn_blocking(move || extract_entry(&archive, &entry, &out_dir))
                .await
                .map_err(SyncError::from)?
        }
    })
    .await
}

fn matching_entries(archive: &Path, extension: &str) -> Result<Vec<String>> {
    let mut zip = ZipArchive::new(File::open(archive)?)?;
    let mut names = Vec::new();
    for i in 0..zip.len() {
        let entry = zip.by_index(i)?;
        if !entry.is_dir() && entry.name().ends_with(extension) {
            names.push(entry.name().to_string());
        }
    }
    Ok(names)
}

/// Each unit opens its own reader; a `ZipArchive` is not shared across
/// threads.
fn extract_entry(archive: &Path, entry: &str, out_dir: &Path) -> Result<()> {
    let Some(base) = disposition::sanitize(entry) else {
        tracing::warn!(entry, "skipping archive entry without a usable file name");
        return Ok(());
    };
    let mut zip = ZipArchive::new(File::open(archive)?)?;
    let mut reader = zip.by_name(entry)?;
    let dest = out_dir.join(&base);
    let mut out = File::create(&dest)?;
    if let Err(e) = std::io::copy(&mut reader, &mut out) {
        drop(out);
        let _ = std::fs::remove_file(&dest);
        return Err(e.into());
    }
    tracing::info!(file = %base, "extracted");
    Ok(())
}

// ─── Tests ────────────────────────────────────────────────────────────────
