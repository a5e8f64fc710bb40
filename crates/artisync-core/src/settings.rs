use crate::error::{Result, SyncError};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// WatchTarget
// ---------------------------------------------------------------------------

/// The repository, workflow file and branch being watched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchTarget {
    pub owner: String,
    pub repo: String,
    /// Workflow file name, e.g. `beta.yml`.
    #[serde(rename = "name")]
    pub workflow_file: String,
    pub branch: String,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Contents of `data/settings.json`. Read once per invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    pub workflow: WatchTarget,
    /// Seconds to sleep between polls while no new run exists.
    #[serde(rename = "delay", default = "default_delay")]
    pub poll_delay_seconds: u64,
    /// Archive entries ending with this suffix are kept.
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Output directory, relative to the root.
    #[serde(rename = "archive", default = "default_archive")]
    pub archive_dir: PathBuf,
    /// Commits whose author name contains this are left out of the log.
    #[serde(default = "default_bot_marker")]
    pub bot_marker: String,
}

fn default_delay() -> u64 {
    10
}

fn default_extension() -> String {
    ".apk".to_string()
}

fn default_archive() -> PathBuf {
    PathBuf::from("archive")
}

fn default_bot_marker() -> String {
    "(bot)".to_string()
}

impl Settings {
    pub fn new(workflow: WatchTarget) -> Self {
        Self {
            workflow,
            poll_delay_seconds: default_delay(),
            extension: default_extension(),
            archive_dir: default_archive(),
            bot_marker: default_bot_marker(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::settings_path(root);
        if !path.exists() {
            return Err(SyncError::SettingsNotFound(path));
        }
        let data = std::fs::read_to_string(&path)?;
        let settings: Settings = serde_json::from_str(&data)?;
        Ok(settings)
    }

    /// Output directory resolved against `root`.
    pub fn output_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.archive_dir)
    }

    /// Why the output directory cannot be used, if any.
    ///
    /// Cleanup deletes everything in the output directory that lacks the
    /// extension, directories included, so it must not be the root, an
    /// ancestor of the root, or anything containing `data/`. Paths are
    /// compared lexically; symlinks are not resolved.
    pub fn output_dir_conflict(&self, root: &Path) -> Option<String> {
        let out = normalize(&self.output_dir(root));
        let data = normalize(&paths::data_dir(root));
        if data.starts_with(&out) {
            return Some(format!(
                "archive '{}' contains the data directory and would be wiped by cleanup",
                self.archive_dir.display()
            ));
        }
        None
    }

    /// Checks that depend on where the settings are used from.
    pub fn validate_paths(&self, root: &Path) -> Vec<ConfigWarning> {
        self.output_dir_conflict(root)
            .map(|message| ConfigWarning {
                level: WarnLevel::Error,
                message,
            })
            .into_iter()
            .collect()
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let required = [
            ("workflow.owner", &self.workflow.owner),
            ("workflow.repo", &self.workflow.repo),
            ("workflow.name", &self.workflow.workflow_file),
            ("workflow.branch", &self.workflow.branch),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("{key} must not be empty"),
                });
            }
        }

        // A zero delay turns the long-poll into a hot loop against the API.
        if self.poll_delay_seconds == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "delay is 0: polling will not back off between requests".to_string(),
            });
        }

        if self.extension.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "extension must not be empty".to_string(),
            });
        } else if !self.extension.starts_with('.') {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "extension '{}' has no leading dot; any name ending in it will be kept",
                    self.extension
                ),
            });
        }

        warnings
    }
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
