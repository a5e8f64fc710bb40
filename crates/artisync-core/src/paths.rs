use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Layout constants
// ---------------------------------------------------------------------------

pub const DATA_DIR: &str = "data";
pub const SETTINGS_FILE: &str = "data/settings.json";
pub const STATE_FILE: &str = "data/info.json";
pub const TOKEN_FILE: &str = "data/github-token.txt";

/// Set by GitHub Actions to the checkout directory of the running job.
pub const WORKSPACE_ENV: &str = "GITHUB_WORKSPACE";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn data_dir(root: &Path) -> PathBuf {
    root.join(DATA_DIR)
}

pub fn settings_path(root: &Path) -> PathBuf {
    root.join(SETTINGS_FILE)
}

pub fn state_path(root: &Path) -> PathBuf {
    root.join(STATE_FILE)
}

pub fn token_path(root: &Path) -> PathBuf {
    root.join(TOKEN_FILE)
}
