use artisync_core::paths::WORKSPACE_ENV;
use std::path::{Path, PathBuf};

/// Resolve the working root.
///
/// Priority:
/// 1. `--root` flag / `ARTISYNC_ROOT` env var (passed in as `explicit`)
/// 2. `GITHUB_WORKSPACE`, when running inside a CI job
/// 3. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    let workspace = std::env::var_os(WORKSPACE_ENV).map(PathBuf::from);
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    resolve_root_from(explicit, workspace, cwd)
}

fn resolve_root_from(explicit: Option<&Path>, workspace: Option<PathBuf>, cwd: PathBuf) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    match workspace {
        Some(w) if !w.as_os_str().is_empty() => w,
        _ => cwd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_root_from(
            Some(dir.path()),
            Some(PathBuf::from("/ci/workspace")),
            PathBuf::from("/cwd"),
        );
        assert_eq!(result, dir.path());
    }

    #[test]
    fn workspace_beats_cwd() {
        let result = resolve_root_from(None, Some(PathBuf::from("/ci/workspace")), PathBuf::from("/cwd"));
        assert_eq!(result, PathBuf::from("/ci/workspace"));
    }

    #[test]
    fn empty_workspace_falls_back_to_cwd() {
        let result = resolve_root_from(None, Some(PathBuf::new()), PathBuf::from("/cwd"));
        assert_eq!(result, PathBuf::from("/cwd"));
        assert_eq!(resolve_root_from(None, None, PathBuf::from("/cwd")), PathBuf::from("/cwd"));
    }
}
