use anyhow::{bail, Context};
use artisync_core::{io, paths};
use std::path::Path;

/// The token from `--token` / `TOKEN_PAT`, else the trimmed contents of
/// `data/github-token.txt`. Nothing found is fatal.
pub fn resolve_token(flag: Option<&str>, root: &Path) -> anyhow::Result<String> {
    if let Some(t) = flag.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(t.to_string());
    }

    let path = paths::token_path(root);
    let from_file = io::read_trimmed(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    match from_file {
        Some(t) => {
            tracing::debug!(path = %path.display(), "using token file");
            Ok(t)
        }
        None => bail!("missing GitHub token: pass --token or set TOKEN_PAT"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn flag_wins_over_file() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(paths::token_path(dir.path()), "from-file").unwrap();
        assert_eq!(resolve_token(Some("from-flag"), dir.path()).unwrap(), "from-flag");
    }

    #[test]
    fn file_is_trimmed() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(paths::token_path(dir.path()), "  ghp_abc\n").unwrap();
        assert_eq!(resolve_token(None, dir.path()).unwrap(), "ghp_abc");
    }

    #[test]
    fn blank_flag_and_no_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = resolve_token(Some("  "), dir.path()).unwrap_err();
        assert!(err.to_string().contains("missing GitHub token"));
    }
}
