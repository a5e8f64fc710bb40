use chrono::{DateTime, Utc};
use ci_client::Commit;

use crate::error::Result;
use crate::provider::CiProvider;
use crate::settings::Settings;
use crate::state::StateStore;

/// Render commits as a changelog, one `- <message> ~<author>` line each.
///
/// Messages are trimmed at both ends; inner newlines of multi-line messages
/// are kept. Commits whose author name contains `bot_marker` are skipped.
/// Provider order is preserved.
pub fn render_commit_log(commits: &[Commit], bot_marker: &str) -> String {
    commits
        .iter()
        .filter(|c| bot_marker.is_empty() || !c.author_name.contains(bot_marker))
        .map(|c| format!("- {} ~{}", c.message.trim(), c.author_name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fetch the commits of the tracked branch in `[since, until)`, render them
/// and store the result as the commit log.
///
/// The log is written even when it renders empty, so a window holding only
/// bot commits does not leave the previous run's log behind. On a rate limit
/// the status is recorded and the stored log is left alone.
pub async fn collect_commits<P: CiProvider>(
    provider: &P,
    settings: &Settings,
    store: &StateStore,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<String> {
    tracing::info!(%since, %until, branch = %settings.workflow.branch, "collecting commit history");
    let commits = provider
        .list_commits(&settings.workflow, since, until)
        .await
        .map_err(|e| store.note(e))?;

    // The API window is inclusive at `until`; the new run's own instant
    // belongs to the next window.
    let in_window: Vec<Commit> = commits
        .into_iter()
        .filter(|c| c.timestamp.map_or(true, |t| t < until))
        .collect();

    let log = render_commit_log(&in_window, &settings.bot_marker);
    let lines = if log.is_empty() { 0 } else { log.lines().count() };
    store.update(|s| s.commit_log = log.clone())?;
    tracing::info!(commits = in_window.len(), lines, "commit history updated");
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SyncState;
    use crate::test_support::{at, commit, settings, FakeProvider};
    use crate::SyncError;
    use tempfile::TempDir;

    #[test]
    fn bot_authors_are_filtered_and_lines_formatted() {
        let commits = vec![
            commit("\n  Fix login crash  \r\n", "Ana"),
            commit("Bump deps", "dependabot[bot] (bot)"),
        ];
        assert_eq!(render_commit_log(&commits, "(bot)"), "- Fix login crash ~Ana");
    }

    #[test]
    fn lines_are_joined_without_trailing_newline() {
        let commits = vec![commit("one", "A"), commit("two", "B")];
        assert_eq!(render_commit_log(&commits, "(bot)"), "- one ~A\n- two ~B");
    }

    #[test]
    fn bot_commit_in_the_middle_leaves_no_gap() {
        let commits = vec![
            commit("one", "A"),
            commit("auto", "ci (bot)"),
            commit("two", "B"),
        ];
        assert_eq!(render_commit_log(&commits, "(bot)"), "- one ~A\n- two ~B");
    }

    #[test]
    fn empty_marker_filters_nothing() {
        let commits = vec![commit("auto", "ci (bot)")];
        assert_eq!(render_commit_log(&commits, ""), "- auto ~ci (bot)");
    }

    #[tokio::test]
    async fn collect_stores_log_and_queries_window() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());
        store.save(&SyncState::with_status("success")).unwrap();
        let provider = FakeProvider {
            commits: vec![commit("Add player", "Ana"), commit("sync", "bot (bot)")],
            ..Default::default()
        };

        let log = collect_commits(&provider, &settings(), &store, at(1), at(2))
            .await
            .unwrap();

        assert_eq!(log, "- Add player ~Ana");
        assert_eq!(provider.windows(), vec![(at(1), at(2))]);
        let state = store.load().unwrap();
        assert_eq!(state.commit_log, "- Add player ~Ana");
        assert_eq!(state.status, "success");
    }

    #[tokio::test]
    async fn commit_at_window_end_is_excluded() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());
        let mut late = commit("belongs to next run", "Ana");
        late.timestamp = Some(at(2));
        let provider = FakeProvider {
            commits: vec![late, commit("in window", "Bo")],
            ..Default::default()
        };

        let log = collect_commits(&provider, &settings(), &store, at(1), at(2))
            .await
            .unwrap();
        assert_eq!(log, "- in window ~Bo");
    }

    #[tokio::test]
    async fn all_bot_window_replaces_previous_log() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());
        store.save(&SyncState::with_commit_log("- stale ~old")).unwrap();
        let provider = FakeProvider {
            commits: vec![commit("sync", "bot (bot)")],
            ..Default::default()
        };

        collect_commits(&provider, &settings(), &store, at(1), at(2))
            .await
            .unwrap();
        assert_eq!(store.load().unwrap().commit_log, "");
    }

    #[tokio::test]
    async fn rate_limit_records_status_and_keeps_log() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());
        store.save(&SyncState::with_commit_log("- previous ~ana")).unwrap();
        let provider = FakeProvider {
            rate_limit_commits: true,
            ..Default::default()
        };

        let err = collect_commits(&provider, &settings(), &store, at(1), at(2))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::RateLimited));
        let state = store.load().unwrap();
        assert_eq!(state.status, "hit rate limit");
        assert_eq!(state.commit_log, "- previous ~ana");
    }
}
