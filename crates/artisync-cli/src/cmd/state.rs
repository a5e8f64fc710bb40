use crate::output::{print_fields, print_json};
use anyhow::Context;
use artisync_core::StateStore;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let store = StateStore::new(root);
    let state = store
        .load()
        .with_context(|| format!("failed to load {}", store.path().display()))?;

    if json {
        return print_json(&state);
    }

    let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
    print_fields(&[
        ("status", or_dash(&state.status)),
        ("run", state.workflow.id.to_string()),
        ("title", or_dash(&state.workflow.title)),
        ("elapsed", format!("{:.1}s", state.elapsed_seconds)),
        ("commits", or_dash(&state.commit_log)),
    ]);
    Ok(())
}
