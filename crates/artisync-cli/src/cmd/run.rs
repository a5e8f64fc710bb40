use crate::output::print_json;
use crate::token::resolve_token;
use anyhow::{bail, Context};
use artisync_core::settings::WarnLevel;
use artisync_core::{paths, Settings, Syncer};
use ci_client::GitHubClient;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub fn run(root: &Path, token: Option<&str>, json: bool) -> anyhow::Result<()> {
    // Startup checks come first: nothing is written until they pass.
    let token = resolve_token(token, root)?;
    let settings = Settings::load(root).context("failed to load settings")?;

    let mut warnings = settings.validate();
    warnings.extend(settings.validate_paths(root));
    for w in &warnings {
        match w.level {
            WarnLevel::Warning => eprintln!("warning: {}", w.message),
            WarnLevel::Error => eprintln!("invalid setting: {}", w.message),
        }
    }
    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        bail!(
            "refusing to start with invalid settings in {}",
            paths::settings_path(root).display()
        );
    }

    let client = GitHubClient::new(token).context("failed to build GitHub client")?;
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async move {
        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();
        // The first Ctrl-C only interrupts the long-poll wait. Downloads
        // already dispatched cannot be cancelled, so a second one exits.
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            tracing::warn!("interrupt received, stopping; press Ctrl-C again to abort");
            signal.cancel();
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("error: aborted");
                std::process::exit(130);
            }
        });

        tracing::info!(
            owner = %settings.workflow.owner,
            repo = %settings.workflow.repo,
            workflow = %settings.workflow.workflow_file,
            branch = %settings.workflow.branch,
            root = %root.display(),
            "starting sync"
        );

        let syncer = Syncer::new(Arc::new(client), settings, root).with_shutdown(shutdown);
        let outcome = syncer.run().await?;

        if json {
            print_json(&outcome)?;
        } else {
            println!(
                "synced run {} ({}) in {:.1}s",
                outcome.run.id, outcome.run.title, outcome.state.elapsed_seconds
            );
        }
        Ok::<(), anyhow::Error>(())
    })
}
