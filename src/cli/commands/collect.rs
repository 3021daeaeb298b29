//! Foreground collection command.

use console::style;

use crate::collector::TriggerError;
use crate::config::Settings;
use crate::models::{CollectionRun, RunOutcome, UrlOutcomeKind};
use crate::server::build_collector;

use super::super::helpers::truncate;

/// Run a collection for one source, or all enabled sources, and wait for it.
pub async fn cmd_collect(
    settings: &Settings,
    source_id: Option<&str>,
    all: bool,
) -> anyhow::Result<()> {
    let collector = build_collector(settings).await?;

    let source_ids: Vec<String> = match (source_id, all) {
        (Some(id), _) => vec![id.to_string()],
        (None, true) => collector
            .db()
            .sources()
            .get_enabled()
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect(),
        (None, false) => anyhow::bail!("Specify a source ID or --all"),
    };

    if source_ids.is_empty() {
        println!("{} No enabled sources", style("!").yellow());
        return Ok(());
    }

    let mut handles = Vec::new();
    let mut rejected = 0;
    for id in &source_ids {
        match collector.trigger(id).await {
            Ok(handle) => {
                println!("{} Collecting {}", style("→").cyan(), id);
                handles.push(handle);
            }
            Err(e @ TriggerError::AlreadyRunning(_)) => {
                println!("{} {}", style("!").yellow(), e);
            }
            Err(e) => {
                println!("{} {}", style("✗").red(), e);
                rejected += 1;
            }
        }
    }

    let mut failed_runs = 0;
    for handle in handles {
        let run = handle.await?;
        if run.outcome == RunOutcome::Failed {
            failed_runs += 1;
        }
        print_run(&run);
    }

    if source_id.is_some() && rejected > 0 {
        anyhow::bail!("Collection was not started");
    }
    if failed_runs > 0 {
        anyhow::bail!("{} run(s) failed", failed_runs);
    }
    Ok(())
}

fn print_run(run: &CollectionRun) {
    let marker = match run.outcome {
        RunOutcome::Completed => style("✓").green(),
        RunOutcome::Partial => style("!").yellow(),
        RunOutcome::Failed => style("✗").red(),
    };
    println!(
        "\n{} {} [{}] {}",
        marker,
        style(&run.source_id).bold(),
        run.outcome.as_str(),
        run.message
    );

    for url in &run.urls {
        let (label, detail) = match url.kind {
            UrlOutcomeKind::Success => (style("saved").green(), None),
            UrlOutcomeKind::Unchanged => (style("unchanged").dim(), None),
            UrlOutcomeKind::Failed => (style("failed").red(), url.error.as_deref()),
        };
        match detail {
            Some(err) => println!("  {:<10} {} ({})", label, truncate(&url.url, 70), err),
            None => println!("  {:<10} {}", label, truncate(&url.url, 70)),
        }
    }
}
