//! Log listing command.

use console::style;

use crate::config::Settings;
use crate::models::LogStatus;
use crate::repository::LogQuery;

use super::super::helpers::truncate;

/// Print per-URL log entries, newest first.
pub async fn cmd_logs(
    settings: &Settings,
    source: Option<String>,
    status: Option<&str>,
    limit: i64,
) -> anyhow::Result<()> {
    let status = status
        .map(|s| {
            LogStatus::from_str(s).ok_or_else(|| {
                anyhow::anyhow!("Unknown status '{}' (success, failed, skipped)", s)
            })
        })
        .transpose()?;

    let ctx = settings.create_db_context();
    ctx.init_schema().await?;
    let logs = ctx
        .logs()
        .list_logs(&LogQuery {
            source_id: source,
            status,
            limit: Some(limit),
        })
        .await?;

    if logs.is_empty() {
        println!("{} No log entries", style("!").yellow());
        return Ok(());
    }

    for log in logs {
        let status = match log.status {
            LogStatus::Success => style(log.status.as_str()).green(),
            LogStatus::Skipped => style(log.status.as_str()).dim(),
            LogStatus::Failed => style(log.status.as_str()).red(),
        };
        println!(
            "{} {:<12} {:<8} {}",
            log.executed_at.format("%Y-%m-%d %H:%M:%S"),
            truncate(&log.source_id, 12),
            status,
            log.url
        );
        if let Some(err) = log.error_message {
            println!("    {}", style(err).dim());
        }
    }
    Ok(())
}
