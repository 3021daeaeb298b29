//! Source management commands.

use std::path::Path;

use console::style;

use crate::config::{Settings, SourceConfig};
use crate::models::{CollectionSource, SourceType};

use super::super::helpers::{parse_params, truncate};

/// Arguments for `source add`.
pub struct NewSourceArgs {
    pub id: String,
    pub url: String,
    pub name: Option<String>,
    pub source_type: String,
    pub config: Option<String>,
    pub params: Vec<String>,
    pub enabled: bool,
}

/// List configured sources.
pub async fn cmd_source_list(settings: &Settings) -> anyhow::Result<()> {
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;
    let sources = ctx.sources().get_all().await?;

    if sources.is_empty() {
        println!(
            "{} No sources configured. Add one with 'harvest source add'.",
            style("!").yellow()
        );
        return Ok(());
    }

    println!("\n{}", style("Collection Sources").bold());
    println!("{}", "-".repeat(78));
    println!("{:<15} {:<20} {:<8} {:<8} URL", "ID", "Name", "Type", "Enabled");
    println!("{}", "-".repeat(78));

    for source in sources {
        let enabled = if source.enabled {
            style("yes").green()
        } else {
            style("no").dim()
        };
        println!(
            "{:<15} {:<20} {:<8} {:<8} {}",
            truncate(&source.id, 14),
            truncate(&source.name, 19),
            source.source_type.as_str(),
            enabled,
            truncate(&source.url_pattern, 40)
        );
    }

    Ok(())
}

/// Register a new source after validating its configuration.
pub async fn cmd_source_add(settings: &Settings, args: NewSourceArgs) -> anyhow::Result<()> {
    let source_type = SourceType::from_str(&args.source_type)
        .ok_or_else(|| anyhow::anyhow!("Unknown source type '{}'", args.source_type))?;

    let config = match args.config.as_deref() {
        None => serde_json::Value::Null,
        Some(raw) => read_config(raw).await?,
    };
    SourceConfig::from_value(&config)?;

    let ctx = settings.create_db_context();
    ctx.init_schema().await?;
    let repo = ctx.sources();
    if repo.get(&args.id).await?.is_some() {
        anyhow::bail!("Source '{}' already exists", args.id);
    }

    let name = args.name.unwrap_or_else(|| args.id.clone());
    let mut source = CollectionSource::new(args.id, name, args.url, source_type);
    source.enabled = args.enabled;
    source.config = config;
    source.search_params = parse_params(&args.params)?;
    repo.save(&source).await?;

    println!("{} Added source: {}", style("✓").green(), source.id);
    if source.is_search() {
        println!("  Search mode: links are discovered from the result page");
    }
    Ok(())
}

/// Enable or disable a source.
pub async fn cmd_source_set_enabled(
    settings: &Settings,
    id: &str,
    enabled: bool,
) -> anyhow::Result<()> {
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;
    if !ctx.sources().set_enabled(id, enabled).await? {
        println!("{} Source '{}' not found", style("✗").red(), id);
        return Ok(());
    }
    let state = if enabled { "enabled" } else { "disabled" };
    println!("{} Source '{}' {}", style("✓").green(), id, state);
    Ok(())
}

/// Remove a source. Stored documents are kept.
pub async fn cmd_source_remove(settings: &Settings, id: &str) -> anyhow::Result<()> {
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;
    if ctx.sources().delete(id).await? {
        println!("{} Removed source '{}'", style("✓").green(), id);
    } else {
        println!("{} Source '{}' not found", style("✗").red(), id);
    }
    Ok(())
}

/// Inline JSON, or `@path` to a JSON file.
async fn read_config(raw: &str) -> anyhow::Result<serde_json::Value> {
    let text = match raw.strip_prefix('@') {
        Some(path) => tokio::fs::read_to_string(Path::new(path)).await?,
        None => raw.to_string(),
    };
    Ok(serde_json::from_str(&text)?)
}
