//! Initialize command.

use console::style;

use crate::config::Settings;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    println!(
        "{} Initialized docharvest in {}",
        style("✓").green(),
        settings.data_dir.display()
    );
    println!("  Database: {}", settings.database_url());
    println!("  Collections: {}", settings.collections_dir.display());
    println!("  Add a source with 'harvest source add <ID> <URL>'");

    Ok(())
}
