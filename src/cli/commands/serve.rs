//! Web server command.

use console::style;

use crate::cli::helpers::parse_bind_address;
use crate::config::Settings;

/// Start the web server.
pub async fn cmd_serve(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let addr = parse_bind_address(bind);

    if settings.schedule.enabled {
        println!(
            "{} Daily collection at {:02}:{:02} UTC",
            style("→").cyan(),
            settings.schedule.hour,
            settings.schedule.minute
        );
    }
    println!("{} Starting docharvest server at http://{}", style("→").cyan(), addr);
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings, &addr).await
}
