//! Status command.

use console::style;

use crate::config::Settings;

/// Print row counts per table.
pub async fn cmd_status(settings: &Settings) -> anyhow::Result<()> {
    if !settings.database_exists() {
        println!(
            "{} No database at {}",
            style("!").yellow(),
            settings.database_path().display()
        );
        println!("  {} Run 'part335 init' first", style("→").dim());
        return Ok(());
    }

    let ctx = settings.create_db_context();
    let counts = ctx.table_counts().await?;

    println!("{} {}", style("→").cyan(), settings.database_url());
    for (table, count) in counts {
        println!("  {:<12} {:>10}", table, count);
    }

    Ok(())
}
