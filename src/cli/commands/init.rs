//! Initialize command.

use console::style;

use crate::config::{write_default_config, Config, Settings, DEFAULT_CONFIG_FILENAME};

/// Initialize the data directory, config file and database.
pub async fn cmd_init(settings: &Settings, config: &Config) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    // A config that was loaded stays where it is.
    match config.source_path {
        Some(ref path) => println!(
            "  {} Using config: {}",
            style("→").dim(),
            path.display()
        ),
        None => {
            let path = settings.data_dir.join(DEFAULT_CONFIG_FILENAME);
            if let Some(written) = write_default_config(settings, &path)? {
                println!(
                    "  {} Wrote config: {}",
                    style("✓").green(),
                    written.display()
                );
            }
        }
    }

    let ctx = settings.create_db_context();
    ctx.init_schema().await?;
    let tables = ctx.list_tables().await?;

    println!(
        "{} Initialized part335 in {} ({} tables)",
        style("✓").green(),
        settings.data_dir.display(),
        tables.len()
    );

    Ok(())
}
