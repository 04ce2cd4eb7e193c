//! Inspect command: fetch and print one disclosure page.

use console::style;

use crate::cli::helpers::spinner;
use crate::config::Settings;
use crate::models::FilingDetail;
use crate::pipeline::detail_disclosure_id;
use crate::scrapers::{DetailScraper, DetailTable, SectionRows};

/// Fetch a detail page and print its sections without storing anything.
pub async fn cmd_inspect(settings: &Settings, url: &str, json: bool) -> anyhow::Result<()> {
    let client = settings.create_http_client()?;

    let pb = spinner(format!("Fetching {}", url));
    let table = DetailScraper::new(&client).fetch(url).await;
    pb.finish_and_clear();
    let table = table?;

    if json {
        // Pages without a usable id still print, numbered as 0.
        let disclosure_id = detail_disclosure_id(url).unwrap_or_default();
        let detail = FilingDetail::from_table(disclosure_id, &table);
        println!("{}", serde_json::to_string_pretty(&detail.into_records())?);
        return Ok(());
    }

    print_table(&table);
    Ok(())
}

fn print_table(table: &DetailTable) {
    for (section, rows) in table.sections() {
        println!(
            "{} {} ({} rows)",
            style("→").cyan(),
            style(section.heading()).bold(),
            rows.len()
        );
        match rows {
            SectionRows::Labeled(rows) => {
                for (i, row) in rows.iter().enumerate() {
                    println!("  {}", style(format!("row {}", i + 1)).dim());
                    for (header, value) in row.iter() {
                        println!("    {}: {}", header, value);
                    }
                }
            }
            SectionRows::Plain(rows) => {
                for row in rows {
                    println!("  {}", row);
                }
            }
        }
    }

    match table.exit_filing() {
        Some(true) => println!("{} Exit filing: yes", style("!").yellow()),
        Some(false) => println!("  {} Exit filing: no", style("→").dim()),
        None => println!("  {} Exit filing: not indicated", style("→").dim()),
    }
}
