//! Scrape command: roster, listings and detail pages.

use console::style;
use indicatif::ProgressBar;
use tokio::sync::mpsc;

use crate::cli::helpers::{batch_progress, spinner, truncate};
use crate::config::Settings;
use crate::pipeline::{Pipeline, PipelineEvent, ScrapeOptions, ScrapeReport, Stage};

/// Run one harvest and print a summary.
pub async fn cmd_scrape(
    settings: &Settings,
    cert: Option<i64>,
    limit: Option<usize>,
    workers: Option<usize>,
) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let ctx = settings.create_db_context();
    ctx.init_schema().await?;
    let gateway = ctx.gateway();
    let client = settings.create_http_client()?;

    let options = ScrapeOptions {
        cert,
        limit,
        workers: workers.unwrap_or(settings.workers).max(1),
    };

    println!(
        "{} Scraping {} ({} worker{})",
        style("→").cyan(),
        match cert {
            Some(cert) => format!("institution {}", cert),
            None => "all institutions".to_string(),
        },
        options.workers,
        if options.workers == 1 { "" } else { "s" }
    );

    // Event channel for progress updates
    let (event_tx, event_rx) = mpsc::channel::<PipelineEvent>(100);
    let event_handler = tokio::spawn(handle_events(event_rx));

    let report = {
        let pipeline =
            Pipeline::new(&client, &gateway, settings.endpoints()).with_events(event_tx);
        pipeline.run(&options).await
    };

    // The sender is gone with the pipeline, so the handler drains and exits.
    if let Err(e) = event_handler.await {
        tracing::warn!("Event handler task failed: {}", e);
    }

    print_report(&report?);
    Ok(())
}

/// Drive the spinner and progress bar from pipeline events.
async fn handle_events(mut event_rx: mpsc::Receiver<PipelineEvent>) {
    let mut listing_spinner: Option<ProgressBar> = Some(spinner("Fetching roster..."));
    let mut detail_bar: Option<ProgressBar> = None;
    let mut listings = 0usize;

    while let Some(event) = event_rx.recv().await {
        match event {
            PipelineEvent::RosterFetched { entities, new } => {
                if let Some(ref pb) = listing_spinner {
                    pb.println(format!(
                        "  {} Roster: {} institutions ({} new)",
                        style("✓").green(),
                        entities,
                        new
                    ));
                    pb.set_message("Fetching listings...");
                }
            }
            PipelineEvent::ListingFetched {
                cert_number, new, ..
            } => {
                listings += 1;
                if let Some(ref pb) = listing_spinner {
                    pb.set_message(format!(
                        "Listings: {} fetched (last {}, {} new)",
                        listings, cert_number, new
                    ));
                }
            }
            PipelineEvent::ListingFailed { cert_number, error } => {
                let line = format!(
                    "  {} Listing {} failed: {}",
                    style("✗").red(),
                    cert_number,
                    error
                );
                match listing_spinner {
                    Some(ref pb) => pb.println(line),
                    None => eprintln!("{}", line),
                }
            }
            PipelineEvent::DetailsStarted { total } => {
                if let Some(pb) = listing_spinner.take() {
                    pb.finish_and_clear();
                }
                if total > 0 {
                    detail_bar = Some(batch_progress(total as u64));
                }
            }
            PipelineEvent::DetailStored { url, records } => {
                if let Some(ref pb) = detail_bar {
                    pb.set_message(format!("{} ({} records)", truncate(&url, 60), records));
                    pb.inc(1);
                }
            }
            PipelineEvent::DetailFailed { url, error } => match detail_bar {
                Some(ref pb) => {
                    pb.println(format!(
                        "  {} Failed {}: {}",
                        style("✗").red(),
                        url,
                        error
                    ));
                    pb.inc(1);
                }
                None => eprintln!("  {} Failed {}: {}", style("✗").red(), url, error),
            },
        }
    }

    if let Some(pb) = listing_spinner {
        pb.finish_and_clear();
    }
    if let Some(pb) = detail_bar {
        pb.finish_and_clear();
    }
}

fn print_report(report: &ScrapeReport) {
    let stored = &report.stored;
    println!(
        "{} Stored {} entities, {} filings, {} disclosure pages",
        style("✓").green(),
        stored.entities,
        stored.filings,
        report.details_stored
    );
    println!(
        "  {} {} issuer rows, {} filer rows, {} trades, {} notes",
        style("→").dim(),
        stored.filing_info,
        stored.filer_info,
        stored.trades,
        stored.notes
    );
    if report.details_pending == 0 {
        println!("  {} No new disclosure pages", style("→").dim());
    }
    if report.rows_skipped > 0 {
        println!(
            "{} Skipped {} unusable roster or listing rows",
            style("!").yellow(),
            report.rows_skipped
        );
    }
    if stored.ignored > 0 {
        println!(
            "{} {} records were already stored",
            style("!").yellow(),
            stored.ignored
        );
    }
    if !report.failures.is_empty() {
        println!(
            "{} {} failures (roster {}, listings {}, details {})",
            style("✗").red(),
            report.failures.len(),
            report.failures_in(Stage::Roster),
            report.failures_in(Stage::Listing),
            report.failures_in(Stage::Detail)
        );
        for failure in &report.failures {
            println!(
                "  {} [{}] {}: {}",
                style("✗").red(),
                failure.stage,
                failure.target,
                failure.error
            );
        }
    }
}
