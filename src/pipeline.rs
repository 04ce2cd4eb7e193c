//! Scrape orchestration.
//!
//! One run walks roster → listings → commit → detail pages. Entities and
//! filings are committed before any detail page is fetched, since detail
//! records reference filings by disclosure id. A failure on one page is
//! recorded in the [`ScrapeReport`] and the run moves on. Store errors end a
//! run early, except when committing one filing's detail records, which only
//! fails that filing.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::models::{Entity, Filing, FilingDetail};
use crate::repository::{CommitSummary, DieselError, Gateway, UnitOfWork};
use crate::scrapers::{
    determine_new, parse_disclosure_id, DetailScraper, DetailTable, HttpClient, LabeledRow,
    ListingRow, ListingScraper, RosterScraper, ScrapeError, DEFAULT_LISTING_URL,
    DEFAULT_ROSTER_URL,
};
use crate::utils::parse_identifier;

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Database error: {0}")]
    Database(#[from] DieselError),
    #[error(transparent)]
    Scrape(#[from] ScrapeError),
}

/// Where the pipeline fetches its pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub roster_url: String,
    pub listing_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            roster_url: DEFAULT_ROSTER_URL.to_string(),
            listing_url: DEFAULT_LISTING_URL.to_string(),
        }
    }
}

/// Options for one run.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Only fetch the listing of this institution.
    pub cert: Option<i64>,
    /// Cap on detail pages fetched.
    pub limit: Option<usize>,
    /// Detail pages in flight at once.
    pub workers: usize,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            cert: None,
            limit: None,
            workers: 1,
        }
    }
}

/// Stage a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Roster,
    Listing,
    Detail,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Roster => "roster",
            Self::Listing => "listing",
            Self::Detail => "detail",
        })
    }
}

/// A page that could not be scraped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    pub stage: Stage,
    /// URL or certificate number of the page.
    pub target: String,
    pub error: String,
}

/// Outcome of a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScrapeReport {
    pub entities_seen: usize,
    pub listings_fetched: usize,
    pub filings_seen: usize,
    pub details_pending: usize,
    pub details_stored: usize,
    /// Roster or listing rows that could not become records.
    pub rows_skipped: usize,
    pub stored: CommitSummary,
    pub failures: Vec<Failure>,
}

impl ScrapeReport {
    fn fail(&mut self, stage: Stage, target: impl Into<String>, error: impl std::fmt::Display) {
        let target = target.into();
        warn!("{} {} failed: {}", stage, target, error);
        self.failures.push(Failure {
            stage,
            target,
            error: error.to_string(),
        });
    }

    pub fn failures_in(&self, stage: Stage) -> usize {
        self.failures.iter().filter(|f| f.stage == stage).count()
    }
}

/// Progress events for display.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    RosterFetched { entities: usize, new: usize },
    ListingFetched { cert_number: i64, rows: usize, new: usize },
    ListingFailed { cert_number: i64, error: String },
    DetailsStarted { total: usize },
    DetailStored { url: String, records: usize },
    DetailFailed { url: String, error: String },
}

/// Roster rows that are not yet stored, plus a count of unusable rows.
///
/// `known` is extended with every returned entity.
pub fn new_entities(rows: &[LabeledRow], known: &mut HashSet<i64>) -> (Vec<Entity>, usize) {
    let mut entities = Vec::new();
    let mut skipped = 0;
    for row in rows {
        match Entity::from_row(row) {
            Ok(entity) => {
                if known.insert(entity.cert_number) {
                    entities.push(entity);
                }
            }
            Err(e) => {
                debug!("Skipping roster row: {}", e);
                skipped += 1;
            }
        }
    }
    (entities, skipped)
}

/// Listing rows of one institution that are not yet stored.
///
/// Rows without a link are ignored; rows whose link carries no usable
/// disclosure id are counted as skipped.
pub fn new_filings(
    cert_number: i64,
    rows: &[ListingRow],
    known: &mut HashSet<i64>,
) -> (Vec<Filing>, usize) {
    let mut filings = Vec::new();
    let mut skipped = 0;
    for row in rows.iter().filter(|row| row.url.is_some()) {
        match Filing::from_listing(cert_number, row) {
            Ok(filing) => {
                if known.insert(filing.disclosure_id) {
                    filings.push(filing);
                }
            }
            Err(e) => {
                debug!("Skipping listing row for {}: {}", cert_number, e);
                skipped += 1;
            }
        }
    }
    (filings, skipped)
}

/// Disclosure id a detail URL refers to.
pub fn detail_disclosure_id(url: &str) -> Result<i64, ScrapeError> {
    let raw = parse_disclosure_id(url);
    parse_identifier(&raw).ok_or(ScrapeError::InvalidIdentifier(raw))
}

/// Runs the scrape against a gateway.
pub struct Pipeline<'a, G: Gateway + ?Sized> {
    client: &'a HttpClient,
    gateway: &'a G,
    endpoints: Endpoints,
    events: Option<mpsc::Sender<PipelineEvent>>,
}

impl<'a, G: Gateway + ?Sized> Pipeline<'a, G> {
    pub fn new(client: &'a HttpClient, gateway: &'a G, endpoints: Endpoints) -> Self {
        Self {
            client,
            gateway,
            endpoints,
            events: None,
        }
    }

    /// Send progress events to `tx`.
    pub fn with_events(mut self, tx: mpsc::Sender<PipelineEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    async fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event).await;
        }
    }

    /// Run one scrape.
    pub async fn run(&self, options: &ScrapeOptions) -> Result<ScrapeReport, PipelineError> {
        let mut report = ScrapeReport::default();
        let mut unit = UnitOfWork::new();

        let roster_certs = self.stage_entities(&mut unit, &mut report).await?;
        let certs = match options.cert {
            Some(cert) => vec![cert],
            None => roster_certs,
        };
        self.stage_filings(&certs, &mut unit, &mut report).await?;

        // Filings must be durable before detail records reference them.
        report.stored += self.gateway.commit(&mut unit).await?;
        info!(
            "Stored {} entities and {} filings",
            report.stored.entities, report.stored.filings
        );

        let existing = self.gateway.existing_disclosure_ids().await?;
        let local = self.gateway.local_filings().await?;
        let mut urls = determine_new(local.iter().map(|(id, url)| (*id, url.as_str())), &existing);
        if let Some(limit) = options.limit {
            urls.truncate(limit);
        }

        self.scrape_details(urls, options.workers, &mut unit, &mut report)
            .await;
        unit.close();

        Ok(report)
    }

    /// Fetch the roster and stage unseen entities. Returns every certificate
    /// number on the roster, in page order.
    async fn stage_entities(
        &self,
        unit: &mut UnitOfWork,
        report: &mut ScrapeReport,
    ) -> Result<Vec<i64>, PipelineError> {
        let rows = match RosterScraper::new(self.client, &self.endpoints.roster_url)
            .fetch()
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                report.fail(Stage::Roster, &self.endpoints.roster_url, e);
                return Ok(Vec::new());
            }
        };

        let known = self.gateway.known_entity_ids().await?;
        let mut seen = HashSet::new();
        let (all, skipped) = new_entities(&rows, &mut seen);
        let certs: Vec<i64> = all.iter().map(|e| e.cert_number).collect();
        let fresh: Vec<Entity> = all
            .into_iter()
            .filter(|e| !known.contains(&e.cert_number))
            .collect();

        report.entities_seen = certs.len();
        report.rows_skipped += skipped;
        self.emit(PipelineEvent::RosterFetched {
            entities: certs.len(),
            new: fresh.len(),
        })
        .await;
        unit.extend(fresh);

        Ok(certs)
    }

    async fn stage_filings(
        &self,
        certs: &[i64],
        unit: &mut UnitOfWork,
        report: &mut ScrapeReport,
    ) -> Result<(), PipelineError> {
        let scraper = ListingScraper::new(self.client, &self.endpoints.listing_url);
        let mut known = self.gateway.known_disclosure_ids().await?;

        for &cert_number in certs {
            let rows = match scraper.fetch(cert_number).await {
                Ok(rows) => rows,
                Err(e) => {
                    self.emit(PipelineEvent::ListingFailed {
                        cert_number,
                        error: e.to_string(),
                    })
                    .await;
                    report.fail(Stage::Listing, cert_number.to_string(), e);
                    continue;
                }
            };

            let (filings, skipped) = new_filings(cert_number, &rows, &mut known);
            report.listings_fetched += 1;
            report.filings_seen += rows.len();
            report.rows_skipped += skipped;
            self.emit(PipelineEvent::ListingFetched {
                cert_number,
                rows: rows.len(),
                new: filings.len(),
            })
            .await;
            unit.extend(filings);
        }

        Ok(())
    }

    /// Fetch detail pages with up to `workers` in flight. Results are
    /// handled in source order and each filing is committed on its own.
    async fn scrape_details(
        &self,
        urls: Vec<String>,
        workers: usize,
        unit: &mut UnitOfWork,
        report: &mut ScrapeReport,
    ) {
        report.details_pending = urls.len();
        self.emit(PipelineEvent::DetailsStarted { total: urls.len() })
            .await;
        if urls.is_empty() {
            return;
        }

        let scraper = DetailScraper::new(self.client);
        let scraper = &scraper;
        let mut results = stream::iter(urls)
            .map(|url| async move {
                let result = fetch_detail(scraper, &url).await;
                (url, result)
            })
            .buffered(workers.max(1));

        while let Some((url, result)) = results.next().await {
            self.store_detail(url, result, unit, report).await;
        }
    }

    /// Commit one filing's detail records. A fetch or store failure is
    /// recorded against the URL; records of a failed commit are discarded so
    /// the next filing starts from an empty unit.
    async fn store_detail(
        &self,
        url: String,
        result: Result<FilingDetail, ScrapeError>,
        unit: &mut UnitOfWork,
        report: &mut ScrapeReport,
    ) {
        let error = match result {
            Ok(detail) => {
                let records = detail.len();
                unit.extend(detail.into_records());
                match self.gateway.commit(unit).await {
                    Ok(summary) => {
                        report.stored += summary;
                        report.details_stored += 1;
                        self.emit(PipelineEvent::DetailStored { url, records }).await;
                        return;
                    }
                    Err(e) => {
                        let dropped = unit.take();
                        debug!("Discarding {} records of {}", dropped.len(), url);
                        format!("Database error: {}", e)
                    }
                }
            }
            Err(e) => e.to_string(),
        };

        self.emit(PipelineEvent::DetailFailed {
            url: url.clone(),
            error: error.clone(),
        })
        .await;
        report.fail(Stage::Detail, url, error);
    }
}

async fn fetch_detail(scraper: &DetailScraper<'_>, url: &str) -> Result<FilingDetail, ScrapeError> {
    let disclosure_id = detail_disclosure_id(url)?;
    let table: DetailTable = scraper.fetch(url).await?;
    Ok(FilingDetail::from_table(disclosure_id, &table))
}
