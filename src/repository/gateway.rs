//! The persistence contract the scrape pipeline depends on.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Serialize;

use super::diesel_pool::DieselError;
use super::unit_of_work::UnitOfWork;

/// Rows actually inserted by one commit, per relation.
///
/// Records already present are ignored by the store and not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub entities: usize,
    pub filings: usize,
    pub filing_info: usize,
    pub filer_info: usize,
    pub trades: usize,
    pub notes: usize,
    /// Staged records that were already stored.
    pub ignored: usize,
}

impl CommitSummary {
    pub fn inserted(&self) -> usize {
        self.entities + self.filings + self.filing_info + self.filer_info + self.trades + self.notes
    }
}

impl std::ops::AddAssign for CommitSummary {
    fn add_assign(&mut self, other: Self) {
        self.entities += other.entities;
        self.filings += other.filings;
        self.filing_info += other.filing_info;
        self.filer_info += other.filer_info;
        self.trades += other.trades;
        self.notes += other.notes;
        self.ignored += other.ignored;
    }
}

/// Existence checks and idempotent storage for scraped records.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn entity_exists(&self, cert_number: i64) -> Result<bool, DieselError>;

    /// Certificate numbers of every stored entity.
    async fn known_entity_ids(&self) -> Result<HashSet<i64>, DieselError>;

    async fn filing_exists(&self, disclosure_id: i64) -> Result<bool, DieselError>;

    /// Disclosure ids of every stored filing.
    async fn known_disclosure_ids(&self) -> Result<HashSet<i64>, DieselError>;

    /// Disclosure ids that already have detail records, taken as the union of
    /// the filing-info and filer-info relations.
    async fn existing_disclosure_ids(&self) -> Result<HashSet<i64>, DieselError>;

    /// Disclosure id and detail URL of every stored filing that has a URL.
    async fn local_filings(&self) -> Result<Vec<(i64, String)>, DieselError>;

    /// Write everything staged in `unit` in one transaction.
    ///
    /// On success the unit is emptied and stays open. On failure nothing is
    /// written and the records remain staged.
    async fn commit(&self, unit: &mut UnitOfWork) -> Result<CommitSummary, DieselError>;
}
