//! In-memory staging of records awaiting a commit.

use tracing::warn;

use crate::models::Record;

/// Records staged for one transaction.
///
/// A unit of work starts open. Adding to a closed unit is logged and ignored
/// so a misplaced call never aborts a scrape.
#[derive(Debug, Default)]
pub struct UnitOfWork {
    staged: Vec<Record>,
    closed: bool,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a record. Returns `false` if the unit is closed.
    pub fn add(&mut self, record: impl Into<Record>) -> bool {
        let record = record.into();
        if self.closed {
            warn!(
                "Unit of work is closed; dropping {:?} record for disclosure {:?}",
                record_kind(&record),
                record.disclosure_id()
            );
            return false;
        }
        self.staged.push(record);
        true
    }

    /// Stage several records, returning how many were accepted.
    pub fn extend<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator,
        I::Item: Into<Record>,
    {
        records
            .into_iter()
            .map(|record| self.add(record))
            .filter(|added| *added)
            .count()
    }

    pub fn staged(&self) -> &[Record] {
        &self.staged
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    pub fn is_open(&self) -> bool {
        !self.closed
    }

    /// End the unit. Anything still staged is discarded.
    pub fn close(&mut self) {
        if !self.staged.is_empty() {
            warn!(
                "Closing unit of work with {} uncommitted records",
                self.staged.len()
            );
        }
        self.staged.clear();
        self.closed = true;
    }

    /// Drain staged records in dependency order: entities, then filings,
    /// then everything that references a filing.
    pub(crate) fn take(&mut self) -> Vec<Record> {
        let mut records = std::mem::take(&mut self.staged);
        records.sort_by_key(dependency_rank);
        records
    }

    /// Put records back after a failed commit.
    pub(crate) fn restore(&mut self, mut records: Vec<Record>) {
        records.append(&mut self.staged);
        self.staged = records;
    }
}

fn dependency_rank(record: &Record) -> u8 {
    match record {
        Record::Entity(_) => 0,
        Record::Filing(_) => 1,
        _ => 2,
    }
}

fn record_kind(record: &Record) -> &'static str {
    match record {
        Record::Entity(_) => "entity",
        Record::Filing(_) => "filing",
        Record::FilingInfo(_) => "filing_info",
        Record::FilerInfo(_) => "filer_info",
        Record::Trade(_) => "trade",
        Record::Note(_) => "note",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Entity, Note};

    fn entity(cert_number: i64) -> Entity {
        Entity {
            cert_number,
            bank_name: None,
            city: None,
            state: None,
        }
    }

    fn note(disclosure_id: i64) -> Note {
        Note {
            disclosure_id,
            note_number: 1,
            footnote: "(1) text".to_string(),
        }
    }

    #[test]
    fn test_add_after_close_is_ignored() {
        let mut unit = UnitOfWork::new();
        assert!(unit.add(entity(1)));
        unit.close();
        assert!(!unit.is_open());
        assert!(unit.is_empty());
        assert!(!unit.add(entity(2)));
        assert_eq!(unit.extend([entity(3), entity(4)]), 0);
        assert!(unit.is_empty());
    }

    #[test]
    fn test_take_orders_by_dependency() {
        let mut unit = UnitOfWork::new();
        unit.add(note(10));
        unit.add(entity(1));
        unit.add(note(11));
        let records = unit.take();
        assert!(matches!(records[0], Record::Entity(_)));
        assert_eq!(records[1].disclosure_id(), Some(10));
        assert_eq!(records[2].disclosure_id(), Some(11));
        assert!(unit.is_empty());
        assert!(unit.is_open());
    }

    #[test]
    fn test_restore_keeps_new_records_after_old() {
        let mut unit = UnitOfWork::new();
        unit.add(note(1));
        let records = unit.take();
        unit.add(note(2));
        unit.restore(records);
        let ids: Vec<_> = unit.staged().iter().map(Record::disclosure_id).collect();
        assert_eq!(ids, vec![Some(1), Some(2)]);
    }
}
