//! Typed records for institutions, filings and their disclosures.

mod disclosure;
mod entity;
mod filing;

pub use disclosure::{
    FilerInfo, FilingDetail, FilingInfo, Note, Trade, TradeTable, COMMON_TRADE_KEYWORDS,
    DERIVATIVE_KEYWORDS, NON_DERIVATIVE_KEYWORDS,
};
pub use entity::Entity;
pub use filing::Filing;

use serde::Serialize;

/// Any record that can be staged for persistence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Entity(Entity),
    Filing(Filing),
    FilingInfo(FilingInfo),
    FilerInfo(FilerInfo),
    Trade(Trade),
    Note(Note),
}

impl Record {
    /// Disclosure the record belongs to; `None` for entities.
    pub fn disclosure_id(&self) -> Option<i64> {
        match self {
            Self::Entity(_) => None,
            Self::Filing(r) => Some(r.disclosure_id),
            Self::FilingInfo(r) => Some(r.disclosure_id),
            Self::FilerInfo(r) => Some(r.disclosure_id),
            Self::Trade(r) => Some(r.disclosure_id),
            Self::Note(r) => Some(r.disclosure_id),
        }
    }
}

macro_rules! impl_from_record {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Record {
                fn from(record: $variant) -> Self {
                    Self::$variant(record)
                }
            }
        )*
    };
}

impl_from_record!(Entity, Filing, FilingInfo, FilerInfo, Trade, Note);

impl FilingDetail {
    /// Flatten into records, issuer and filer rows first.
    pub fn into_records(self) -> Vec<Record> {
        let mut records = Vec::with_capacity(self.len());
        records.extend(self.filing_info.into_iter().map(Record::from));
        records.extend(self.filer_info.into_iter().map(Record::from));
        records.extend(self.trades.into_iter().map(Record::from));
        records.extend(self.notes.into_iter().map(Record::from));
        records
    }
}
