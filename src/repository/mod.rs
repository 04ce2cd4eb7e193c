//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking
//! against a SQLite file.

pub mod diesel_context;
pub mod diesel_gateway;
pub mod diesel_models;
pub mod diesel_pool;
pub mod gateway;
pub mod unit_of_work;
pub mod util;

pub use diesel_context::{DieselDbContext, TABLES};
pub use diesel_gateway::DieselGateway;
pub use diesel_pool::{AsyncSqlitePool, DieselError};
pub use gateway::{CommitSummary, Gateway};
pub use unit_of_work::UnitOfWork;

use chrono::NaiveDate;

/// Storage format for dates.
const STORED_DATE_FORMAT: &str = "%Y-%m-%d";

/// Format an optional date for storage.
pub fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(STORED_DATE_FORMAT).to_string())
}

/// Parse a stored date, treating unreadable values as absent.
pub fn parse_stored_date(s: Option<String>) -> Option<NaiveDate> {
    s.and_then(|s| NaiveDate::parse_from_str(&s, STORED_DATE_FORMAT).ok())
}
