//! part335 - FDIC Part 335 insider-trading disclosure harvester.
//!
//! Scrapes the roster of FDIC-supervised institutions, each institution's
//! list of insider filings, and every new disclosure page into a SQLite
//! store of issuers, filers, trades and footnotes.

pub mod cli;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod repository;
pub mod schema;
pub mod scrapers;
pub mod utils;
