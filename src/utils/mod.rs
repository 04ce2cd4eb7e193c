//! Shared utility functions.
//!
//! - `coerce`: free-text cell values to typed fields

pub mod coerce;

pub use coerce::{
    parse_acquired, parse_date, parse_direct_own, parse_identifier, parse_price, parse_shares,
    parse_text, parse_v_flag, DATE_FORMAT,
};
