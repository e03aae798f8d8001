//! # Hotel Scan
//!
//! This crate polls the Gencon housing block on passkey for hotel rooms that
//! match a search, and alerts through pluggable channels when new matches show
//! up. It covers the session handshake, result extraction, filtering,
//! deduplication of repeat alerts and the polling schedule.

/// Search criteria, offers and error types
mod scan_types;
pub use scan_types::*;

/// Session handshake and search submission against passkey
mod session_manager;
pub use session_manager::*;

/// Decoding of the results payload embedded in the hotel list page
mod result_extractor;
pub use result_extractor::*;

/// Distance, price and pattern rules
mod offer_filter;
pub use offer_filter::*;

/// Suppression of repeat alerts
mod alert_dedup;
pub use alert_dedup::*;

/// Alert channel trait and concurrent fan-out
mod dispatcher;
pub use dispatcher::*;

/// Console status report
pub mod report;

/// Poll loop and run modes
mod executor;
pub use executor::*;
