//! Line formats of the console status report.

use std::collections::BTreeSet;

use chrono::{DateTime, Local};

use crate::scan_types::{Offer, SearchCriteria};

/// Printed when an alert was dispatched
pub const TRIGGERED_ALERTS: &str = "Triggered alerts";

/// Printed when nothing new qualified
pub const SKIPPED_ALERTS: &str = "Skipped alerts (no new rooms in nearby hotel list)";

fn plural(count: u32, one: &'static str, many: &'static str) -> String {
    format!("{} {}", count, if count == 1 { one } else { many })
}

/// Banner printed before each search
pub fn search_banner(criteria: &SearchCriteria) -> String {
    format!(
        "Searching... ({}, {}, {} - {}, {})",
        plural(criteria.guests, "guest", "guests"),
        plural(criteria.rooms, "room", "rooms"),
        criteria.check_in.format("%Y-%m-%d"),
        criteria.check_out.format("%Y-%m-%d"),
        criteria.max_distance
    )
}

/// Timestamp line opening a result table
pub fn results_banner(at: DateTime<Local>) -> String {
    format!("Results:   ({})", at.format("%Y-%m-%d %H:%M:%S%.6f"))
}

/// Column header of the result table
pub fn table_header() -> String {
    format!("   {:<15} {:<10} {:<80} {}", "Distance", "Price", "Hotel", "Room")
}

/// One result row, flagged with `!` when it qualifies for an alert
pub fn offer_row(offer: &Offer, qualifying: bool) -> String {
    let marker = if qualifying { " ! " } else { "   " };
    let price = format!("${}", offer.total_price.trunc() as i64);
    format!(
        "{}{:<15} {:<10} {:<80} ({}) {}",
        marker,
        offer.distance_label(),
        price,
        offer.hotel_name,
        offer.rooms_available,
        offer.room_name
    )
}

/// Opening line of an alert, counting distinct hotels
pub fn alert_preamble(offers: &[Offer]) -> String {
    let hotels: BTreeSet<&str> = offers.iter().map(|o| o.hotel_name.as_str()).collect();
    let count = hotels.len();
    format!(
        "{} {} near the ICC:",
        count,
        if count == 1 { "hotel" } else { "hotels" }
    )
}

/// `distance: hotel: room` line used by dialogs and e-mail
pub fn offer_summary(offer: &Offer) -> String {
    format!(
        "{}: {}: {}",
        offer.distance_label().trim(),
        offer.hotel_name,
        offer.room_name
    )
}
