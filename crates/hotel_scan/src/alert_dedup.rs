use tracing::debug;

use crate::scan_types::{Offer, SeenSet};

/// Result of comparing the qualifying offers against the last alert
#[derive(Debug, Clone, Default)]
pub struct DedupDecision {
    /// Offers to alert on; empty when nothing new appeared
    pub new_offers: Vec<Offer>,
    /// Seen set to carry into the next poll
    pub updated_seen: SeenSet,
}

/// Decide whether the qualifying offers contain anything not already alerted.
///
/// The seen set always becomes the keys of the current qualifying offers, so an
/// empty poll forgets everything and a key that drops out is new again when it
/// returns. When any key is new the alert carries the full qualifying list.
pub fn should_alert(qualifying: &[Offer], seen: &SeenSet) -> DedupDecision {
    let current: SeenSet = qualifying.iter().map(Offer::key).collect();

    let new_offers = if current.is_empty() || current.is_subset(seen) {
        Vec::new()
    } else {
        qualifying.to_vec()
    };

    DedupDecision {
        new_offers,
        updated_seen: current,
    }
}

/// Owns the seen set across poll iterations
#[derive(Debug, Default)]
pub struct AlertDeduplicator {
    seen: SeenSet,
}

impl AlertDeduplicator {
    /// Start with nothing seen
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers to alert on for this poll, updating the seen set
    pub fn observe(&mut self, qualifying: &[Offer]) -> Vec<Offer> {
        let decision = should_alert(qualifying, &self.seen);
        debug!(
            "Dedup: {} qualifying, {} previously seen, {} to alert",
            qualifying.len(),
            self.seen.len(),
            decision.new_offers.len()
        );
        self.seen = decision.updated_seen;
        decision.new_offers
    }

    /// Keys of the most recent alert
    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }
}
