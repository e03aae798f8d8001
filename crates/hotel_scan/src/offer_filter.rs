use crate::scan_types::{DistanceUnit, MaxDistance, Offer, SearchCriteria};

/// Offers to show the user and the subset that should alert
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// Every offer worth printing, in page order
    pub display: Vec<Offer>,
    /// Offers passing every alert rule, in page order
    pub qualifying: Vec<Offer>,
}

impl FilterOutcome {
    /// Displayed offers paired with whether each one qualifies
    pub fn rows(&self) -> impl Iterator<Item = (&Offer, bool)> {
        self.display
            .iter()
            .map(|offer| (offer, self.qualifying.contains(offer)))
    }
}

/// Split offers into the display list and the qualifying list
pub fn evaluate(offers: &[Offer], criteria: &SearchCriteria) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();

    for offer in offers {
        // Hotels miles away are hidden unless asked for
        if offer.unit == DistanceUnit::Miles && !criteria.show_all {
            continue;
        }
        if qualifies(offer, criteria) {
            outcome.qualifying.push(offer.clone());
        }
        outcome.display.push(offer.clone());
    }

    outcome
}

/// Whether an offer passes the distance, price and pattern rules with rooms left
pub fn qualifies(offer: &Offer, criteria: &SearchCriteria) -> bool {
    is_close_enough(offer, criteria)
        && is_cheap_enough(offer, criteria)
        && matches_patterns(offer, criteria)
        && offer.rooms_available > 0
}

/// Distance rule
pub fn is_close_enough(offer: &Offer, criteria: &SearchCriteria) -> bool {
    match offer.unit {
        DistanceUnit::Miles => false,
        // Not seen in practice; assume anything measured this way is close
        DistanceUnit::Yards | DistanceUnit::Meters | DistanceUnit::Kilometers => true,
        DistanceUnit::Blocks => match criteria.max_distance {
            MaxDistance::Downtown => true,
            MaxDistance::Blocks(max) => offer.distance <= max,
            MaxDistance::Connected => offer.connected,
        },
        DistanceUnit::Unknown(_) => {
            criteria.max_distance == MaxDistance::Connected && offer.connected
        }
    }
}

/// Price rule
pub fn is_cheap_enough(offer: &Offer, criteria: &SearchCriteria) -> bool {
    offer.total_price <= criteria.budget
}

/// Name and room pattern rule
pub fn matches_patterns(offer: &Offer, criteria: &SearchCriteria) -> bool {
    criteria.hotel_pattern.is_match(&offer.hotel_name)
        && criteria.room_pattern.is_match(&offer.room_name)
}
