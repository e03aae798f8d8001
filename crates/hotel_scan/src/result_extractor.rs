use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::scan_types::{
    CONNECTED_MARKER, DistanceUnit, ExtractError, Offer, SessionHandle,
};
use crate::session_manager::BookingSite;

/// `id` of the script element embedding the search results
pub const RESULTS_ELEMENT_ID: &str = "last-search-results";

/// Hotel entry of the embedded results payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasskeyHotel {
    /// Hotel name, possibly HTML-escaped
    pub name: String,

    /// Distance from the venue
    #[serde(default)]
    pub distance_from_event: f64,

    /// Unit code of `distance_from_event`
    pub distance_unit: i64,

    /// Free-text messages about the hotel
    #[serde(default)]
    pub message_map: Option<Value>,

    /// Room blocks offered by the hotel
    #[serde(default)]
    pub blocks: Vec<PasskeyBlock>,
}

/// Room block of a hotel
#[derive(Debug, Deserialize)]
pub struct PasskeyBlock {
    /// Room type name, possibly HTML-escaped
    pub name: String,

    /// One entry per night of the stay
    #[serde(default)]
    pub inventory: Vec<PasskeyInventory>,
}

/// Nightly rate and availability of a block
#[derive(Debug, Deserialize)]
pub struct PasskeyInventory {
    /// Nightly rate
    pub rate: f64,

    /// Rooms left for the night
    pub available: u32,
}

/// Fetch the results page for a session and decode its offers
pub async fn extract(
    site: &dyn BookingSite,
    session: &SessionHandle,
) -> Result<Vec<Offer>, ExtractError> {
    let html = site.fetch_results_page(session).await?;
    parse_results_page(&html)
}

/// Locate the embedded results payload and map it to offers
pub fn parse_results_page(html: &str) -> Result<Vec<Offer>, ExtractError> {
    let payload = find_results_payload(html).ok_or(ExtractError::NoResultsElement)?;

    let hotels: Vec<PasskeyHotel> = serde_json::from_str(&payload)
        .map_err(|e| ExtractError::DecodeFailure(e.to_string()))?;

    debug!("Decoded {} hotels from results page", hotels.len());

    Ok(hotels.iter().flat_map(hotel_offers).collect())
}

fn find_results_payload(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("script") {
        Ok(selector) => selector,
        Err(e) => {
            warn!("Script selector rejected: {}", e);
            return None;
        }
    };

    document
        .select(&selector)
        .find(|script| {
            script
                .value()
                .attr("id")
                .is_some_and(|id| id.eq_ignore_ascii_case(RESULTS_ELEMENT_ID))
        })
        .map(|script| script.text().collect::<String>())
        .filter(|text| !text.trim().is_empty())
}

fn hotel_offers(hotel: &PasskeyHotel) -> Vec<Offer> {
    let hotel_name = unescape_html(&hotel.name);
    let unit = DistanceUnit::from_code(hotel.distance_unit);
    let connected = hotel
        .message_map
        .as_ref()
        .is_some_and(|messages| mentions(messages, CONNECTED_MARKER));

    hotel
        .blocks
        .iter()
        .filter_map(|block| {
            // Rooms must be free every night, so the block offers the scarcest night
            let rooms_available = block.inventory.iter().map(|inv| inv.available).min()?;
            if rooms_available == 0 {
                return None;
            }

            Some(Offer {
                hotel_name: hotel_name.clone(),
                distance: hotel.distance_from_event,
                unit,
                connected,
                room_name: unescape_html(&block.name),
                total_price: block.inventory.iter().map(|inv| inv.rate).sum(),
                rooms_available,
            })
        })
        .collect()
}

/// Whether a marker appears in any key or text of a message map
fn mentions(value: &Value, marker: &str) -> bool {
    match value {
        Value::String(text) => text.contains(marker),
        Value::Array(items) => items.iter().any(|item| mentions(item, marker)),
        Value::Object(map) => map
            .iter()
            .any(|(key, item)| key.contains(marker) || mentions(item, marker)),
        _ => false,
    }
}

/// Decode HTML character references in a name; markup-like text is kept as is
pub fn unescape_html(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}
