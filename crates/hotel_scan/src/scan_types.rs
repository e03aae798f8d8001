use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};
use validator::{Validate, ValidationError};

/// Passkey event identifier of the housing block
pub const EVENT_ID: u64 = 50430831;

/// Passkey owner identifier of the housing block
pub const OWNER_ID: u64 = 10909638;

/// Host serving the housing block
pub const PASSKEY_HOST: &str = "book.passkey.com";

/// Marker in a hotel's message map meaning it is skywalk-connected to the venue
pub const CONNECTED_MARKER: &str = "Skywalk to ICC";

/// Base URL of the housing block on passkey
pub fn base_url() -> String {
    format!("https://{}/event/{}/owner/{}", PASSKEY_HOST, EVENT_ID, OWNER_ID)
}

/// First night that can be booked through the block
pub fn first_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 7, 28).unwrap_or_default()
}

/// Last night that can be booked through the block
pub fn last_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 8, 8).unwrap_or_default()
}

/// First day of the event, used for the default stay
pub fn event_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 8, 3).unwrap_or_default()
}

/// How close a hotel must be before it triggers an alert
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MaxDistance {
    /// No threshold; any hotel measured in blocks is close enough
    #[default]
    Downtown,
    /// Hotel must be within this many blocks
    Blocks(f64),
    /// Hotel must be skywalk-connected to the venue
    Connected,
}

impl FromStr for MaxDistance {
    type Err = CriteriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "connected" {
            return Ok(MaxDistance::Connected);
        }
        s.parse::<f64>()
            .map(MaxDistance::Blocks)
            .map_err(|_| CriteriaError::Validation(format!("invalid float value: '{}'", s)))
    }
}

impl fmt::Display for MaxDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxDistance::Downtown => write!(f, "downtown"),
            MaxDistance::Blocks(blocks) => write!(f, "within {:.1} blocks", blocks),
            MaxDistance::Connected => write!(f, "connected"),
        }
    }
}

/// Raw search parameters as collected from the command line
#[derive(Debug, Clone, Validate)]
#[validate(schema(function = "validate_stay"))]
pub struct SearchRequest {
    /// Check-in date
    pub check_in: NaiveDate,

    /// Check-out date
    pub check_out: NaiveDate,

    /// Number of guests
    #[validate(range(min = 1, message = "At least one guest is required"))]
    pub guests: u32,

    /// Number of rooms
    #[validate(range(min = 1, message = "At least one room is required"))]
    pub rooms: u32,

    /// Number of children
    pub children: u32,

    /// Distance threshold for alerts
    pub max_distance: MaxDistance,

    /// Maximum total rate (before taxes and fees) for alerts
    #[validate(range(min = 0.0, message = "Budget cannot be negative"))]
    pub budget: f64,

    /// Pattern the hotel name must match
    pub hotel_pattern: String,

    /// Pattern the room name must match
    pub room_pattern: String,

    /// Show hotels measured in miles (they still never alert)
    pub show_all: bool,
}

impl Default for SearchRequest {
    fn default() -> Self {
        let start = event_start();
        Self {
            check_in: start,
            check_out: start + chrono::Days::new(3),
            guests: 1,
            rooms: 1,
            children: 0,
            max_distance: MaxDistance::Downtown,
            budget: 99999.0,
            hotel_pattern: ".*".to_string(),
            room_pattern: ".*".to_string(),
            show_all: false,
        }
    }
}

/// Checks both dates fall inside the block window and are ordered
fn validate_stay(request: &SearchRequest) -> Result<(), ValidationError> {
    let window = first_day()..=last_day();
    if !window.contains(&request.check_in) || !window.contains(&request.check_out) {
        return Err(ValidationError::new("outside_booking_window")
            .with_message("dates must fall inside the housing block window".into()));
    }
    if request.check_in >= request.check_out {
        return Err(ValidationError::new("invalid_date_range")
            .with_message("check-out date must be after check-in date".into()));
    }
    Ok(())
}

/// Validated, immutable parameters of one monitoring run
#[derive(Debug, Clone)]
pub struct SearchCriteria {
    /// Check-in date
    pub check_in: NaiveDate,
    /// Check-out date
    pub check_out: NaiveDate,
    /// Number of guests
    pub guests: u32,
    /// Number of rooms
    pub rooms: u32,
    /// Number of children
    pub children: u32,
    /// Distance threshold for alerts
    pub max_distance: MaxDistance,
    /// Maximum total rate for alerts
    pub budget: f64,
    /// Case-insensitive hotel name pattern
    pub hotel_pattern: Regex,
    /// Case-insensitive room name pattern
    pub room_pattern: Regex,
    /// Show hotels measured in miles
    pub show_all: bool,
}

impl SearchCriteria {
    /// Validate a raw request and compile its patterns
    pub fn from_request(request: SearchRequest) -> Result<Self, CriteriaError> {
        request
            .validate()
            .map_err(|e| CriteriaError::Validation(e.to_string()))?;

        Ok(Self {
            check_in: request.check_in,
            check_out: request.check_out,
            guests: request.guests,
            rooms: request.rooms,
            children: request.children,
            max_distance: request.max_distance,
            budget: request.budget,
            hotel_pattern: compile_pattern(&request.hotel_pattern)?,
            room_pattern: compile_pattern(&request.room_pattern)?,
            show_all: request.show_all,
        })
    }
}

/// Compile a user pattern, matching case-insensitively
pub fn compile_pattern(pattern: &str) -> Result<Regex, CriteriaError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| CriteriaError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a `YYYY-MM-DD` date inside the housing block window
pub fn parse_block_day(arg: &str) -> Result<NaiveDate, CriteriaError> {
    let day = NaiveDate::parse_from_str(arg, "%Y-%m-%d").map_err(|_| {
        CriteriaError::Validation(format!("{} is not a date in the form YYYY-MM-DD", arg))
    })?;
    if day < first_day() || day > last_day() {
        return Err(CriteriaError::Validation(format!(
            "{} is outside the Gencon housing block window",
            arg
        )));
    }
    Ok(day)
}

/// Unit a hotel's distance from the venue is measured in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    /// City blocks
    Blocks,
    /// Yards
    Yards,
    /// Miles
    Miles,
    /// Meters
    Meters,
    /// Kilometers
    Kilometers,
    /// Any code the site introduces that we do not know
    Unknown(i64),
}

impl DistanceUnit {
    /// Map the site's numeric unit code
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => DistanceUnit::Blocks,
            2 => DistanceUnit::Yards,
            3 => DistanceUnit::Miles,
            4 => DistanceUnit::Meters,
            5 => DistanceUnit::Kilometers,
            other => DistanceUnit::Unknown(other),
        }
    }

    /// Human readable unit name
    pub fn label(&self) -> &'static str {
        match self {
            DistanceUnit::Blocks => "blocks",
            DistanceUnit::Yards => "yards",
            DistanceUnit::Miles => "miles",
            DistanceUnit::Meters => "meters",
            DistanceUnit::Kilometers => "kilometers",
            DistanceUnit::Unknown(_) => "???",
        }
    }
}

/// One hotel and room block combination from a search result
#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    /// Hotel name, HTML-unescaped
    pub hotel_name: String,
    /// Distance from the venue in `unit`
    pub distance: f64,
    /// Unit of `distance`
    pub unit: DistanceUnit,
    /// Whether the hotel is skywalk-connected to the venue
    pub connected: bool,
    /// Room block name, HTML-unescaped
    pub room_name: String,
    /// Sum of the nightly rates in the block
    pub total_price: f64,
    /// Rooms available for every night of the stay
    pub rooms_available: u32,
}

impl Offer {
    /// Deduplication key of this offer
    pub fn key(&self) -> AlertRecord {
        AlertRecord {
            hotel_name: self.hotel_name.clone(),
            room_name: self.room_name.clone(),
        }
    }

    /// Distance column as shown to the user
    pub fn distance_label(&self) -> String {
        if self.connected {
            "Skywalk".to_string()
        } else {
            format!("{:4.1} {}", self.distance, self.unit.label())
        }
    }
}

/// Identity of an alertable offer: hotel name plus room name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlertRecord {
    /// Hotel name
    pub hotel_name: String,
    /// Room block name
    pub room_name: String,
}

/// Keys of the offers carried by the most recent alert
pub type SeenSet = HashSet<AlertRecord>;

/// Opaque handle to an established search session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    /// Anti-forgery token handed out by the site
    pub xsrf_token: String,
    /// When the search was submitted
    pub opened_at: chrono::DateTime<chrono::Utc>,
}

/// Invalid search parameters
#[derive(thiserror::Error, Debug)]
pub enum CriteriaError {
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Pattern does not compile
    #[error("invalid regex '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Compiler message
        reason: String,
    },

    /// Passkey URL is not a housing block entry link
    #[error("invalid passkey url: '{0}'")]
    InvalidUrl(String),
}

/// Failure establishing a search session
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    /// The request never got a response
    #[error("{stage} failed: {message}")]
    Network {
        /// Which request failed
        stage: &'static str,
        /// Transport error
        message: String,
    },

    /// The site did not hand out a session credential
    #[error("Session request failed: no XSRF-TOKEN cookie was returned")]
    AuthRejected,

    /// The site answered with a status outside the accepted set
    #[error("{stage} failed: {status}")]
    UnexpectedStatus {
        /// Which request failed
        stage: &'static str,
        /// HTTP status code
        status: u16,
    },
}

/// Failure turning the results page into offers
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    /// Results page could not be fetched
    #[error("List failed: {0}")]
    Fetch(String),

    /// The designated script element is missing or empty
    #[error("Failed to find search results")]
    NoResultsElement,

    /// The payload is not the expected JSON
    #[error("Failed to decode search results: {0}")]
    DecodeFailure(String),
}

/// Failure of a single poll iteration
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Session could not be established
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Results could not be extracted
    #[error(transparent)]
    Extract(#[from] ExtractError),
}
