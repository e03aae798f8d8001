use std::time::Duration;

use chrono::NaiveDate;
use clap::{ArgAction, ArgMatches, Parser};
use hotel_scan::{
    MaxDistance, RunMode, ScanExecutorConfig, SearchRequest, event_start, parse_block_day,
    parse_entry_url,
};
use notification_services::AlertTarget;
use reqwest::Url;

/// Longest accepted `--delay`, one week
pub const MAX_DELAY_MINUTES: u64 = 7 * 24 * 60;

/// Watch the Gencon housing block for hotel rooms and alert when new ones show up
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Removed option; lookups now use the token in the passkey URL
    #[arg(long, alias = "lastname", hide = true, value_parser = reject_surname)]
    surname: Option<String>,

    /// Number of guests
    #[arg(long, default_value_t = 1)]
    pub guests: u32,

    /// Number of children
    #[arg(long, default_value_t = 0)]
    pub children: u32,

    /// Number of rooms
    #[arg(long, default_value_t = 1)]
    pub rooms: u32,

    /// Check in
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_block_day, conflicts_with = "wednesday")]
    pub checkin: Option<NaiveDate>,

    /// Check in on Wednesday
    #[arg(long)]
    pub wednesday: bool,

    /// Check out
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_block_day)]
    pub checkout: Option<NaiveDate>,

    /// Max hotel distance that triggers an alert (or 'connected' to require skywalk hotels)
    #[arg(long, value_name = "BLOCKS", conflicts_with = "connected")]
    pub max_distance: Option<MaxDistance>,

    /// Shorthand for --max-distance connected
    #[arg(long)]
    pub connected: bool,

    /// Max total rate (not counting taxes/fees) that triggers an alert
    #[arg(long, value_name = "PRICE", default_value_t = 99999.0)]
    pub budget: f64,

    /// Regular expression to match hotel name against
    #[arg(long, value_name = "PATTERN", default_value = ".*")]
    pub hotel_regex: String,

    /// Regular expression to match room against
    #[arg(long, value_name = "PATTERN", default_value = ".*")]
    pub room_regex: String,

    /// Show all rooms, even if miles away (these rooms never trigger alerts)
    #[arg(long)]
    pub show_all: bool,

    /// Search every MINS minute(s), at most once a week
    #[arg(
        long,
        value_name = "MINS",
        default_value_t = 1,
        value_parser = clap::value_parser!(u64).range(1..=MAX_DELAY_MINUTES),
        conflicts_with = "once"
    )]
    pub delay: u64,

    /// Search once and exit
    #[arg(long)]
    pub once: bool,

    /// Trigger every specified alert and exit
    #[arg(long)]
    pub test: bool,

    /// Passkey URL containing your token
    #[arg(long, value_parser = parse_entry_url, required_unless_present = "test")]
    pub url: Option<Url>,

    /// Show a dialog box
    #[arg(long, help_heading = "Alerts")]
    pub popup: bool,

    /// Run the specified command, passing each hotel name as an argument
    #[arg(long, value_name = "CMD", action = ArgAction::Append, help_heading = "Alerts")]
    pub cmd: Vec<String>,

    /// Open the Passkey website in the default browser
    #[arg(long, help_heading = "Alerts")]
    pub browser: bool,

    /// Send an e-mail through AWS SES (TO may list several comma-separated addresses)
    #[arg(
        long,
        num_args = 2,
        value_names = ["FROM", "TO"],
        action = ArgAction::Append,
        help_heading = "Alerts"
    )]
    pub email: Vec<String>,

    /// Send a Pushbullet notification
    #[arg(long, value_name = "ACCESS_TOKEN", action = ArgAction::Append, help_heading = "Alerts")]
    pub pushbullet: Vec<String>,
}

fn reject_surname(_: &str) -> Result<String, String> {
    Err("option no longer exists. Existing reservation lookups are now done with your hash instead of your surname".to_string())
}

impl Args {
    /// Search parameters, filling in the event defaults
    pub fn search_request(&self) -> SearchRequest {
        let defaults = SearchRequest::default();

        let check_in = match (self.checkin, self.wednesday) {
            (Some(day), _) => day,
            (None, true) => event_start() - chrono::Days::new(1),
            (None, false) => defaults.check_in,
        };

        let max_distance = if self.connected {
            MaxDistance::Connected
        } else {
            self.max_distance.unwrap_or(defaults.max_distance)
        };

        SearchRequest {
            check_in,
            check_out: self.checkout.unwrap_or(defaults.check_out),
            guests: self.guests,
            rooms: self.rooms,
            children: self.children,
            max_distance,
            budget: self.budget,
            hotel_pattern: self.hotel_regex.clone(),
            room_pattern: self.room_regex.clone(),
            show_all: self.show_all,
        }
    }

    /// Scheduler settings from `--delay`, `--once` and `--test`
    pub fn executor_config(&self) -> ScanExecutorConfig {
        let mode = if self.test {
            RunMode::Test
        } else if self.once {
            RunMode::Once
        } else {
            RunMode::Continuous
        };

        ScanExecutorConfig {
            poll_interval: Duration::from_secs(self.delay.saturating_mul(60)),
            mode,
        }
    }

    /// Requested alert channels in the order they were given on the command line
    pub fn alert_targets(&self, matches: &ArgMatches) -> Vec<AlertTarget> {
        let mut targets: Vec<(usize, AlertTarget)> = Vec::new();

        if self.popup {
            if let Some(index) = matches.index_of("popup") {
                targets.push((index, AlertTarget::Popup));
            }
        }
        if self.browser {
            if let Some(index) = matches.index_of("browser") {
                targets.push((index, AlertTarget::Browser));
            }
        }
        if let Some(indices) = matches.indices_of("cmd") {
            for (index, cmd) in indices.zip(&self.cmd) {
                targets.push((index, AlertTarget::Command(cmd.clone())));
            }
        }
        if let Some(indices) = matches.indices_of("email") {
            let indices: Vec<usize> = indices.collect();
            for (index, pair) in indices.chunks(2).zip(self.email.chunks(2)) {
                if let [from, to] = pair {
                    targets.push((
                        index[0],
                        AlertTarget::Email {
                            from: from.clone(),
                            to: to.clone(),
                        },
                    ));
                }
            }
        }
        if let Some(indices) = matches.indices_of("pushbullet") {
            for (index, token) in indices.zip(&self.pushbullet) {
                targets.push((index, AlertTarget::Pushbullet(token.clone())));
            }
        }

        targets.sort_by_key(|(index, _)| *index);
        targets.into_iter().map(|(_, target)| target).collect()
    }
}
