use hotel_scan::{ChannelError, Offer, report};

/// Title used by every alert
pub const ALERT_TITLE: &str = "Gencon Hotel Search";

/// Errors raised by the notification channels.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// The message dialog could not be shown.
    #[error("Dialog error: {0}")]
    Dialog(String),

    /// The alert command could not be run or exited unsuccessfully.
    #[error("Command error: {0}")]
    Command(String),

    /// The browser could not be opened.
    #[error("Browser error: {0}")]
    Browser(String),

    /// Simple email service (SES) errors.
    #[error("AWS SES error: {0}")]
    SesError(String),

    /// Pushbullet request failed.
    #[error("Pushbullet error: {0}")]
    Push(String),

    /// Pushbullet answered with a non-200 status.
    #[error("Response {0} trying to send Pushbullet alert")]
    PushRejected(u16),
}

impl From<NotificationError> for ChannelError {
    fn from(error: NotificationError) -> Self {
        match error {
            NotificationError::PushRejected(status) => ChannelError::Rejected(status),
            other => ChannelError::Delivery(other.to_string()),
        }
    }
}

/// An alert channel requested on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertTarget {
    /// Show a dialog box
    Popup,
    /// Run a command with one `hotel: room` argument per offer
    Command(String),
    /// Open the housing site in the default browser
    Browser,
    /// Send an e-mail; `to` may hold several comma-separated addresses
    Email {
        /// Sender address
        from: String,
        /// Recipient addresses
        to: String,
    },
    /// Send a Pushbullet push with this access token
    Pushbullet(String),
}

/// `hotel: room` line used by commands and pushes
pub fn hotel_room(offer: &Offer) -> String {
    format!("{}: {}", offer.hotel_name, offer.room_name)
}

/// Dialog text: the preamble followed by one line per offer
pub fn dialog_message(preamble: &str, offers: &[Offer]) -> String {
    let lines: Vec<String> = offers.iter().map(report::offer_summary).collect();
    format!("{}\n\n{}", preamble, lines.join("\n"))
}
