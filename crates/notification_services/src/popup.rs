use async_trait::async_trait;
use hotel_scan::{AlertChannel, ChannelError, Offer};
use rfd::{MessageButtons, MessageDialog, MessageLevel};

use crate::{ALERT_TITLE, NotificationError, dialog_message};

/// Shows a native dialog box; blocks its own task until dismissed
pub struct PopupChannel;

impl PopupChannel {
    /// Create the dialog channel
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AlertChannel for PopupChannel {
    fn name(&self) -> &str {
        "popup"
    }

    async fn deliver(&self, preamble: &str, offers: &[Offer]) -> Result<(), ChannelError> {
        let message = dialog_message(preamble, offers);

        // The dialog call blocks until the user dismisses it
        tokio::task::spawn_blocking(move || {
            MessageDialog::new()
                .set_title(ALERT_TITLE)
                .set_description(message)
                .set_level(MessageLevel::Info)
                .set_buttons(MessageButtons::Ok)
                .show()
        })
        .await
        .map_err(|e| NotificationError::Dialog(e.to_string()))?;

        Ok(())
    }
}
