use async_trait::async_trait;
use hotel_scan::{AlertChannel, ChannelError, Offer};
use tokio::process::Command;

use crate::{NotificationError, hotel_room};

/// Runs a user command with one `hotel: room` argument per offer
pub struct CommandChannel {
    program: String,
}

impl CommandChannel {
    /// Channel running `program`
    pub fn new(program: String) -> Self {
        Self { program }
    }

    /// Arguments passed for a set of offers
    pub fn arguments(offers: &[Offer]) -> Vec<String> {
        offers.iter().map(hotel_room).collect()
    }
}

#[async_trait]
impl AlertChannel for CommandChannel {
    fn name(&self) -> &str {
        "cmd"
    }

    async fn deliver(&self, _preamble: &str, offers: &[Offer]) -> Result<(), ChannelError> {
        log::debug!("Running alert command {}", self.program);

        let status = Command::new(&self.program)
            .args(Self::arguments(offers))
            .status()
            .await
            .map_err(|e| NotificationError::Command(format!("{}: {}", self.program, e)))?;

        if !status.success() {
            return Err(NotificationError::Command(format!("{} exited with {}", self.program, status)).into());
        }
        Ok(())
    }
}
