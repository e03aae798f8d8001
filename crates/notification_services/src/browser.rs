use async_trait::async_trait;
use hotel_scan::{AlertChannel, ChannelError, Offer};
use tokio::process::Command;

use crate::NotificationError;

/// Opens the housing site in the default browser
pub struct BrowserChannel {
    url: String,
}

impl BrowserChannel {
    /// Channel opening `url`
    pub fn new(url: String) -> Self {
        Self { url }
    }
}

fn opener(url: &str) -> Command {
    #[cfg(target_os = "windows")]
    {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]).arg(url);
        command
    }

    #[cfg(target_os = "macos")]
    {
        let mut command = Command::new("open");
        command.arg(url);
        command
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        let mut command = Command::new("xdg-open");
        command.arg(url);
        command
    }
}

#[async_trait]
impl AlertChannel for BrowserChannel {
    fn name(&self) -> &str {
        "browser"
    }

    async fn deliver(&self, _preamble: &str, _offers: &[Offer]) -> Result<(), ChannelError> {
        log::info!("🌐 Opening {}", self.url);

        let status = opener(&self.url)
            .status()
            .await
            .map_err(|e| NotificationError::Browser(e.to_string()))?;

        if !status.success() {
            return Err(NotificationError::Browser(format!("opener exited with {}", status)).into());
        }
        Ok(())
    }
}
