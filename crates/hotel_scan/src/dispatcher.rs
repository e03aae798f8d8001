use std::sync::Arc;

use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::scan_types::Offer;

/// Trait for alert channels (dialog, command, browser, e-mail, push)
#[async_trait::async_trait]
pub trait AlertChannel: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &str;

    /// Deliver one alert
    async fn deliver(&self, preamble: &str, offers: &[Offer]) -> Result<(), ChannelError>;
}

/// Failure of a single channel delivery
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The channel could not deliver the alert
    #[error("{0}")]
    Delivery(String),

    /// The remote end answered with a rejecting status
    #[error("Response {0}")]
    Rejected(u16),

    /// The channel could not be configured
    #[error("Setup failed: {0}")]
    Setup(String),
}

/// Fans alerts out to every configured channel
#[derive(Clone, Default)]
pub struct AlertDispatcher {
    channels: Vec<Arc<dyn AlertChannel>>,
}

impl AlertDispatcher {
    /// Dispatcher over the given channels
    pub fn new(channels: Vec<Arc<dyn AlertChannel>>) -> Self {
        Self { channels }
    }

    /// Number of configured channels
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether no channel is configured
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Launch one task per channel and return without waiting for them.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, preamble: &str, offers: &[Offer]) -> DispatchHandle {
        let preamble: Arc<str> = Arc::from(preamble);
        let offers: Arc<[Offer]> = Arc::from(offers);

        let tasks = self
            .channels
            .iter()
            .map(|channel| {
                let channel = channel.clone();
                let preamble = preamble.clone();
                let offers = offers.clone();
                let name = channel.name().to_string();

                let handle = tokio::spawn(async move {
                    match channel.deliver(&preamble, &offers).await {
                        Ok(()) => {
                            info!("Alert delivered via {}", channel.name());
                            true
                        }
                        Err(e) => {
                            error!("Alert via {} failed: {}", channel.name(), e);
                            false
                        }
                    }
                });

                (name, handle)
            })
            .collect();

        DispatchHandle { tasks }
    }
}

/// In-flight deliveries of one dispatch
pub struct DispatchHandle {
    tasks: Vec<(String, JoinHandle<bool>)>,
}

/// How a dispatch ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Channels that delivered
    pub delivered: usize,
    /// Channels that failed or panicked
    pub failed: usize,
}

impl DispatchHandle {
    /// Number of launched deliveries
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether nothing was launched
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Let the deliveries run on without waiting
    pub fn detach(self) {}

    /// Wait for every delivery to finish
    pub async fn wait(self) -> DispatchReport {
        let (names, handles): (Vec<_>, Vec<_>) = self.tasks.into_iter().unzip();

        let mut report = DispatchReport::default();
        for (name, result) in names.iter().zip(join_all(handles).await) {
            match result {
                Ok(true) => report.delivered += 1,
                Ok(false) => report.failed += 1,
                Err(e) => {
                    warn!("Alert task for {} aborted: {}", name, e);
                    report.failed += 1;
                }
            }
        }
        report
    }
}
