use std::sync::Arc;

use hotel_scan::AlertChannel;

use crate::{
    AlertTarget, BrowserChannel, CommandChannel, NotificationError, PopupChannel,
    PushbulletChannel, SesEmailChannel,
};

/// Build ready-to-call channels for the requested targets.
///
/// Channels that need credentials are verified here so a bad setup fails
/// before polling starts.
pub async fn build_channels(
    targets: &[AlertTarget],
    home_url: &str,
) -> Result<Vec<Arc<dyn AlertChannel>>, NotificationError> {
    let mut channels: Vec<Arc<dyn AlertChannel>> = Vec::with_capacity(targets.len());

    for target in targets {
        let channel: Arc<dyn AlertChannel> = match target {
            AlertTarget::Popup => Arc::new(PopupChannel::new()),
            AlertTarget::Command(cmd) => Arc::new(CommandChannel::new(cmd.clone())),
            AlertTarget::Browser => Arc::new(BrowserChannel::new(home_url.to_string())),
            AlertTarget::Email { from, to } => {
                Arc::new(SesEmailChannel::connect(from, to, home_url).await?)
            }
            AlertTarget::Pushbullet(token) => {
                Arc::new(PushbulletChannel::new(token.clone(), home_url.to_string())?)
            }
        };
        log::info!("🔔 Alert channel ready: {}", channel.name());
        channels.push(channel);
    }

    Ok(channels)
}
