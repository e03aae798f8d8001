use std::time::Duration;

use async_trait::async_trait;
use hotel_scan::{AlertChannel, ChannelError, Offer};
use reqwest::{Client, StatusCode};
use serde::Serialize;

use crate::{ALERT_TITLE, NotificationError, hotel_room};

/// Pushbullet push creation endpoint
pub const PUSHBULLET_URL: &str = "https://api.pushbullet.com/v2/pushes";

/// Sends link pushes through Pushbullet
pub struct PushbulletChannel {
    client: Client,
    access_token: String,
    home_url: String,
}

/// Body of a link push
#[derive(Debug, Serialize, PartialEq)]
pub struct PushRequest {
    #[serde(rename = "type")]
    kind: &'static str,
    title: &'static str,
    body: String,
    url: String,
}

impl PushRequest {
    /// Link push listing every offer
    pub fn for_offers(offers: &[Offer], url: &str) -> Self {
        let lines: Vec<String> = offers.iter().map(hotel_room).collect();
        Self {
            kind: "link",
            title: ALERT_TITLE,
            body: lines.join("\n"),
            url: url.to_string(),
        }
    }
}

impl PushbulletChannel {
    /// Channel pushing with `access_token`
    pub fn new(access_token: String, home_url: String) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NotificationError::Push(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            access_token,
            home_url,
        })
    }
}

#[async_trait]
impl AlertChannel for PushbulletChannel {
    fn name(&self) -> &str {
        "pushbullet"
    }

    async fn deliver(&self, _preamble: &str, offers: &[Offer]) -> Result<(), ChannelError> {
        let response = self
            .client
            .post(PUSHBULLET_URL)
            .header("Access-Token", &self.access_token)
            .json(&PushRequest::for_offers(offers, &self.home_url))
            .send()
            .await
            .map_err(|e| NotificationError::Push(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(NotificationError::PushRejected(response.status().as_u16()).into());
        }

        log::info!("📱 Pushbullet alert sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotel_scan::sample_offers;

    #[test]
    fn test_push_request_json() {
        let request = PushRequest::for_offers(&sample_offers(), "https://example.test/home");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "link",
                "title": "Gencon Hotel Search",
                "body": "Test hotel 1: Queen/Queen suite\nTest hotel 2: Standard King",
                "url": "https://example.test/home"
            })
        );
    }

    #[test]
    fn test_rejection_maps_to_channel_error() {
        let error: ChannelError = NotificationError::PushRejected(401).into();
        assert!(matches!(error, ChannelError::Rejected(401)));
    }
}
