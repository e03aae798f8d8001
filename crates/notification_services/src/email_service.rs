use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ses::Client as SesClient;
use aws_sdk_ses::types::{Body, Content, Destination, Message};
use hotel_scan::{AlertChannel, ChannelError, Offer, report};

use crate::{ALERT_TITLE, NotificationError};

/// Sends alert e-mails through AWS SES.
#[derive(Debug, Clone)]
pub struct SesEmailChannel {
    ses_client: SesClient,
    from_email: String,
    to_addresses: Vec<String>,
    home_url: String,
}

impl SesEmailChannel {
    /// Loads AWS configuration from the environment and checks the account can send.
    pub async fn connect(from: &str, to: &str, home_url: &str) -> Result<Self, NotificationError> {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let ses_client = SesClient::new(&config);

        ses_client.get_send_quota().send().await.map_err(|e| {
            log::error!("❌ AWS SES setup failed: {:#?}", e);
            NotificationError::SesError(format!("Failed to verify SES access for {}: {}", from, e))
        })?;

        Ok(Self {
            ses_client,
            from_email: from.to_string(),
            to_addresses: split_recipients(to),
            home_url: home_url.to_string(),
        })
    }

    async fn send_email(&self, subject: &str, text_body: String) -> Result<(), NotificationError> {
        let subject_content = Content::builder()
            .data(subject)
            .charset("UTF-8")
            .build()
            .map_err(|e| NotificationError::SesError(format!("Failed to build subject: {}", e)))?;

        let text_content = Content::builder()
            .data(text_body)
            .charset("UTF-8")
            .build()
            .map_err(|e| NotificationError::SesError(format!("Failed to build text body: {}", e)))?;

        let body = Body::builder().text(text_content).build();

        let message = Message::builder()
            .subject(subject_content)
            .body(body)
            .build();

        let destination = Destination::builder()
            .set_to_addresses(Some(self.to_addresses.clone()))
            .build();

        log::info!("📧 Sending alert e-mail via AWS SES...");

        let result = self
            .ses_client
            .send_email()
            .source(&self.from_email)
            .destination(destination)
            .message(message)
            .send()
            .await;

        match result {
            Ok(output) => {
                log::info!("📧 SES Message ID: {}", output.message_id());
                Ok(())
            }
            Err(e) => {
                log::error!("❌ AWS SES error: {:#?}", e);
                let error_msg = if let Some(service_error) = e.as_service_error() {
                    format!("AWS SES service error: {:?}", service_error)
                } else {
                    format!("AWS SES error: {}", e)
                };
                Err(NotificationError::SesError(error_msg))
            }
        }
    }
}

/// Split a comma-separated recipient list
pub fn split_recipients(to: &str) -> Vec<String> {
    to.split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(str::to_string)
        .collect()
}

/// Plain-text e-mail body for an alert
pub fn email_body(preamble: &str, offers: &[Offer], home_url: &str) -> String {
    let lines: Vec<String> = offers
        .iter()
        .map(|offer| format!("  * {}", report::offer_summary(offer)))
        .collect();
    format!("{}\n\n{}\n\n{}", preamble, lines.join("\n"), home_url)
}

#[async_trait]
impl AlertChannel for SesEmailChannel {
    fn name(&self) -> &str {
        "email"
    }

    async fn deliver(&self, preamble: &str, offers: &[Offer]) -> Result<(), ChannelError> {
        let body = email_body(preamble, offers, &self.home_url);
        self.send_email(ALERT_TITLE, body).await?;
        Ok(())
    }
}
