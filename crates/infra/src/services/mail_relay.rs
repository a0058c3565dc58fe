use super::INotifier;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

/// Sends e-mails through an http mail relay
pub struct MailRelayNotifier {
    client: Client,
    url: String,
    sender: String,
}

#[derive(Debug, Serialize)]
struct MailRelayRequest<'a> {
    from: &'a str,
    email: &'a str,
    subject: &'a str,
    text: &'a str,
}

impl MailRelayNotifier {
    pub fn new(url: String, sender: String) -> Self {
        Self {
            client: Client::new(),
            url,
            sender,
        }
    }
}

#[async_trait::async_trait]
impl INotifier for MailRelayNotifier {
    async fn send_notification(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> anyhow::Result<()> {
        let req = MailRelayRequest {
            from: &self.sender,
            email: recipient,
            subject,
            text: body,
        };
        self.client
            .post(&self.url)
            .json(&req)
            .send()
            .await?
            .error_for_status()?;

        info!("Mail relay accepted notification for {}", recipient);
        Ok(())
    }
}
