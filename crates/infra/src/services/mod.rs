mod inmemory_notifier;
mod mail_relay;

pub use inmemory_notifier::{InMemoryNotifier, SentNotification};
pub use mail_relay::MailRelayNotifier;

/// Delivers a message to a contact address
#[async_trait::async_trait]
pub trait INotifier: Send + Sync {
    async fn send_notification(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> anyhow::Result<()>;
}
