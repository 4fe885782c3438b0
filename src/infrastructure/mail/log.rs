//! Mailer that writes to the log instead of sending

use async_trait::async_trait;
use tracing::info;

use crate::domain::{MailError, MailMessage, Mailer};

/// Logs recipient and subject of each message
///
/// Bodies carry reset links and are never logged. Useful for local runs where
/// no mail transport is wired in.
#[derive(Debug, Clone)]
pub struct LogMailer {
    sender: String,
}

impl LogMailer {
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
        }
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        info!(
            from = %self.sender,
            to = %message.to,
            subject = %message.subject,
            body_len = message.body.len(),
            "Mail dispatched to log"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Email;

    #[tokio::test]
    async fn test_log_mailer_accepts_messages() {
        let mailer = LogMailer::new("noreply@example.com");

        let result = mailer
            .send(MailMessage {
                to: Email::parse("alice@example.com").unwrap(),
                subject: "Password reset".to_string(),
                body: "secret link".to_string(),
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(mailer.sender(), "noreply@example.com");
    }
}
