//! In-memory mailer that keeps every message

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{Email, MailError, MailMessage, Mailer};

/// Records delivered messages; can be switched to fail
#[derive(Debug, Default, Clone)]
pub struct InMemoryMailer {
    outbox: Arc<RwLock<Vec<MailMessage>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail with `Unavailable`
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every delivered message, oldest first
    pub async fn messages(&self) -> Vec<MailMessage> {
        self.outbox.read().await.clone()
    }

    /// Messages delivered to one recipient
    pub async fn messages_to(&self, to: &Email) -> Vec<MailMessage> {
        self.outbox
            .read()
            .await
            .iter()
            .filter(|m| &m.to == to)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Unavailable("mailer switched off".to_string()));
        }

        self.outbox.write().await.push(message);
        Ok(())
    }
}
