//! Mail transport contract
//!
//! The SMTP (or any other) transport lives outside this crate; the recovery
//! flow only needs something that accepts a message and reports the outcome.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

use crate::domain::user::Email;

/// An outgoing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: Email,
    pub subject: String,
    pub body: String,
}

/// Transport failure
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MailError {
    #[error("Mail transport unavailable: {0}")]
    Unavailable(String),

    #[error("Recipient rejected: {0}")]
    Rejected(String),
}

/// Delivers messages to a recipient
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Mailer: Send + Sync + std::fmt::Debug {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}
