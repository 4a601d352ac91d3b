//! Outbound email boundary.
//!
//! Delivery itself is an external concern; the core only decides *what* to
//! send. Sends are fire-and-forget: failures are logged, never returned to
//! the caller of registration or password reset.

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email delivery failed: {0}")]
    Delivery(String),
}

/// Which message to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    ConfirmEmail,
    ResetPassword,
}

impl EmailTemplate {
    pub fn subject(&self) -> &'static str {
        match self {
            EmailTemplate::ConfirmEmail => "Confirm your email",
            EmailTemplate::ResetPassword => "Reset your password",
        }
    }

    /// Link the recipient follows to complete the flow.
    pub fn link(&self, params: &EmailParams) -> String {
        let base = params.base_url.trim_end_matches('/');
        match self {
            EmailTemplate::ConfirmEmail => format!("{base}/auth/confirmed_email/{}", params.token),
            EmailTemplate::ResetPassword => format!("{base}/auth/reset_password/{}", params.token),
        }
    }
}

/// Values substituted into a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailParams {
    pub username: String,
    pub base_url: String,
    pub token: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(
        &self,
        to: &str,
        template: EmailTemplate,
        params: EmailParams,
    ) -> Result<(), EmailError>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Default, Clone)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(
        &self,
        to: &str,
        template: EmailTemplate,
        params: EmailParams,
    ) -> Result<(), EmailError> {
        info!(
            to,
            subject = template.subject(),
            username = %params.username,
            link = %template.link(&params),
            "email (not delivered)"
        );
        Ok(())
    }
}

/// A message captured by `MemoryEmailSender`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub template: EmailTemplate,
    pub params: EmailParams,
}

/// Records every message in memory.
#[derive(Debug, Default)]
pub struct MemoryEmailSender {
    sent: Mutex<Vec<SentEmail>>,
}

impl MemoryEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Most recent message of `template` sent to `to`.
    pub fn last_to(&self, to: &str, template: EmailTemplate) -> Option<SentEmail> {
        self.sent()
            .into_iter()
            .rev()
            .find(|m| m.to == to && m.template == template)
    }
}

#[async_trait]
impl EmailSender for MemoryEmailSender {
    async fn send(
        &self,
        to: &str,
        template: EmailTemplate,
        params: EmailParams,
    ) -> Result<(), EmailError> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(SentEmail {
                to: to.to_string(),
                template,
                params,
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> EmailParams {
        EmailParams {
            username: "alice".into(),
            base_url: "http://localhost:8000/".into(),
            token: "tok".into(),
        }
    }

    #[test]
    fn links_point_at_the_flow_endpoints() {
        assert_eq!(
            EmailTemplate::ConfirmEmail.link(&params()),
            "http://localhost:8000/auth/confirmed_email/tok"
        );
        assert_eq!(
            EmailTemplate::ResetPassword.link(&params()),
            "http://localhost:8000/auth/reset_password/tok"
        );
    }

    #[tokio::test]
    async fn memory_sender_records_messages() {
        let sender = MemoryEmailSender::new();
        sender
            .send("alice@x.com", EmailTemplate::ConfirmEmail, params())
            .await
            .unwrap();
        assert_eq!(sender.sent().len(), 1);
        assert!(
            sender
                .last_to("alice@x.com", EmailTemplate::ConfirmEmail)
                .is_some()
        );
        assert!(
            sender
                .last_to("alice@x.com", EmailTemplate::ResetPassword)
                .is_none()
        );
    }
}
