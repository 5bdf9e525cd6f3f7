//! Outgoing email
//!
//! [`SmtpMailer`] delivers through a configured SMTP relay. Without SMTP
//! settings the server uses [`LogMailer`], which writes the message to the log
//! so the reset flow still works in development.

use async_trait::async_trait;
use eartrain_common::config::SmtpConfig;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("SMTP delivery failed: {0}")]
    Transport(String),
}

/// A plain-text email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Something that can deliver [`OutgoingMail`]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

/// Password reset message pointing at the frontend reset page
pub fn password_reset_mail(
    to: &str,
    frontend_url: &str,
    raw_token: &str,
    ttl_minutes: i64,
) -> OutgoingMail {
    let link = format!("{}/reset-password?token={}", frontend_url, raw_token);
    OutgoingMail {
        to: to.to_string(),
        subject: "Reset your EarTrain password".to_string(),
        body: format!(
            "Someone asked to reset the password for this EarTrain account.\n\n\
             Open this link to choose a new password:\n{}\n\n\
             The link expires in {} minutes and can be used once. \
             If you did not ask for a reset you can ignore this email.\n",
            link, ttl_minutes
        ),
    }
}

// ========================================
// SMTP
// ========================================

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| MailError::Address(format!("{}: {}", config.from, e)))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|e| MailError::Address(format!("{}: {}", mail.to, e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        debug!("Mail delivered to {}", mail.to);
        Ok(())
    }
}

// ========================================
// Log only
// ========================================

/// Logs mail instead of sending it and keeps a copy in memory
#[derive(Default)]
pub struct LogMailer {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl LogMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages handed to this mailer so far
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        info!(
            "SMTP not configured; mail to {} ({}):\n{}",
            mail.to, mail.subject, mail.body
        );
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(mail);
        }
        Ok(())
    }
}
