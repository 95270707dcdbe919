//! SMTP email notifier

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::EmailConfig;
use crate::notifier::{Notification, Notifier};

/// Abstraction over the mail transport for dependency injection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: Message) -> crate::Result<()>;
}

/// Production transport: STARTTLS relay with login credentials
pub struct LettreTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl LettreTransport {
    pub fn new(config: &EmailConfig) -> crate::Result<Self> {
        let inner = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)
            .map_err(|e| {
                crate::PageWatchError::Config(format!(
                    "Invalid SMTP server '{}': {}",
                    config.smtp_server, e
                ))
            })?
            .port(config.port())
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(Duration::from_secs(config.timeout_seconds)))
            .build();

        tracing::debug!(
            "Created SMTP transport for {}:{}",
            config.smtp_server,
            config.port()
        );
        Ok(Self { inner })
    }
}

#[async_trait]
impl MailTransport for LettreTransport {
    async fn send(&self, message: Message) -> crate::Result<()> {
        self.inner
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| crate::PageWatchError::Notifier(format!("SMTP send failed: {}", e)))
    }
}

/// Sends each notification as an HTML email to a single recipient
pub struct SmtpNotifier {
    sender: Mailbox,
    recipient: Mailbox,
    transport: Arc<dyn MailTransport>,
}

impl std::fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpNotifier")
            .field("sender", &self.sender.to_string())
            .field("recipient", &self.recipient.to_string())
            .finish()
    }
}

impl SmtpNotifier {
    pub fn new(config: &EmailConfig, transport: Arc<dyn MailTransport>) -> crate::Result<Self> {
        config.validate()?;
        let sender = parse_mailbox("sender", &config.sender)?;
        let recipient = parse_mailbox("recipient", &config.recipient)?;

        tracing::debug!("Created SmtpNotifier sending to {}", recipient);

        Ok(Self {
            sender,
            recipient,
            transport,
        })
    }

    /// Build a notifier backed by a real SMTP connection
    pub fn from_config(config: &EmailConfig) -> crate::Result<Self> {
        config.validate()?;
        let transport = LettreTransport::new(config)?;
        Self::new(config, Arc::new(transport))
    }

    fn build_message(&self, notification: &Notification) -> crate::Result<Message> {
        Message::builder()
            .from(self.sender.clone())
            .to(self.recipient.clone())
            .subject(notification.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(notification.body.clone())
            .map_err(|e| crate::PageWatchError::Notifier(format!("Building email: {}", e)))
    }
}

fn parse_mailbox(field: &str, value: &str) -> crate::Result<Mailbox> {
    value.parse::<Mailbox>().map_err(|e| {
        crate::PageWatchError::Config(format!("Invalid email {} '{}': {}", field, value, e))
    })
}

#[async_trait]
impl Notifier for SmtpNotifier {
    fn type_name(&self) -> &str {
        "smtp"
    }

    async fn notify(&self, notification: &Notification) -> crate::Result<()> {
        let message = self.build_message(notification)?;

        tracing::debug!(
            "Sending email: subject='{}', kind={}",
            notification.subject,
            notification.kind
        );

        self.transport.send(message).await?;

        tracing::debug!("Email sent successfully");
        Ok(())
    }
}
