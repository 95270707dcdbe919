//! BDD step definitions for email notification feature

use std::sync::Arc;

use cucumber::{given, then, when};
use lettre::Message;
use tokio::sync::RwLock;

use pagewatch::config::EmailConfig;
use pagewatch::email::{MailTransport, SmtpNotifier};
use pagewatch::notifier::{Notification, Notifier};
use pagewatch::PageWatchError;

use crate::world::PageWatchWorld;

/// An email as it would have gone over the wire
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: Vec<String>,
    pub raw: String,
}

/// A mail transport that records messages instead of talking to a server
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub reject: bool,
    pub sent: RwLock<Vec<SentEmail>>,
}

#[async_trait::async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, message: Message) -> pagewatch::Result<()> {
        if self.reject {
            return Err(PageWatchError::Notifier(
                "SMTP send failed: 535 authentication rejected".to_string(),
            ));
        }
        let to = message
            .envelope()
            .to()
            .iter()
            .map(|address| address.to_string())
            .collect();
        let raw = String::from_utf8_lossy(&message.formatted()).into_owned();
        self.sent.write().await.push(SentEmail { to, raw });
        Ok(())
    }
}

fn test_email_config() -> EmailConfig {
    EmailConfig {
        smtp_server: "smtp.example.com".to_string(),
        smtp_port: Some(587),
        username: "watcher".to_string(),
        password: "app-password".to_string(),
        sender: "watcher@example.com".to_string(),
        recipient: "me@example.com".to_string(),
        timeout_seconds: 30,
    }
}

fn build_notifier(world: &mut PageWatchWorld, config: EmailConfig, reject: bool) {
    let transport = Arc::new(RecordingTransport {
        reject,
        ..RecordingTransport::default()
    });
    world.smtp_transport = Some(transport.clone());
    match SmtpNotifier::new(&config, transport) {
        Ok(notifier) => world.smtp_notifier = Some(notifier),
        Err(e) => world.smtp_build_error = Some(e.to_string()),
    }
}

async fn send(world: &mut PageWatchWorld, notification: Notification) {
    let notifier = world.smtp_notifier.as_ref().expect("notifier not set");
    world.notification_result = Some(notifier.notify(&notification).await);
}

async fn sent_emails(world: &PageWatchWorld) -> Vec<SentEmail> {
    let transport = world.smtp_transport.as_ref().expect("transport not set");
    transport.sent.read().await.clone()
}

// --- Given steps ---

#[given("an email notifier whose server accepts mail")]
fn notifier_accepts(world: &mut PageWatchWorld) {
    build_notifier(world, test_email_config(), false);
}

#[given("an email notifier whose server rejects mail")]
fn notifier_rejects(world: &mut PageWatchWorld) {
    build_notifier(world, test_email_config(), true);
}

#[given(expr = "an email notifier configured without a {word}")]
fn notifier_missing_setting(world: &mut PageWatchWorld, setting: String) {
    let mut config = test_email_config();
    match setting.as_str() {
        "password" => config.password.clear(),
        "username" => config.username.clear(),
        "recipient" => config.recipient.clear(),
        "sender" => config.sender.clear(),
        other => panic!("Unknown email setting: {}", other),
    }
    build_notifier(world, config, false);
}

// --- When steps ---

#[when(expr = "a content update for {string} with content {string} is sent")]
async fn content_update_sent(world: &mut PageWatchWorld, url: String, content: String) {
    send(world, Notification::content_updated(&url, &content)).await;
}

#[when(expr = "an error for {string} with detail {string} is sent")]
async fn error_sent(world: &mut PageWatchWorld, url: String, detail: String) {
    send(world, Notification::error(&url, &detail)).await;
}

// --- Then steps ---

#[then("the notification should succeed")]
fn notification_succeeds(world: &mut PageWatchWorld) {
    let result = world.notification_result.as_ref().expect("no result");
    assert!(result.is_ok(), "{:?}", result);
}

#[then("the notification should fail with an error")]
fn notification_fails(world: &mut PageWatchWorld) {
    let result = world.notification_result.as_ref().expect("no result");
    assert!(result.is_err());
}

#[then(expr = "one email should have been sent to {string}")]
async fn one_email_sent_to(world: &mut PageWatchWorld, recipient: String) {
    let sent = sent_emails(world).await;
    assert_eq!(sent.len(), 1, "{:?}", sent);
    assert_eq!(sent[0].to, vec![recipient]);
}

#[then(expr = "the email subject should be {string}")]
async fn email_subject(world: &mut PageWatchWorld, subject: String) {
    let sent = sent_emails(world).await;
    let email = sent.last().expect("no email sent");
    assert!(
        email.raw.contains(&format!("Subject: {}", subject)),
        "{}",
        email.raw
    );
}

#[then(expr = "the email should be HTML containing {string}")]
async fn email_html_body(world: &mut PageWatchWorld, fragment: String) {
    let sent = sent_emails(world).await;
    let email = sent.last().expect("no email sent");
    assert!(email.raw.contains("text/html"), "{}", email.raw);
    assert!(email.raw.contains(&fragment), "{}", email.raw);
}

#[then("no email should have been sent")]
async fn no_email_sent(world: &mut PageWatchWorld) {
    assert!(sent_emails(world).await.is_empty());
}

#[then(expr = "the notifier should be rejected mentioning {string}")]
fn notifier_rejected(world: &mut PageWatchWorld, fragment: String) {
    assert!(world.smtp_notifier.is_none(), "notifier was built");
    let error = world.smtp_build_error.as_ref().expect("no build error");
    assert!(error.contains(&fragment), "'{}' not in '{}'", fragment, error);
}
