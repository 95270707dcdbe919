//! Notifier trait and the notifications the monitor sends

use std::fmt;

use async_trait::async_trait;

/// Why a notification is being sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    ContentUpdated,
    KeywordDetected,
    ContentMissing,
    Error,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::ContentUpdated => write!(f, "content_updated"),
            NotificationKind::KeywordDetected => write!(f, "keyword_detected"),
            NotificationKind::ContentMissing => write!(f, "content_missing"),
            NotificationKind::Error => write!(f, "error"),
        }
    }
}

/// A notification to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn content_updated(url: &str, content: &str) -> Self {
        Self {
            kind: NotificationKind::ContentUpdated,
            subject: "Content Updated".to_string(),
            body: format!("New content available at {}. Content: {}", url, content),
        }
    }

    pub fn keyword_detected(url: &str, keywords: &[&str]) -> Self {
        Self {
            kind: NotificationKind::KeywordDetected,
            subject: "Keyword Detected".to_string(),
            body: format!(
                "Keyword found in the content at {}: {}",
                url,
                keywords.join(", ")
            ),
        }
    }

    pub fn content_missing(url: &str, element_id: &str) -> Self {
        Self {
            kind: NotificationKind::ContentMissing,
            subject: "Element Missing".to_string(),
            body: format!("Element '{}' not found at {}", element_id, url),
        }
    }

    pub fn error(url: &str, detail: &str) -> Self {
        Self {
            kind: NotificationKind::Error,
            subject: "Error in Page Monitor".to_string(),
            body: format!("Error while monitoring {}: {}", url, detail),
        }
    }
}

/// Trait for sending notifications
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Get the notifier type name (e.g. "smtp")
    fn type_name(&self) -> &str;

    /// Send a notification
    async fn notify(&self, notification: &Notification) -> crate::Result<()>;
}
