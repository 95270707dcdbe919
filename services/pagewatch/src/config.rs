//! Configuration types for the pagewatch service

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub email: EmailConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: TargetConfig::default(),
            keywords: default_keywords(),
            email: EmailConfig::default(),
        }
    }
}

/// The page and element being watched, and the polling cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_element_id")]
    pub element_id: String,
    #[serde(default = "default_element_tag")]
    pub element_tag: String,
    #[serde(default = "default_polling_interval")]
    pub polling_interval_seconds: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_error_backoff")]
    pub error_backoff_seconds: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            element_id: default_element_id(),
            element_tag: default_element_tag(),
            polling_interval_seconds: default_polling_interval(),
            request_timeout_seconds: default_request_timeout(),
            error_backoff_seconds: default_error_backoff(),
        }
    }
}

/// SMTP destination settings
#[derive(Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub smtp_server: String,
    /// Unset means the `SMTP_PORT` variable, or 587
    #[serde(default)]
    pub smtp_port: Option<u16>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub recipient: String,
    #[serde(default = "default_smtp_timeout")]
    pub timeout_seconds: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_server: String::new(),
            smtp_port: None,
            username: String::new(),
            password: String::new(),
            sender: String::new(),
            recipient: String::new(),
            timeout_seconds: default_smtp_timeout(),
        }
    }
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("sender", &self.sender)
            .field("recipient", &self.recipient)
            .finish_non_exhaustive()
    }
}

impl EmailConfig {
    /// Fill empty fields from the environment. Values from the config file take precedence.
    pub fn apply_env<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fill = |field: &mut String, var: &str| {
            if field.is_empty() {
                if let Some(value) = lookup(var) {
                    *field = value;
                }
            }
        };
        fill(&mut self.smtp_server, "SMTP_SERVER");
        fill(&mut self.username, "USERNAME");
        fill(&mut self.password, "PASSWORD");
        fill(&mut self.sender, "SENDER");
        fill(&mut self.recipient, "RECIPIENT");

        if self.smtp_port.is_none() {
            if let Some(port) = lookup("SMTP_PORT") {
                let port = port.trim().parse().map_err(|e| {
                    crate::PageWatchError::Config(format!("Invalid SMTP_PORT '{}': {}", port, e))
                })?;
                self.smtp_port = Some(port);
            }
        }
        Ok(())
    }

    /// The SMTP port in effect
    pub fn port(&self) -> u16 {
        self.smtp_port.unwrap_or_else(default_smtp_port)
    }

    /// Check that everything needed to send mail is present
    pub fn validate(&self) -> crate::Result<()> {
        let required = [
            ("smtp_server", &self.smtp_server),
            ("username", &self.username),
            ("password", &self.password),
            ("sender", &self.sender),
            ("recipient", &self.recipient),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(crate::PageWatchError::Config(format!(
                "missing email settings: {}",
                missing.join(", ")
            )));
        }
        if self.port() == 0 {
            return Err(crate::PageWatchError::Config(
                "email.smtp_port must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Resolve email credentials from the process environment (including a loaded `.env`)
    pub fn resolve_secrets(&mut self) -> crate::Result<()> {
        self.email.apply_env(|var| std::env::var(var).ok())
    }

    /// Validate the monitoring settings. Email settings are checked by the SMTP notifier.
    pub fn validate(&self) -> crate::Result<()> {
        let target = &self.target;
        if target.url.trim().is_empty() {
            return Err(crate::PageWatchError::Config(
                "target.url is required".to_string(),
            ));
        }
        let url = reqwest::Url::parse(&target.url).map_err(|e| {
            crate::PageWatchError::Config(format!("Invalid target.url '{}': {}", target.url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(crate::PageWatchError::Config(format!(
                "target.url must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if target.element_id.trim().is_empty() {
            return Err(crate::PageWatchError::Config(
                "target.element_id must not be empty".to_string(),
            ));
        }
        for (name, value) in [
            ("polling_interval_seconds", target.polling_interval_seconds),
            ("request_timeout_seconds", target.request_timeout_seconds),
            ("error_backoff_seconds", target.error_backoff_seconds),
        ] {
            if value == 0 {
                return Err(crate::PageWatchError::Config(format!(
                    "target.{} must be positive",
                    name
                )));
            }
        }
        Ok(())
    }
}

fn default_keywords() -> Vec<String> {
    vec!["ticket".to_string(), "bird".to_string()]
}

fn default_element_id() -> String {
    "welcome".to_string()
}

fn default_element_tag() -> String {
    "section".to_string()
}

fn default_polling_interval() -> u64 {
    1800
}

fn default_request_timeout() -> u64 {
    5
}

fn default_error_backoff() -> u64 {
    10
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_timeout() -> u64 {
    30
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::PageWatchError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
