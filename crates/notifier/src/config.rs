//! Notifier configuration loaded from environment variables.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{NotifierError, Result};

/// Sender, templates and limits for outgoing notifications.
///
/// Reads from environment variables:
/// - `SMTP_FROM_EMAIL`: sender address (default: `"noreply@localhost"`)
/// - `SMTP_TRANSPORT`: SMTP transport as a JSON object or an `smtp://` /
///   `smtps://` URL, read by [`SmtpMailer`](crate::services::SmtpMailer)
/// - `SMTP_TEMPLATE_PATH`: template directory (default: `"data/emailTemplates"`)
/// - `SMTP_TEMPLATE_MAP`: JSON object of event name to template name
/// - `SMTP_TEMPLATE_ENV`: JSON object of values exposed to templates as `env`
/// - `SMTP_RESTOCK_CONCURRENCY`: parallel restock sends (default: `8`)
/// - `SMTP_FETCH_TIMEOUT_MS`, `SMTP_SEND_TIMEOUT_MS`: optional limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotifierConfig {
    pub from_email: String,
    pub transport: Value,
    pub template_root: PathBuf,
    pub template_map: HashMap<String, String>,
    pub template_env: BTreeMap<String, String>,
    pub restock_concurrency: usize,
    pub fetch_timeout: Option<Duration>,
    pub send_timeout: Option<Duration>,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            from_email: "noreply@localhost".to_string(),
            transport: Value::Null,
            template_root: PathBuf::from("data/emailTemplates"),
            template_map: HashMap::new(),
            template_env: BTreeMap::new(),
            restock_concurrency: 8,
            fetch_timeout: None,
            send_timeout: None,
        }
    }
}

impl NotifierConfig {
    pub fn new(from_email: impl Into<String>) -> Self {
        Self {
            from_email: from_email.into(),
            ..Self::default()
        }
    }

    /// Maps `event` to `template`.
    pub fn with_template(mut self, event: impl Into<String>, template: impl Into<String>) -> Self {
        self.template_map.insert(event.into(), template.into());
        self
    }

    pub fn with_transport(mut self, transport: Value) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.template_env.insert(key.into(), value.into());
        self
    }

    pub fn with_restock_concurrency(mut self, limit: usize) -> Self {
        self.restock_concurrency = limit.max(1);
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    /// The template configured for `event`, if any. Empty names count as unset.
    pub fn template_name_for_event(&self, event: &str) -> Option<&str> {
        self.template_map
            .get(event)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, one variable at a time.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            from_email: lookup("SMTP_FROM_EMAIL").unwrap_or(defaults.from_email),
            transport: parse_transport(&lookup)?.unwrap_or(defaults.transport),
            template_root: lookup("SMTP_TEMPLATE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.template_root),
            template_map: parse_json(&lookup, "SMTP_TEMPLATE_MAP")?
                .unwrap_or(defaults.template_map),
            template_env: parse_json(&lookup, "SMTP_TEMPLATE_ENV")?
                .unwrap_or(defaults.template_env),
            restock_concurrency: parse_number(&lookup, "SMTP_RESTOCK_CONCURRENCY")?
                .map_or(defaults.restock_concurrency, |n| (n as usize).max(1)),
            fetch_timeout: parse_number(&lookup, "SMTP_FETCH_TIMEOUT_MS")?
                .map(Duration::from_millis),
            send_timeout: parse_number(&lookup, "SMTP_SEND_TIMEOUT_MS")?
                .map(Duration::from_millis),
        })
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    lookup(key)
        .map(|raw| {
            serde_json::from_str(&raw)
                .map_err(|err| NotifierError::Config(format!("{key} is not valid JSON: {err}")))
        })
        .transpose()
}

/// Transport URLs are kept as strings; anything else must be JSON.
fn parse_transport(lookup: &impl Fn(&str) -> Option<String>) -> Result<Option<Value>> {
    match lookup("SMTP_TRANSPORT") {
        Some(raw) if raw.starts_with("smtp://") || raw.starts_with("smtps://") => {
            Ok(Some(Value::String(raw)))
        }
        _ => parse_json(lookup, "SMTP_TRANSPORT"),
    }
}

fn parse_number(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| NotifierError::Config(format!("{key} must be a number, got {raw:?}")))
        })
        .transpose()
}
