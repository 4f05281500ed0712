use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Unique identifier for a stored notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(Uuid);

impl NotificationId {
    /// Creates a new random notification ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for NotificationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for NotificationId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A notification as it was handed to the mailer.
///
/// `data` is the template context the mail was rendered from; resends
/// render from it again without re-fetching any aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: NotificationId,
    pub event_name: String,
    /// Recipient address, if one was known.
    pub to: Option<String>,
    pub data: Value,
    /// The record this one was resent from.
    pub parent_id: Option<NotificationId>,
    pub created_at: DateTime<Utc>,
}

impl NotificationRecord {
    /// Creates a record stamped with a fresh id and the current time.
    pub fn new(event_name: impl Into<String>, to: Option<String>, data: Value) -> Self {
        Self {
            id: NotificationId::new(),
            event_name: event_name.into(),
            to,
            data,
            parent_id: None,
            created_at: Utc::now(),
        }
    }

    /// Marks this record as a resend of `parent`.
    pub fn resend_of(mut self, parent: NotificationId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    pub fn is_resend(&self) -> bool {
        self.parent_id.is_some()
    }
}
