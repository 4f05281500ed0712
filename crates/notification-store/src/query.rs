use chrono::{DateTime, Utc};

use crate::NotificationId;

/// Builder for constructing notification queries.
///
/// Results are ordered by creation time, oldest first.
#[derive(Debug, Clone, Default)]
pub struct NotificationQuery {
    /// Filter by event name.
    pub event_name: Option<String>,

    /// Filter by recipient address.
    pub to: Option<String>,

    /// Only resends of this record.
    pub parent_id: Option<NotificationId>,

    /// Filter by records created at or after this timestamp.
    pub from_timestamp: Option<DateTime<Utc>>,

    /// Filter by records created at or before this timestamp.
    pub to_timestamp: Option<DateTime<Utc>>,

    /// Maximum number of records to return.
    pub limit: Option<usize>,

    /// Number of records to skip.
    pub offset: Option<usize>,
}

impl NotificationQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for notifications of one event.
    pub fn for_event(event_name: impl Into<String>) -> Self {
        Self {
            event_name: Some(event_name.into()),
            ..Default::default()
        }
    }

    /// Creates a query for the resends of a record.
    pub fn resends_of(parent_id: NotificationId) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Default::default()
        }
    }

    pub fn event_name(mut self, event_name: impl Into<String>) -> Self {
        self.event_name = Some(event_name.into());
        self
    }

    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.to = Some(recipient.into());
        self
    }

    pub fn parent_id(mut self, parent_id: NotificationId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn from_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.from_timestamp = Some(timestamp);
        self
    }

    pub fn to_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.to_timestamp = Some(timestamp);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}
