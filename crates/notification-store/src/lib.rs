//! Persistence of sent notifications.
//!
//! Records are append-only. A resend is a new record whose `parent_id`
//! points at the record it was resent from.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod record;
pub mod store;

pub use error::{NotificationStoreError, Result};
pub use memory::InMemoryNotificationStore;
pub use postgres::PostgresNotificationStore;
pub use query::NotificationQuery;
pub use record::{NotificationId, NotificationRecord};
pub use store::{NotificationStore, NotificationStoreExt};
