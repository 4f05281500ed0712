//! HTTP route handlers.

pub mod events;
pub mod health;
pub mod metrics;
pub mod notifications;
pub mod smtp;

use std::sync::Arc;

use notification_store::NotificationStore;
use notifier::{NotificationAssembler, NotificationSubscriber};

use crate::tasks::BackgroundTasks;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub assembler: NotificationAssembler,
    pub subscriber: NotificationSubscriber,
    pub store: Arc<dyn NotificationStore>,
    /// Event handling still running after ingress answered.
    pub tasks: BackgroundTasks,
}
