//! Enrichment side of the notification pipeline.
//!
//! This crate turns a domain event into a display-ready template context:
//! - [`NotificationEvent`] is the closed set of events with typed payloads
//! - [`EventRouter`] maps each event to exactly one aggregate fetcher
//! - the fetchers load aggregates through [`AggregateSources`] and project
//!   them with the money formatter and [`LocaleResolver`]
//! - [`TemplateContext`] is the projected result

pub mod context;
pub mod error;
pub mod event;
pub mod fetchers;
pub mod locale;
pub mod router;
pub mod sources;

pub use context::{TemplateContext, TemplateContextBuilder};
pub use error::{EnrichmentError, Result};
pub use event::{
    CustomerPasswordResetData, EntityEventData, EventKind, InviteCreatedData, NotificationEvent,
    RestockEventData, ReturnEventData, ShipmentEventData, SwapReceivedEventData,
    UserPasswordResetData,
};
pub use locale::LocaleResolver;
pub use router::EventRouter;
pub use sources::{AggregateSources, InMemorySources};
