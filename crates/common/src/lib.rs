//! Shared types used across the notification pipeline crates.

pub mod types;

pub use types::EntityId;
