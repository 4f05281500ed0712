//! Notification events and their payloads.

use common::EntityId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{EnrichmentError, Result};

/// The closed set of events the pipeline knows how to enrich.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    OrderPlaced,
    OrderCanceled,
    OrderShipmentCreated,
    OrderGiftCardCreated,
    OrderReturnRequested,
    OrderItemsReturned,
    SwapCreated,
    SwapReceived,
    SwapShipmentCreated,
    ClaimShipmentCreated,
    GiftCardCreated,
    UserPasswordReset,
    CustomerPasswordReset,
    InviteCreated,
    RestockNotificationRestocked,
}

/// Lookup table from wire name to event kind.
pub const EVENT_TABLE: [EventKind; 15] = [
    EventKind::OrderPlaced,
    EventKind::OrderCanceled,
    EventKind::OrderShipmentCreated,
    EventKind::OrderGiftCardCreated,
    EventKind::OrderReturnRequested,
    EventKind::OrderItemsReturned,
    EventKind::SwapCreated,
    EventKind::SwapReceived,
    EventKind::SwapShipmentCreated,
    EventKind::ClaimShipmentCreated,
    EventKind::GiftCardCreated,
    EventKind::UserPasswordReset,
    EventKind::CustomerPasswordReset,
    EventKind::InviteCreated,
    EventKind::RestockNotificationRestocked,
];

impl EventKind {
    /// The event's wire name, e.g. `"order.placed"`.
    pub const fn name(self) -> &'static str {
        match self {
            EventKind::OrderPlaced => "order.placed",
            EventKind::OrderCanceled => "order.canceled",
            EventKind::OrderShipmentCreated => "order.shipment_created",
            EventKind::OrderGiftCardCreated => "order.gift_card_created",
            EventKind::OrderReturnRequested => "order.return_requested",
            EventKind::OrderItemsReturned => "order.items_returned",
            EventKind::SwapCreated => "swap.created",
            EventKind::SwapReceived => "swap.received",
            EventKind::SwapShipmentCreated => "swap.shipment_created",
            EventKind::ClaimShipmentCreated => "claim.shipment_created",
            EventKind::GiftCardCreated => "gift_card.created",
            EventKind::UserPasswordReset => "user.password_reset",
            EventKind::CustomerPasswordReset => "customer.password_reset",
            EventKind::InviteCreated => "invite.created",
            EventKind::RestockNotificationRestocked => "restock-notification.restocked",
        }
    }

    /// Looks up a kind by wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        EVENT_TABLE.iter().copied().find(|kind| kind.name() == name)
    }

    /// Events whose emails carry return labels or invoices.
    pub fn produces_attachments(self) -> bool {
        matches!(
            self,
            EventKind::SwapCreated | EventKind::OrderReturnRequested | EventKind::OrderItemsReturned
        )
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload of events that reference a single aggregate by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityEventData {
    pub id: EntityId,
    /// Set by the host when the customer opted out of this notification.
    #[serde(default)]
    pub no_notification: Option<bool>,
}

impl EntityEventData {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            no_notification: None,
        }
    }
}

/// Payload of shipment events: the parent aggregate and its fulfillment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentEventData {
    pub id: EntityId,
    pub fulfillment_id: EntityId,
    #[serde(default)]
    pub no_notification: Option<bool>,
}

/// Payload of return events: the order and the return request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnEventData {
    pub id: EntityId,
    pub return_id: EntityId,
    #[serde(default)]
    pub no_notification: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapReceivedEventData {
    pub id: EntityId,
    pub order_id: EntityId,
    #[serde(default)]
    pub no_notification: Option<bool>,
}

/// Admin user password reset. Extra fields pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPasswordResetData {
    pub email: String,
    pub token: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Customer password reset. Extra fields pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerPasswordResetData {
    pub id: EntityId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub token: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InviteCreatedData {
    pub id: EntityId,
    pub token: String,
    pub user_email: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A variant came back in stock; `emails` are the waiting subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestockEventData {
    pub variant_id: EntityId,
    #[serde(default)]
    pub emails: Vec<String>,
}

/// A named event with its decoded payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationEvent {
    OrderPlaced(EntityEventData),
    OrderCanceled(EntityEventData),
    OrderShipmentCreated(ShipmentEventData),
    OrderGiftCardCreated(EntityEventData),
    OrderReturnRequested(ReturnEventData),
    OrderItemsReturned(ReturnEventData),
    SwapCreated(EntityEventData),
    SwapReceived(SwapReceivedEventData),
    SwapShipmentCreated(ShipmentEventData),
    ClaimShipmentCreated(ShipmentEventData),
    GiftCardCreated(EntityEventData),
    UserPasswordReset(UserPasswordResetData),
    CustomerPasswordReset(CustomerPasswordResetData),
    InviteCreated(InviteCreatedData),
    RestockNotificationRestocked(RestockEventData),
    /// Any name outside the known set; enriches to an empty context.
    Unknown(String),
}

impl NotificationEvent {
    /// Decodes `payload` according to the event `name`.
    ///
    /// Unknown names are accepted without looking at the payload.
    pub fn parse(name: &str, payload: Value) -> Result<Self> {
        let Some(kind) = EventKind::from_name(name) else {
            return Ok(NotificationEvent::Unknown(name.to_string()));
        };

        Ok(match kind {
            EventKind::OrderPlaced => Self::OrderPlaced(decode(kind, payload)?),
            EventKind::OrderCanceled => Self::OrderCanceled(decode(kind, payload)?),
            EventKind::OrderShipmentCreated => Self::OrderShipmentCreated(decode(kind, payload)?),
            EventKind::OrderGiftCardCreated => Self::OrderGiftCardCreated(decode(kind, payload)?),
            EventKind::OrderReturnRequested => Self::OrderReturnRequested(decode(kind, payload)?),
            EventKind::OrderItemsReturned => Self::OrderItemsReturned(decode(kind, payload)?),
            EventKind::SwapCreated => Self::SwapCreated(decode(kind, payload)?),
            EventKind::SwapReceived => Self::SwapReceived(decode(kind, payload)?),
            EventKind::SwapShipmentCreated => Self::SwapShipmentCreated(decode(kind, payload)?),
            EventKind::ClaimShipmentCreated => Self::ClaimShipmentCreated(decode(kind, payload)?),
            EventKind::GiftCardCreated => Self::GiftCardCreated(decode(kind, payload)?),
            EventKind::UserPasswordReset => Self::UserPasswordReset(decode(kind, payload)?),
            EventKind::CustomerPasswordReset => Self::CustomerPasswordReset(decode(kind, payload)?),
            EventKind::InviteCreated => Self::InviteCreated(decode(kind, payload)?),
            EventKind::RestockNotificationRestocked => {
                Self::RestockNotificationRestocked(decode(kind, payload)?)
            }
        })
    }

    /// The event kind, or `None` for unknown events.
    pub fn kind(&self) -> Option<EventKind> {
        Some(match self {
            Self::OrderPlaced(_) => EventKind::OrderPlaced,
            Self::OrderCanceled(_) => EventKind::OrderCanceled,
            Self::OrderShipmentCreated(_) => EventKind::OrderShipmentCreated,
            Self::OrderGiftCardCreated(_) => EventKind::OrderGiftCardCreated,
            Self::OrderReturnRequested(_) => EventKind::OrderReturnRequested,
            Self::OrderItemsReturned(_) => EventKind::OrderItemsReturned,
            Self::SwapCreated(_) => EventKind::SwapCreated,
            Self::SwapReceived(_) => EventKind::SwapReceived,
            Self::SwapShipmentCreated(_) => EventKind::SwapShipmentCreated,
            Self::ClaimShipmentCreated(_) => EventKind::ClaimShipmentCreated,
            Self::GiftCardCreated(_) => EventKind::GiftCardCreated,
            Self::UserPasswordReset(_) => EventKind::UserPasswordReset,
            Self::CustomerPasswordReset(_) => EventKind::CustomerPasswordReset,
            Self::InviteCreated(_) => EventKind::InviteCreated,
            Self::RestockNotificationRestocked(_) => EventKind::RestockNotificationRestocked,
            Self::Unknown(_) => return None,
        })
    }

    /// The wire name the event was published under.
    pub fn name(&self) -> &str {
        match self {
            Self::Unknown(name) => name,
            other => other.kind().map(EventKind::name).unwrap_or_default(),
        }
    }

    /// True when the host flagged the event as not to be notified.
    pub fn is_suppressed(&self) -> bool {
        let flag = match self {
            Self::OrderPlaced(d)
            | Self::OrderCanceled(d)
            | Self::OrderGiftCardCreated(d)
            | Self::SwapCreated(d)
            | Self::GiftCardCreated(d) => d.no_notification,
            Self::OrderShipmentCreated(d)
            | Self::SwapShipmentCreated(d)
            | Self::ClaimShipmentCreated(d) => d.no_notification,
            Self::OrderReturnRequested(d) | Self::OrderItemsReturned(d) => d.no_notification,
            Self::SwapReceived(d) => d.no_notification,
            _ => None,
        };
        flag.unwrap_or(false)
    }
}

fn decode<T: DeserializeOwned>(kind: EventKind, payload: Value) -> Result<T> {
    serde_json::from_value(payload).map_err(|source| EnrichmentError::InvalidPayload {
        event: kind.name(),
        source,
    })
}
