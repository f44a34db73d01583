//! Order domain events.
//!
//! The aggregate appends an [`EventRecord`] to its internal buffer for every
//! state change; callers drain the buffer after dispatching to an event
//! publisher. The core never depends on delivery succeeding.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::item::LineItem;
use crate::money::Money;
use crate::status::OrderStatus;

/// Events that can occur on an order aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// Order was created.
    OrderCreated(OrderCreatedData),

    /// Item was added to the order (or merged into an existing line).
    ItemAdded(ItemAddedData),

    /// Item was removed from the order.
    ItemRemoved(ItemRemovedData),

    /// Item quantity was changed.
    ItemQuantityChanged(ItemQuantityChangedData),

    /// Order status changed.
    StatusChanged(StatusChangedData),

    /// Order entered the Confirmed status (notification side-channel).
    OrderConfirmed(OrderConfirmedData),

    /// Order entered the Delivered status (notification side-channel).
    OrderDelivered(OrderDeliveredData),
}

impl OrderEvent {
    /// Returns the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated(_) => "OrderCreated",
            OrderEvent::ItemAdded(_) => "ItemAdded",
            OrderEvent::ItemRemoved(_) => "ItemRemoved",
            OrderEvent::ItemQuantityChanged(_) => "ItemQuantityChanged",
            OrderEvent::StatusChanged(_) => "StatusChanged",
            OrderEvent::OrderConfirmed(_) => "OrderConfirmed",
            OrderEvent::OrderDelivered(_) => "OrderDelivered",
        }
    }
}

/// Data for OrderCreated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreatedData {
    /// The customer who placed the order.
    pub customer_id: String,

    /// Free-form order notes, if any.
    pub notes: Option<String>,
}

/// Data for ItemAdded event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemAddedData {
    /// The product that was added.
    pub product_id: String,

    /// Product name.
    pub product_name: String,

    /// Resulting line quantity (after merge, if any).
    pub quantity: u32,

    /// Unit price of the line.
    pub unit_price: Money,

    /// Resulting line total.
    pub total_price: Money,
}

/// Data for ItemRemoved event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRemovedData {
    /// The product that was removed.
    pub product_id: String,
}

/// Data for ItemQuantityChanged event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemQuantityChangedData {
    /// The product whose quantity changed.
    pub product_id: String,

    /// Previous quantity.
    pub old_quantity: u32,

    /// New quantity.
    pub new_quantity: u32,
}

/// Data for StatusChanged event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangedData {
    /// Status before the transition.
    pub from: OrderStatus,

    /// Status after the transition.
    pub to: OrderStatus,
}

/// Data for OrderConfirmed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderConfirmedData {
    /// The customer to notify.
    pub customer_id: String,

    /// Order total at confirmation time.
    pub total: Money,
}

/// Data for OrderDelivered event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDeliveredData {
    /// The customer to notify.
    pub customer_id: String,
}

// Convenience constructors for events
impl OrderEvent {
    /// Creates an OrderCreated event.
    pub fn order_created(customer_id: impl Into<String>, notes: Option<String>) -> Self {
        OrderEvent::OrderCreated(OrderCreatedData {
            customer_id: customer_id.into(),
            notes,
        })
    }

    /// Creates an ItemAdded event from the resulting line.
    pub fn item_added(item: &LineItem) -> Self {
        OrderEvent::ItemAdded(ItemAddedData {
            product_id: item.product().id().to_string(),
            product_name: item.product().name().to_string(),
            quantity: item.quantity(),
            unit_price: item.unit_price(),
            total_price: item.total_price(),
        })
    }

    /// Creates an ItemRemoved event.
    pub fn item_removed(product_id: impl Into<String>) -> Self {
        OrderEvent::ItemRemoved(ItemRemovedData {
            product_id: product_id.into(),
        })
    }

    /// Creates an ItemQuantityChanged event.
    pub fn item_quantity_changed(
        product_id: impl Into<String>,
        old_quantity: u32,
        new_quantity: u32,
    ) -> Self {
        OrderEvent::ItemQuantityChanged(ItemQuantityChangedData {
            product_id: product_id.into(),
            old_quantity,
            new_quantity,
        })
    }

    /// Creates a StatusChanged event.
    pub fn status_changed(from: OrderStatus, to: OrderStatus) -> Self {
        OrderEvent::StatusChanged(StatusChangedData { from, to })
    }

    /// Creates an OrderConfirmed event.
    pub fn order_confirmed(customer_id: impl Into<String>, total: Money) -> Self {
        OrderEvent::OrderConfirmed(OrderConfirmedData {
            customer_id: customer_id.into(),
            total,
        })
    }

    /// Creates an OrderDelivered event.
    pub fn order_delivered(customer_id: impl Into<String>) -> Self {
        OrderEvent::OrderDelivered(OrderDeliveredData {
            customer_id: customer_id.into(),
        })
    }
}

/// A recorded domain event, ready for out-of-process delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique event identifier.
    pub event_id: Uuid,

    /// The order the event belongs to.
    pub aggregate_id: OrderId,

    /// When the event occurred.
    pub occurred_on: DateTime<Utc>,

    /// The event itself.
    pub payload: OrderEvent,
}

impl EventRecord {
    /// Records an event against an aggregate, stamped with the current time.
    pub fn new(aggregate_id: OrderId, payload: OrderEvent) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            aggregate_id,
            occurred_on: Utc::now(),
            payload,
        }
    }

    /// Returns the event type name of the payload.
    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ProductRef;
    use crate::money::Currency;
    use rust_decimal_macros::dec;

    #[test]
    fn event_type_names() {
        let event = OrderEvent::order_created("c1", None);
        assert_eq!(event.event_type(), "OrderCreated");

        let item = LineItem::new(
            ProductRef::new("SKU-001", "Widget").unwrap(),
            2,
            Money::new(dec!(10), Currency::Brl).unwrap(),
        )
        .unwrap();
        assert_eq!(OrderEvent::item_added(&item).event_type(), "ItemAdded");
        assert_eq!(
            OrderEvent::item_removed("SKU-001").event_type(),
            "ItemRemoved"
        );
        assert_eq!(
            OrderEvent::item_quantity_changed("SKU-001", 1, 3).event_type(),
            "ItemQuantityChanged"
        );
        assert_eq!(
            OrderEvent::status_changed(OrderStatus::Pending, OrderStatus::Confirmed).event_type(),
            "StatusChanged"
        );
        assert_eq!(
            OrderEvent::order_confirmed("c1", Money::zero(Currency::Brl)).event_type(),
            "OrderConfirmed"
        );
        assert_eq!(
            OrderEvent::order_delivered("c1").event_type(),
            "OrderDelivered"
        );
    }

    #[test]
    fn record_carries_envelope_fields() {
        let aggregate_id = OrderId::new();
        let record = EventRecord::new(aggregate_id, OrderEvent::order_created("c1", None));

        assert_eq!(record.aggregate_id, aggregate_id);
        assert_eq!(record.event_type(), "OrderCreated");
    }

    #[test]
    fn event_serialization_roundtrip() {
        let event = OrderEvent::item_quantity_changed("SKU-001", 2, 5);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("ItemQuantityChanged"));

        let deserialized: OrderEvent = serde_json::from_str(&json).unwrap();
        if let OrderEvent::ItemQuantityChanged(data) = deserialized {
            assert_eq!(data.old_quantity, 2);
            assert_eq!(data.new_quantity, 5);
        } else {
            panic!("Expected ItemQuantityChanged event");
        }
    }

    #[test]
    fn record_serialization_roundtrip() {
        let record = EventRecord::new(OrderId::new(), OrderEvent::order_delivered("c1"));
        let json = serde_json::to_string(&record).unwrap();
        let deserialized: EventRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.event_id, record.event_id);
        assert_eq!(deserialized.event_type(), "OrderDelivered");
    }
}
