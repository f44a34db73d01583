//! Order aggregate root.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::error::{MoneyError, OrderError};
use crate::events::{EventRecord, OrderEvent};
use crate::item::LineItem;
use crate::money::{Currency, Money};
use crate::status::OrderStatus;
use crate::transitions;

/// Identifier of the customer who placed an order. Never blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    /// Creates a customer ID, rejecting blank input.
    pub fn new(id: impl Into<String>) -> Result<Self, OrderError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(OrderError::InvalidCustomerId);
        }
        Ok(Self(id))
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CustomerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Order aggregate root.
///
/// Owns its line items, status, and an append-only buffer of domain events.
/// The buffer is drained explicitly by the caller after dispatch; single-writer
/// use is a hard requirement (there is no internal locking).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier, generated at creation.
    id: OrderId,

    /// Customer who placed the order.
    customer_id: CustomerId,

    /// Line items, in insertion order. Currency-homogeneous.
    items: Vec<LineItem>,

    /// Current lifecycle status.
    status: OrderStatus,

    /// When the order was created.
    created_at: DateTime<Utc>,

    /// When the order was last modified.
    updated_at: DateTime<Utc>,

    /// Free-form notes.
    notes: Option<String>,

    /// Pending domain events, drained by the caller.
    #[serde(skip)]
    events: Vec<EventRecord>,
}

impl Order {
    /// Creates a new pending order for a customer.
    pub fn create(
        customer_id: impl Into<String>,
        notes: Option<String>,
    ) -> Result<Self, OrderError> {
        let customer_id = CustomerId::new(customer_id)?;
        let now = Utc::now();
        let mut order = Self {
            id: OrderId::new(),
            customer_id: customer_id.clone(),
            items: Vec::new(),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            notes: notes.clone(),
            events: Vec::new(),
        };
        order.record(OrderEvent::order_created(customer_id.as_str(), notes));
        Ok(order)
    }
}

// Query methods
impl Order {
    /// Returns the order ID.
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the customer ID.
    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    /// Returns the line items in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Returns the line for a product, if present.
    pub fn get_item(&self, product_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.product().id() == product_id)
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns when the order was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the order was last modified.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the order notes, if any.
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Returns the number of line items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.quantity()).sum()
    }

    /// Returns true if the order has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the currency of the order's items, if any.
    pub fn currency(&self) -> Option<Currency> {
        self.items.first().map(|i| i.unit_price().currency())
    }

    /// Returns the order total: the sum of line totals, or zero in the base
    /// currency when the order is empty.
    pub fn total(&self) -> Money {
        match self.currency() {
            Some(currency) => {
                let amount = self.items.iter().map(|i| i.total_price().amount()).sum();
                Money::from_raw(amount, currency)
            }
            None => Money::zero(Currency::BASE),
        }
    }

    /// Returns true unless the order is in a terminal status.
    pub fn can_be_canceled(&self) -> bool {
        !self.status.is_terminal()
    }
}

// Command methods
impl Order {
    /// Adds an item to the order.
    ///
    /// Items can only be added while the order is pending, and all items must
    /// share one currency. If a line for the same product already exists, the
    /// quantities are merged into a single line.
    pub fn add_item(&mut self, item: LineItem) -> Result<(), OrderError> {
        self.ensure_items_unlocked("add item")?;
        if let Some(currency) = self.currency() {
            let actual = item.unit_price().currency();
            if actual != currency {
                return Err(MoneyError::CurrencyMismatch {
                    expected: currency,
                    actual,
                }
                .into());
            }
        }

        let merged = match self.items.iter().position(|i| i.is_same_product(&item)) {
            Some(pos) => {
                let existing = &self.items[pos];
                let line = existing.with_quantity(existing.quantity() + item.quantity())?;
                self.items[pos] = line.clone();
                line
            }
            None => {
                self.items.push(item.clone());
                item
            }
        };

        self.touch();
        self.record(OrderEvent::item_added(&merged));
        Ok(())
    }

    /// Removes an item from the order.
    pub fn remove_item(&mut self, product_id: &str) -> Result<(), OrderError> {
        self.ensure_items_unlocked("remove item")?;
        let pos = self
            .items
            .iter()
            .position(|i| i.product().id() == product_id)
            .ok_or_else(|| OrderError::ItemNotFound {
                product_id: product_id.to_string(),
            })?;

        self.items.remove(pos);
        self.touch();
        self.record(OrderEvent::item_removed(product_id));
        Ok(())
    }

    /// Changes the quantity of an existing line.
    pub fn change_item_quantity(
        &mut self,
        product_id: &str,
        new_quantity: u32,
    ) -> Result<(), OrderError> {
        self.ensure_items_unlocked("change item quantity")?;
        let pos = self
            .items
            .iter()
            .position(|i| i.product().id() == product_id)
            .ok_or_else(|| OrderError::ItemNotFound {
                product_id: product_id.to_string(),
            })?;

        let old_quantity = self.items[pos].quantity();
        self.items[pos] = self.items[pos].with_quantity(new_quantity)?;
        self.touch();
        self.record(OrderEvent::item_quantity_changed(
            product_id,
            old_quantity,
            new_quantity,
        ));
        Ok(())
    }

    /// Transitions the order to a new status via the transition engine.
    pub fn change_status(&mut self, new_status: OrderStatus) -> Result<(), OrderError> {
        transitions::execute_transition(self, new_status)
    }

    fn ensure_items_unlocked(&self, action: &'static str) -> Result<(), OrderError> {
        if !self.status.can_modify_items() {
            return Err(OrderError::InvalidState {
                status: self.status,
                action,
            });
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Applies a validated status change and emits the associated events.
    ///
    /// Only called by the transition engine after guard evaluation.
    pub(crate) fn apply_status_change(&mut self, to: OrderStatus) {
        let from = self.status;
        self.status = to;
        self.touch();
        self.record(OrderEvent::status_changed(from, to));
        match to {
            OrderStatus::Confirmed => {
                self.record(OrderEvent::order_confirmed(
                    self.customer_id.as_str(),
                    self.total(),
                ));
            }
            OrderStatus::Delivered => {
                self.record(OrderEvent::order_delivered(self.customer_id.as_str()));
            }
            _ => {}
        }
    }
}

// Event buffer
impl Order {
    /// Returns the pending domain events without draining them.
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Drains and returns the pending domain events.
    pub fn take_events(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.events)
    }

    /// Clears the pending domain events.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    fn record(&mut self, event: OrderEvent) {
        self.events.push(EventRecord::new(self.id, event));
    }
}
