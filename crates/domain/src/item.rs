//! Line items and product references.

use serde::{Deserialize, Serialize};

use crate::error::OrderError;
use crate::money::Money;

/// Maximum quantity per line item.
pub const MAX_QUANTITY: u32 = 1000;

/// Reference to a product in a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    id: String,
    name: String,
    description: Option<String>,
}

impl ProductRef {
    /// Creates a product reference. Id and name must not be blank.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Result<Self, OrderError> {
        let id = id.into();
        let name = name.into();
        if id.trim().is_empty() {
            return Err(OrderError::InvalidProduct {
                reason: "product id must not be blank",
            });
        }
        if name.trim().is_empty() {
            return Err(OrderError::InvalidProduct {
                reason: "product name must not be blank",
            });
        }
        Ok(Self {
            id,
            name,
            description: None,
        })
    }

    /// Attaches a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the product ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the product name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl std::fmt::Display for ProductRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// An immutable quantity × unit-price pairing bound to a product.
///
/// The total price is derived and recomputed on construction; quantity and
/// price changes return a new line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    product: ProductRef,
    quantity: u32,
    unit_price: Money,
    total_price: Money,
}

impl LineItem {
    /// Creates a line item.
    ///
    /// Quantity must be in `1..=1000` and the unit price strictly positive.
    pub fn new(product: ProductRef, quantity: u32, unit_price: Money) -> Result<Self, OrderError> {
        if quantity == 0 || quantity > MAX_QUANTITY {
            return Err(OrderError::InvalidQuantity { quantity });
        }
        if unit_price.is_zero() {
            return Err(OrderError::InvalidPrice);
        }
        Ok(Self {
            product,
            quantity,
            unit_price,
            total_price: unit_price.times(quantity),
        })
    }

    /// Returns a new line item with the given quantity.
    pub fn with_quantity(&self, quantity: u32) -> Result<Self, OrderError> {
        Self::new(self.product.clone(), quantity, self.unit_price)
    }

    /// Returns a new line item with the given unit price.
    pub fn with_unit_price(&self, unit_price: Money) -> Result<Self, OrderError> {
        Self::new(self.product.clone(), self.quantity, unit_price)
    }

    /// Returns the product reference.
    pub fn product(&self) -> &ProductRef {
        &self.product
    }

    /// Returns the quantity.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Returns the unit price.
    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// Returns the derived total (unit price × quantity).
    pub fn total_price(&self) -> Money {
        self.total_price
    }

    /// Two items are the same product iff their product ids match.
    pub fn is_same_product(&self, other: &LineItem) -> bool {
        self.product.id() == other.product.id()
    }
}
