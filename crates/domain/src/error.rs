//! Domain error types.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::money::Currency;
use crate::status::OrderStatus;

/// Errors produced by monetary value construction and arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Amount is negative or not representable.
    #[error("Invalid amount: {amount} (must be finite and non-negative)")]
    InvalidAmount { amount: Decimal },

    /// Currency code is not one of the supported currencies.
    #[error("Invalid currency: {code}")]
    InvalidCurrency { code: String },

    /// Two amounts with different currencies were combined.
    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch {
        expected: Currency,
        actual: Currency,
    },

    /// Subtraction would produce a negative amount.
    #[error("Operation would result in a negative amount")]
    NegativeResult,

    /// Scalar is out of range for the operation.
    #[error("Invalid scalar: {scalar}")]
    InvalidScalar { scalar: Decimal },
}

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Monetary arithmetic failed.
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    /// Customer ID is blank.
    #[error("Customer ID must not be blank")]
    InvalidCustomerId,

    /// Product reference is missing a required field.
    #[error("Invalid product: {reason}")]
    InvalidProduct { reason: &'static str },

    /// Quantity is outside the allowed range.
    #[error("Invalid quantity: {quantity} (must be between 1 and 1000)")]
    InvalidQuantity { quantity: u32 },

    /// Unit price must be strictly positive.
    #[error("Unit price must be greater than zero")]
    InvalidPrice,

    /// Operation is invalid for the order's current status.
    #[error("Invalid state: cannot {action} while order is {status}")]
    InvalidState {
        status: OrderStatus,
        action: &'static str,
    },

    /// Item not found in the order.
    #[error("Item not found: {product_id}")]
    ItemNotFound { product_id: String },

    /// No transition edge exists between the two statuses.
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Guard rejection for the common confirm-empty-order case.
    #[error("Cannot confirm an empty order")]
    EmptyOrderConfirmation,

    /// No transition path exists between the two statuses.
    #[error("No transition path from {from} to {to}")]
    UnreachableTarget { from: OrderStatus, to: OrderStatus },

    /// Coupon code is not registered.
    #[error("Coupon not found: {code}")]
    CouponNotFound { code: String },
}
