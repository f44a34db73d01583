//! Saga error types.

use common::OrderId;
use domain::OrderError;
use thiserror::Error;

/// Errors that can occur during saga operations.
#[derive(Debug, Error)]
pub enum SagaError {
    /// No step is registered under the given ID.
    #[error("Step not found: {id}")]
    StepNotFound { id: String },

    /// The step's precondition rejected the current context.
    #[error("Step '{id}' cannot execute in the current context")]
    StepNotExecutable { id: String },

    /// Stock service could not cover the requested quantity.
    #[error("Insufficient stock for product {product_id}")]
    InsufficientStock { product_id: String },

    /// Product is unknown to the stock service.
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: String },

    /// Reservation is unknown to the stock service.
    #[error("Reservation not found: {reservation_id}")]
    ReservationNotFound { reservation_id: String },

    /// Payment service declined the charge.
    #[error("Payment rejected for order {order_id}")]
    PaymentRejected { order_id: OrderId },

    /// Transient failure from an external service.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Domain error.
    #[error("Domain error: {0}")]
    Domain(#[from] OrderError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
