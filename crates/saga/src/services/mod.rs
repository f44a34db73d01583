//! External service contracts consumed by saga steps.
//!
//! The real stock and payment systems live outside this core; the traits
//! here are their seams, and the in-memory implementations are mocks with
//! synthetic latency and failure toggles.

pub mod payment;
pub mod stock;

pub use payment::{InMemoryPaymentService, PaymentMethod, PaymentService};
pub use stock::{InMemoryStockService, StockService};
