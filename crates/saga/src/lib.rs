//! Saga orchestration for the order processing core.
//!
//! This crate provides:
//! - `SagaStep` contract and the built-in order-fulfillment steps
//! - `SagaOrchestrator` with automatic reverse-order compensation
//! - `SagaContext` threading mutable state through one saga run
//! - Mock stock and payment services behind async traits

pub mod context;
pub mod error;
pub mod fulfillment;
pub mod orchestrator;
pub mod services;
pub mod step;

pub use context::SagaContext;
pub use error::{Result, SagaError};
pub use orchestrator::SagaOrchestrator;
pub use services::{
    InMemoryPaymentService, InMemoryStockService, PaymentMethod, PaymentService, StockService,
};
pub use step::SagaStep;
