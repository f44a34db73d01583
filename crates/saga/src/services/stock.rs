//! Stock service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::OrderId;

use crate::error::SagaError;

/// Trait for stock management operations.
#[async_trait]
pub trait StockService: Send + Sync {
    /// Returns true if the product has at least `quantity` units available.
    async fn check_availability(&self, product_id: &str, quantity: u32)
    -> Result<bool, SagaError>;

    /// Reserves units for an order, returning the reservation ID.
    async fn reserve(
        &self,
        product_id: &str,
        quantity: u32,
        order_id: OrderId,
    ) -> Result<String, SagaError>;

    /// Releases a reservation, returning its units to stock.
    async fn release(&self, reservation_id: &str) -> Result<(), SagaError>;

    /// Commits a reservation, making the deduction permanent.
    async fn commit(&self, reservation_id: &str) -> Result<(), SagaError>;
}

#[derive(Debug, Clone)]
struct Reservation {
    product_id: String,
    quantity: u32,
    order_id: OrderId,
}

#[derive(Debug, Default)]
struct InMemoryStockState {
    levels: HashMap<String, u32>,
    reservations: HashMap<String, Reservation>,
    next_id: u32,
    fail_on_reserve: bool,
}

/// In-memory stock service with synthetic latency, for tests and demos.
#[derive(Debug, Clone)]
pub struct InMemoryStockService {
    state: Arc<RwLock<InMemoryStockState>>,
    latency: Duration,
}

impl Default for InMemoryStockService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStockService {
    /// Creates a new in-memory stock service.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryStockState::default())),
            latency: Duration::from_millis(1),
        }
    }

    /// Overrides the synthetic latency applied to every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Sets the available stock level for a product.
    pub fn set_stock(&self, product_id: impl Into<String>, quantity: u32) {
        self.state
            .write()
            .unwrap()
            .levels
            .insert(product_id.into(), quantity);
    }

    /// Returns the available stock level for a product.
    pub fn available(&self, product_id: &str) -> Option<u32> {
        self.state.read().unwrap().levels.get(product_id).copied()
    }

    /// Configures the service to fail on the next reserve call.
    pub fn set_fail_on_reserve(&self, fail: bool) {
        self.state.write().unwrap().fail_on_reserve = fail;
    }

    /// Returns the number of active reservations.
    pub fn reservation_count(&self) -> usize {
        self.state.read().unwrap().reservations.len()
    }

    /// Returns true if a reservation exists with the given ID.
    pub fn has_reservation(&self, reservation_id: &str) -> bool {
        self.state
            .read()
            .unwrap()
            .reservations
            .contains_key(reservation_id)
    }

    /// Returns true if any reservation is held for the given order.
    pub fn has_reservation_for(&self, order_id: OrderId) -> bool {
        self.state
            .read()
            .unwrap()
            .reservations
            .values()
            .any(|r| r.order_id == order_id)
    }

    async fn simulate_latency(&self) {
        tokio::time::sleep(self.latency).await;
    }
}

#[async_trait]
impl StockService for InMemoryStockService {
    async fn check_availability(
        &self,
        product_id: &str,
        quantity: u32,
    ) -> Result<bool, SagaError> {
        self.simulate_latency().await;
        let state = self.state.read().unwrap();
        match state.levels.get(product_id) {
            Some(level) => Ok(*level >= quantity),
            None => Err(SagaError::ProductNotFound {
                product_id: product_id.to_string(),
            }),
        }
    }

    async fn reserve(
        &self,
        product_id: &str,
        quantity: u32,
        order_id: OrderId,
    ) -> Result<String, SagaError> {
        self.simulate_latency().await;
        let mut state = self.state.write().unwrap();

        if state.fail_on_reserve {
            return Err(SagaError::ExternalService(
                "stock service unavailable".to_string(),
            ));
        }

        let level = state
            .levels
            .get_mut(product_id)
            .ok_or_else(|| SagaError::ProductNotFound {
                product_id: product_id.to_string(),
            })?;
        if *level < quantity {
            return Err(SagaError::InsufficientStock {
                product_id: product_id.to_string(),
            });
        }
        *level -= quantity;

        state.next_id += 1;
        let reservation_id = format!("RES-{:04}", state.next_id);
        state.reservations.insert(
            reservation_id.clone(),
            Reservation {
                product_id: product_id.to_string(),
                quantity,
                order_id,
            },
        );

        Ok(reservation_id)
    }

    async fn release(&self, reservation_id: &str) -> Result<(), SagaError> {
        self.simulate_latency().await;
        let mut state = self.state.write().unwrap();
        // Releasing an unknown reservation is a tolerated no-op.
        if let Some(reservation) = state.reservations.remove(reservation_id) {
            *state.levels.entry(reservation.product_id).or_insert(0) += reservation.quantity;
        }
        Ok(())
    }

    async fn commit(&self, reservation_id: &str) -> Result<(), SagaError> {
        self.simulate_latency().await;
        let mut state = self.state.write().unwrap();
        state
            .reservations
            .remove(reservation_id)
            .map(|_| ())
            .ok_or_else(|| SagaError::ReservationNotFound {
                reservation_id: reservation_id.to_string(),
            })
    }
}
