//! Payment service trait and in-memory implementation.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::OrderId;
use domain::Money;
use serde::{Deserialize, Serialize};

use crate::error::SagaError;

/// Supported payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Default method.
    #[default]
    CreditCard,
    DebitCard,
    Pix,
}

impl PaymentMethod {
    /// Returns the method name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Pix => "pix",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = SagaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit_card" => Ok(PaymentMethod::CreditCard),
            "debit_card" => Ok(PaymentMethod::DebitCard),
            "pix" => Ok(PaymentMethod::Pix),
            other => Err(SagaError::ExternalService(format!(
                "unknown payment method: {other}"
            ))),
        }
    }
}

/// Trait for payment processing operations.
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Charges an order, returning the payment ID.
    async fn process_payment(
        &self,
        order_id: OrderId,
        amount: Money,
        method: PaymentMethod,
    ) -> Result<String, SagaError>;

    /// Refunds the payment made for an order.
    async fn refund(&self, order_id: OrderId) -> Result<(), SagaError>;
}

#[derive(Debug, Clone)]
struct ChargeRecord {
    payment_id: String,
    amount: Money,
    method: PaymentMethod,
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    payments: HashMap<OrderId, ChargeRecord>,
    next_id: u32,
    fail_on_charge: bool,
}

/// In-memory payment service with synthetic latency, for tests and demos.
#[derive(Debug, Clone)]
pub struct InMemoryPaymentService {
    state: Arc<RwLock<InMemoryPaymentState>>,
    latency: Duration,
}

impl Default for InMemoryPaymentService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPaymentService {
    /// Creates a new in-memory payment service.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryPaymentState::default())),
            latency: Duration::from_millis(1),
        }
    }

    /// Overrides the synthetic latency applied to every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Configures the service to decline the next charge.
    pub fn set_fail_on_charge(&self, fail: bool) {
        self.state.write().unwrap().fail_on_charge = fail;
    }

    /// Returns the number of outstanding payments.
    pub fn payment_count(&self) -> usize {
        self.state.read().unwrap().payments.len()
    }

    /// Returns true if a payment is held for the given order.
    pub fn has_payment_for(&self, order_id: OrderId) -> bool {
        self.state.read().unwrap().payments.contains_key(&order_id)
    }

    /// Returns the charged amount for an order, if any.
    pub fn charged_amount(&self, order_id: OrderId) -> Option<Money> {
        self.state
            .read()
            .unwrap()
            .payments
            .get(&order_id)
            .map(|record| record.amount)
    }

    /// Returns the method used for an order's payment, if any.
    pub fn method_for(&self, order_id: OrderId) -> Option<PaymentMethod> {
        self.state
            .read()
            .unwrap()
            .payments
            .get(&order_id)
            .map(|record| record.method)
    }

    async fn simulate_latency(&self) {
        tokio::time::sleep(self.latency).await;
    }
}

#[async_trait]
impl PaymentService for InMemoryPaymentService {
    async fn process_payment(
        &self,
        order_id: OrderId,
        amount: Money,
        method: PaymentMethod,
    ) -> Result<String, SagaError> {
        self.simulate_latency().await;
        let mut state = self.state.write().unwrap();

        if state.fail_on_charge {
            return Err(SagaError::PaymentRejected { order_id });
        }

        state.next_id += 1;
        let payment_id = format!("PAY-{:04}", state.next_id);
        state.payments.insert(
            order_id,
            ChargeRecord {
                payment_id: payment_id.clone(),
                amount,
                method,
            },
        );

        tracing::debug!(%order_id, %payment_id, %method, "payment captured");
        Ok(payment_id)
    }

    async fn refund(&self, order_id: OrderId) -> Result<(), SagaError> {
        self.simulate_latency().await;
        let mut state = self.state.write().unwrap();
        // Refunding an order without a payment is a tolerated no-op.
        if let Some(record) = state.payments.remove(&order_id) {
            tracing::debug!(%order_id, payment_id = %record.payment_id, "payment refunded");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Currency;
    use rust_decimal_macros::dec;

    fn amount() -> Money {
        Money::new(dec!(50.00), Currency::Brl).unwrap()
    }

    #[tokio::test]
    async fn charge_and_refund() {
        let service = InMemoryPaymentService::new();
        let order_id = OrderId::new();

        let payment_id = service
            .process_payment(order_id, amount(), PaymentMethod::Pix)
            .await
            .unwrap();
        assert!(payment_id.starts_with("PAY-"));
        assert_eq!(service.payment_count(), 1);
        assert_eq!(service.charged_amount(order_id), Some(amount()));
        assert_eq!(service.method_for(order_id), Some(PaymentMethod::Pix));

        service.refund(order_id).await.unwrap();
        assert_eq!(service.payment_count(), 0);
        assert!(!service.has_payment_for(order_id));
    }

    #[tokio::test]
    async fn declined_charge_is_rejected() {
        let service = InMemoryPaymentService::new();
        service.set_fail_on_charge(true);

        let result = service
            .process_payment(OrderId::new(), amount(), PaymentMethod::CreditCard)
            .await;
        assert!(matches!(result, Err(SagaError::PaymentRejected { .. })));
        assert_eq!(service.payment_count(), 0);
    }

    #[tokio::test]
    async fn refund_without_payment_is_noop() {
        let service = InMemoryPaymentService::new();
        assert!(service.refund(OrderId::new()).await.is_ok());
    }

    #[test]
    fn payment_method_parsing() {
        assert_eq!(
            "credit_card".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::CreditCard
        );
        assert_eq!("pix".parse::<PaymentMethod>().unwrap(), PaymentMethod::Pix);
        assert!("cash".parse::<PaymentMethod>().is_err());
    }
}
