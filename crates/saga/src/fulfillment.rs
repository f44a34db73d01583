//! Built-in steps for the order fulfillment saga.
//!
//! The default flow is confirm → verify stock → pay → reserve → prepare →
//! label → ship. Each step knows how to undo its own effect; cancellation of
//! the order itself is `confirm-order`'s compensation.

use std::sync::Arc;

use async_trait::async_trait;
use domain::{OrderStatus, transitions};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::context::SagaContext;
use crate::error::SagaError;
use crate::services::{PaymentMethod, PaymentService, StockService};
use crate::step::SagaStep;

/// Name of the default fulfillment saga.
pub const SAGA_NAME: &str = "order-fulfillment";

pub const STEP_CONFIRM_ORDER: &str = "confirm-order";
pub const STEP_VERIFY_STOCK: &str = "verify-stock";
pub const STEP_PROCESS_PAYMENT: &str = "process-payment";
pub const STEP_RESERVE_STOCK: &str = "reserve-stock";
pub const STEP_START_PREPARATION: &str = "start-preparation";
pub const STEP_PREPARE_SHIPMENT: &str = "prepare-shipment";
pub const STEP_SHIP_ORDER: &str = "ship-order";

/// Parameter key: payment method requested by the caller.
pub const PARAM_PAYMENT_METHOD: &str = "payment_method";
/// Parameter key: payment ID returned by the payment service.
pub const PARAM_PAYMENT_ID: &str = "payment_id";
/// Parameter key: reservation IDs held against the order.
pub const PARAM_RESERVATIONS: &str = "reservations";
/// Parameter key: generated shipment tracking code.
pub const PARAM_TRACKING_CODE: &str = "tracking_code";

/// Builds the default fulfillment steps in execution order.
pub fn default_steps(
    stock: Arc<dyn StockService>,
    payment: Arc<dyn PaymentService>,
) -> Vec<Arc<dyn SagaStep>> {
    vec![
        Arc::new(ConfirmOrder),
        Arc::new(VerifyStock {
            stock: stock.clone(),
        }),
        Arc::new(ProcessPayment { payment }),
        Arc::new(ReserveStock {
            stock: stock.clone(),
        }),
        Arc::new(StartPreparation),
        Arc::new(PrepareShipment),
        Arc::new(ShipOrder { stock }),
    ]
}

fn push_reservation(ctx: &mut SagaContext, reservation_id: String) {
    let mut list = match ctx.param(PARAM_RESERVATIONS) {
        Some(Value::Array(values)) => values.clone(),
        _ => Vec::new(),
    };
    list.push(json!(reservation_id));
    ctx.set_param(PARAM_RESERVATIONS, Value::Array(list));
}

fn take_reservations(ctx: &mut SagaContext) -> Vec<String> {
    match ctx.remove_param(PARAM_RESERVATIONS) {
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Confirms the order via the transition engine.
///
/// The engine guard enforces that the order is non-empty with a positive
/// total, so an empty order fails here before any external call is made.
pub struct ConfirmOrder;

#[async_trait]
impl SagaStep for ConfirmOrder {
    fn id(&self) -> &str {
        STEP_CONFIRM_ORDER
    }

    fn name(&self) -> &str {
        "Confirm order"
    }

    async fn execute(&self, ctx: &mut SagaContext) -> Result<(), SagaError> {
        transitions::execute_transition(ctx.order_mut(), OrderStatus::Confirmed)?;
        Ok(())
    }

    async fn compensate(&self, ctx: &mut SagaContext) -> Result<(), SagaError> {
        let order = ctx.order_mut();
        // Only undo a confirmation that actually happened; a still-pending
        // order is left alone.
        if order.status() != OrderStatus::Pending
            && transitions::can_transition(order, OrderStatus::Canceled)
        {
            transitions::execute_transition(order, OrderStatus::Canceled)?;
        }
        Ok(())
    }
}

/// Checks availability for every line against the stock service.
pub struct VerifyStock {
    pub stock: Arc<dyn StockService>,
}

#[async_trait]
impl SagaStep for VerifyStock {
    fn id(&self) -> &str {
        STEP_VERIFY_STOCK
    }

    fn name(&self) -> &str {
        "Verify stock availability"
    }

    async fn execute(&self, ctx: &mut SagaContext) -> Result<(), SagaError> {
        let lines: Vec<(String, u32)> = ctx
            .order()
            .items()
            .iter()
            .map(|item| (item.product().id().to_string(), item.quantity()))
            .collect();

        for (product_id, quantity) in lines {
            if !self.stock.check_availability(&product_id, quantity).await? {
                return Err(SagaError::InsufficientStock { product_id });
            }
        }
        Ok(())
    }

    async fn compensate(&self, ctx: &mut SagaContext) -> Result<(), SagaError> {
        // Verification holds nothing itself; release any reservation that is
        // still recorded against the context.
        for reservation_id in take_reservations(ctx) {
            self.stock.release(&reservation_id).await?;
        }
        Ok(())
    }
}

/// Charges the order total via the payment service.
pub struct ProcessPayment {
    pub payment: Arc<dyn PaymentService>,
}

#[async_trait]
impl SagaStep for ProcessPayment {
    fn id(&self) -> &str {
        STEP_PROCESS_PAYMENT
    }

    fn name(&self) -> &str {
        "Process payment"
    }

    fn can_execute(&self, ctx: &SagaContext) -> bool {
        !ctx.order().is_empty()
    }

    async fn execute(&self, ctx: &mut SagaContext) -> Result<(), SagaError> {
        let method = ctx
            .param_str(PARAM_PAYMENT_METHOD)
            .and_then(|s| s.parse::<PaymentMethod>().ok())
            .unwrap_or_default();
        let order_id = ctx.order().id();
        let amount = ctx.order().total();

        let payment_id = self.payment.process_payment(order_id, amount, method).await?;
        ctx.set_param(PARAM_PAYMENT_ID, json!(payment_id));
        Ok(())
    }

    async fn compensate(&self, ctx: &mut SagaContext) -> Result<(), SagaError> {
        let order_id = ctx.order().id();
        self.payment.refund(order_id).await?;
        ctx.remove_param(PARAM_PAYMENT_ID);
        Ok(())
    }
}

/// Reserves stock for every line, recording the reservation IDs.
pub struct ReserveStock {
    pub stock: Arc<dyn StockService>,
}

#[async_trait]
impl SagaStep for ReserveStock {
    fn id(&self) -> &str {
        STEP_RESERVE_STOCK
    }

    fn name(&self) -> &str {
        "Reserve stock"
    }

    async fn execute(&self, ctx: &mut SagaContext) -> Result<(), SagaError> {
        let order_id = ctx.order().id();
        let lines: Vec<(String, u32)> = ctx
            .order()
            .items()
            .iter()
            .map(|item| (item.product().id().to_string(), item.quantity()))
            .collect();

        for (product_id, quantity) in lines {
            let reservation_id = self.stock.reserve(&product_id, quantity, order_id).await?;
            push_reservation(ctx, reservation_id);
        }
        Ok(())
    }

    async fn compensate(&self, ctx: &mut SagaContext) -> Result<(), SagaError> {
        for reservation_id in take_reservations(ctx).into_iter().rev() {
            self.stock.release(&reservation_id).await?;
        }
        Ok(())
    }
}

/// Moves the order into preparation.
pub struct StartPreparation;

#[async_trait]
impl SagaStep for StartPreparation {
    fn id(&self) -> &str {
        STEP_START_PREPARATION
    }

    fn name(&self) -> &str {
        "Start preparation"
    }

    async fn execute(&self, ctx: &mut SagaContext) -> Result<(), SagaError> {
        transitions::execute_transition(ctx.order_mut(), OrderStatus::Preparing)?;
        Ok(())
    }

    async fn compensate(&self, ctx: &mut SagaContext) -> Result<(), SagaError> {
        // Preparation halts implicitly when the order is canceled by
        // confirm-order's compensation.
        tracing::debug!(order_id = %ctx.order().id(), "preparation abandoned");
        Ok(())
    }
}

/// Marks the order ready and generates the shipment tracking code.
pub struct PrepareShipment;

#[async_trait]
impl SagaStep for PrepareShipment {
    fn id(&self) -> &str {
        STEP_PREPARE_SHIPMENT
    }

    fn name(&self) -> &str {
        "Prepare shipment"
    }

    async fn execute(&self, ctx: &mut SagaContext) -> Result<(), SagaError> {
        transitions::execute_transition(ctx.order_mut(), OrderStatus::Ready)?;
        let tracking_code = format!("TRK-{}", Uuid::new_v4().simple());
        ctx.set_param(PARAM_TRACKING_CODE, json!(tracking_code));
        Ok(())
    }

    async fn compensate(&self, ctx: &mut SagaContext) -> Result<(), SagaError> {
        if let Some(code) = ctx.remove_param(PARAM_TRACKING_CODE) {
            tracing::debug!(order_id = %ctx.order().id(), ?code, "tracking code voided");
        }
        Ok(())
    }
}

/// Ships the order, committing held stock reservations.
pub struct ShipOrder {
    pub stock: Arc<dyn StockService>,
}

#[async_trait]
impl SagaStep for ShipOrder {
    fn id(&self) -> &str {
        STEP_SHIP_ORDER
    }

    fn name(&self) -> &str {
        "Ship order"
    }

    async fn execute(&self, ctx: &mut SagaContext) -> Result<(), SagaError> {
        transitions::execute_transition(ctx.order_mut(), OrderStatus::Shipped)?;
        for reservation_id in take_reservations(ctx) {
            self.stock.commit(&reservation_id).await?;
        }
        Ok(())
    }

    async fn compensate(&self, ctx: &mut SagaContext) -> Result<(), SagaError> {
        // A shipped order cannot be recalled by this core.
        tracing::warn!(order_id = %ctx.order().id(), "cannot recall a shipped order");
        Ok(())
    }
}
