//! Integration tests for the order fulfillment saga.
//!
//! These tests drive the orchestrator end to end against the in-memory
//! stock and payment services, covering the happy path, per-step failures
//! with automatic rollback, and partial compensation.

use std::sync::Arc;

use domain::{Currency, LineItem, Money, Order, OrderStatus, ProductRef};
use rust_decimal_macros::dec;
use saga::fulfillment::{
    self, PARAM_PAYMENT_ID, PARAM_TRACKING_CODE, STEP_CONFIRM_ORDER, STEP_PROCESS_PAYMENT,
    STEP_VERIFY_STOCK,
};
use saga::{
    InMemoryPaymentService, InMemoryStockService, SagaContext, SagaError, SagaOrchestrator,
};

struct Fixture {
    orchestrator: SagaOrchestrator,
    stock: InMemoryStockService,
    payment: InMemoryPaymentService,
}

fn setup() -> Fixture {
    let stock = InMemoryStockService::new();
    let payment = InMemoryPaymentService::new();
    let orchestrator = SagaOrchestrator::new(
        Arc::new(stock.clone()),
        Arc::new(payment.clone()),
    );
    Fixture {
        orchestrator,
        stock,
        payment,
    }
}

fn order_with_items() -> Order {
    let mut order = Order::create("customer-1", None).unwrap();
    order
        .add_item(
            LineItem::new(
                ProductRef::new("SKU-001", "Widget").unwrap(),
                2,
                Money::new(dec!(10.00), Currency::Brl).unwrap(),
            )
            .unwrap(),
        )
        .unwrap();
    order
        .add_item(
            LineItem::new(
                ProductRef::new("SKU-002", "Gadget").unwrap(),
                1,
                Money::new(dec!(25.00), Currency::Brl).unwrap(),
            )
            .unwrap(),
        )
        .unwrap();
    order
}

fn seed_stock(stock: &InMemoryStockService) {
    stock.set_stock("SKU-001", 10);
    stock.set_stock("SKU-002", 10);
}

#[tokio::test]
async fn happy_path_ships_the_order() {
    let fixture = setup();
    seed_stock(&fixture.stock);
    let mut ctx = SagaContext::new(fulfillment::SAGA_NAME, order_with_items());

    fixture.orchestrator.run_saga(&mut ctx).await.unwrap();

    assert_eq!(ctx.order().status(), OrderStatus::Shipped);
    assert_eq!(ctx.executed_steps().len(), 7);
    assert!(ctx.errors().is_empty());
    assert!(ctx.param_str(PARAM_PAYMENT_ID).is_some());
    assert!(ctx.param_str(PARAM_TRACKING_CODE).unwrap().starts_with("TRK-"));

    // Domain events were collected off the order for publishing.
    assert!(ctx.order().events().is_empty());
    let event_types: Vec<_> = ctx.events().iter().map(|e| e.event_type()).collect();
    assert!(event_types.contains(&"OrderConfirmed"));
    assert!(event_types.contains(&"StatusChanged"));

    // Payment captured; reservations committed into a permanent deduction.
    assert_eq!(fixture.payment.payment_count(), 1);
    assert_eq!(
        fixture.payment.charged_amount(ctx.order().id()),
        Some(Money::new(dec!(45.00), Currency::Brl).unwrap())
    );
    assert_eq!(fixture.stock.reservation_count(), 0);
    assert_eq!(fixture.stock.available("SKU-001"), Some(8));
    assert_eq!(fixture.stock.available("SKU-002"), Some(9));
}

#[tokio::test]
async fn payment_failure_cancels_and_releases() {
    let fixture = setup();
    seed_stock(&fixture.stock);
    fixture.payment.set_fail_on_charge(true);
    let mut ctx = SagaContext::new(fulfillment::SAGA_NAME, order_with_items());

    let result = fixture.orchestrator.run_saga(&mut ctx).await;
    assert!(matches!(result, Err(SagaError::PaymentRejected { .. })));

    // confirm-order's compensation fired and stock is untouched.
    assert_eq!(ctx.order().status(), OrderStatus::Canceled);
    assert!(ctx.executed_steps().is_empty());
    assert_eq!(fixture.stock.reservation_count(), 0);
    assert_eq!(fixture.stock.available("SKU-001"), Some(10));
    assert_eq!(fixture.payment.payment_count(), 0);
}

#[tokio::test]
async fn reserve_failure_refunds_the_payment() {
    let fixture = setup();
    seed_stock(&fixture.stock);
    fixture.stock.set_fail_on_reserve(true);
    let mut ctx = SagaContext::new(fulfillment::SAGA_NAME, order_with_items());

    let result = fixture.orchestrator.run_saga(&mut ctx).await;
    assert!(matches!(result, Err(SagaError::ExternalService(_))));

    assert_eq!(ctx.order().status(), OrderStatus::Canceled);
    assert_eq!(fixture.payment.payment_count(), 0);
    assert!(ctx.param_str(PARAM_PAYMENT_ID).is_none());
    assert_eq!(fixture.stock.reservation_count(), 0);
}

#[tokio::test]
async fn insufficient_stock_fails_verification() {
    let fixture = setup();
    fixture.stock.set_stock("SKU-001", 10);
    fixture.stock.set_stock("SKU-002", 0);
    let mut ctx = SagaContext::new(fulfillment::SAGA_NAME, order_with_items());

    let result = fixture.orchestrator.run_saga(&mut ctx).await;
    match result {
        Err(SagaError::InsufficientStock { product_id }) => {
            assert_eq!(product_id, "SKU-002");
        }
        other => panic!("unexpected result: {other:?}"),
    }

    assert_eq!(ctx.order().status(), OrderStatus::Canceled);
}

#[tokio::test]
async fn empty_order_fails_at_confirmation() {
    let fixture = setup();
    let mut ctx = SagaContext::new(
        fulfillment::SAGA_NAME,
        Order::create("customer-1", None).unwrap(),
    );

    let result = fixture.orchestrator.run_saga(&mut ctx).await;
    assert!(matches!(result, Err(SagaError::Domain(_))));
    // Nothing executed, nothing compensated; the order stays pending.
    assert_eq!(ctx.order().status(), OrderStatus::Pending);
    assert!(ctx.executed_steps().is_empty());
}

#[tokio::test]
async fn partial_compensation_undoes_only_later_steps() {
    let fixture = setup();
    seed_stock(&fixture.stock);
    let mut ctx = SagaContext::new(fulfillment::SAGA_NAME, order_with_items());

    fixture
        .orchestrator
        .run_saga_steps(
            &mut ctx,
            &[STEP_CONFIRM_ORDER, STEP_VERIFY_STOCK, STEP_PROCESS_PAYMENT],
        )
        .await
        .unwrap();
    assert_eq!(fixture.payment.payment_count(), 1);

    fixture
        .orchestrator
        .compensate(&mut ctx, STEP_VERIFY_STOCK)
        .await;

    // Only process-payment was undone.
    assert_eq!(
        ctx.executed_steps(),
        &[STEP_CONFIRM_ORDER, STEP_VERIFY_STOCK]
    );
    assert_eq!(fixture.payment.payment_count(), 0);
    assert_eq!(ctx.order().status(), OrderStatus::Confirmed);
}

#[tokio::test]
async fn explicit_rollback_unwinds_everything() {
    let fixture = setup();
    seed_stock(&fixture.stock);
    let mut ctx = SagaContext::new(fulfillment::SAGA_NAME, order_with_items());

    fixture
        .orchestrator
        .run_saga_steps(
            &mut ctx,
            &[STEP_CONFIRM_ORDER, STEP_VERIFY_STOCK, STEP_PROCESS_PAYMENT],
        )
        .await
        .unwrap();

    fixture.orchestrator.rollback(&mut ctx).await;

    assert!(ctx.executed_steps().is_empty());
    assert_eq!(ctx.order().status(), OrderStatus::Canceled);
    assert_eq!(fixture.payment.payment_count(), 0);
}

#[tokio::test]
async fn subset_run_leaves_order_mid_lifecycle() {
    let fixture = setup();
    seed_stock(&fixture.stock);
    let mut ctx = SagaContext::new(fulfillment::SAGA_NAME, order_with_items());

    fixture
        .orchestrator
        .run_saga_steps(&mut ctx, &[STEP_CONFIRM_ORDER])
        .await
        .unwrap();

    assert_eq!(ctx.order().status(), OrderStatus::Confirmed);
    assert_eq!(ctx.executed_steps(), &[STEP_CONFIRM_ORDER]);
}

mod custom_steps {
    use super::*;
    use async_trait::async_trait;
    use saga::SagaStep;
    use serde_json::json;

    struct NotifyCustomer;

    #[async_trait]
    impl SagaStep for NotifyCustomer {
        fn id(&self) -> &str {
            "notify-customer"
        }

        fn name(&self) -> &str {
            "Notify customer"
        }

        async fn execute(&self, ctx: &mut SagaContext) -> Result<(), SagaError> {
            ctx.set_param("notified", json!(true));
            Ok(())
        }

        async fn compensate(&self, ctx: &mut SagaContext) -> Result<(), SagaError> {
            ctx.remove_param("notified");
            Ok(())
        }
    }

    #[tokio::test]
    async fn runtime_registered_step_extends_the_flow() {
        let fixture = setup();
        seed_stock(&fixture.stock);

        let mut orchestrator = fixture.orchestrator;
        orchestrator.add_step(Arc::new(NotifyCustomer));

        let mut ctx = SagaContext::new(fulfillment::SAGA_NAME, order_with_items());
        orchestrator.run_saga(&mut ctx).await.unwrap();

        assert_eq!(ctx.executed_steps().len(), 8);
        assert_eq!(ctx.param("notified"), Some(&json!(true)));
        assert_eq!(ctx.order().status(), OrderStatus::Shipped);
    }
}
