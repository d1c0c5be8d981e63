//! The checkout orchestrator end to end over HTTP.

use std::time::Duration;

use bistro_client::{
    CartStore, Checkout, CheckoutError, CheckoutPhase, CheckoutSettings, FileCartStorage,
    SubmissionError, SubmitOutcome,
};
use bistro_core::{DeliveryDetails, PaymentMethod, Price, Product, ProductId};
use bistro_integration_tests::{StubService, demo_products};

fn delivery() -> DeliveryDetails {
    DeliveryDetails {
        full_name: "Ada Lovelace".to_string(),
        address: "12 Analytical Row".to_string(),
        phone: "555-0199".to_string(),
        payment_method: PaymentMethod::Cash,
    }
}

fn product(id: i32) -> Product {
    demo_products()
        .into_iter()
        .find(|p| p.id == ProductId::new(id))
        .expect("demo product")
}

#[tokio::test]
async fn test_successful_checkout_clears_cart() {
    let stub = StubService::spawn(demo_products()).await;
    let api = stub.client();
    let cart = CartStore::new();

    let burger = api.get_product(ProductId::new(1)).await.expect("burger");
    cart.add_item(&burger);
    cart.add_item(&burger);
    cart.add_item(&product(4));

    let checkout = Checkout::new(cart.clone(), api, CheckoutSettings::default());
    checkout.begin().expect("begin");
    checkout.set_delivery_details(delivery()).expect("details");

    let summary = checkout.summary();
    assert_eq!(summary.subtotal, Price::from_cents(6000));
    assert_eq!(summary.total, Price::from_cents(6500));

    let outcome = checkout.submit().await.expect("submit");
    let SubmitOutcome::Confirmed(confirmation) = outcome else {
        panic!("expected a confirmation");
    };

    assert_eq!(confirmation.total_price, Price::from_cents(6500));
    assert!(cart.is_empty());
    assert!(matches!(checkout.phase(), CheckoutPhase::Confirmed(_)));
    assert_eq!(checkout.delivery_details(), DeliveryDetails::default());

    let orders = stub.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].line_items.len(), 2);
    assert_eq!(orders[0].line_items[0].quantity, 2);
    assert_eq!(orders[0].delivery.payment_method, PaymentMethod::Cash);
}

#[tokio::test]
async fn test_rejection_keeps_cart_and_allows_retry() {
    let stub = StubService::spawn(demo_products()).await;
    stub.set_unavailable(ProductId::new(2));
    let cart = CartStore::new();
    cart.add_item(&product(1));
    cart.add_item(&product(2));

    let checkout = Checkout::new(cart.clone(), stub.client(), CheckoutSettings::default());
    checkout.begin().expect("begin");
    checkout.set_delivery_details(delivery()).expect("details");

    let err = checkout.submit().await.expect_err("paella is unavailable");
    assert!(err.is_retryable());
    assert!(err.to_string().contains("Saffron Paella is currently unavailable"));
    match checkout.phase() {
        CheckoutPhase::Failed { reason } => assert!(reason.contains("unavailable")),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(cart.count(), 2);
    assert_eq!(checkout.delivery_details(), delivery());

    cart.remove_item(ProductId::new(2));
    let outcome = checkout.submit().await.expect("retry");
    assert!(matches!(outcome, SubmitOutcome::Confirmed(_)));
    assert_eq!(stub.orders().len(), 2);
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let stub = StubService::spawn(demo_products()).await;
    stub.set_order_delay(Duration::from_secs(5));
    let cart = CartStore::new();
    cart.add_item(&product(3));

    let settings = CheckoutSettings {
        submit_timeout: Duration::from_millis(100),
        ..CheckoutSettings::default()
    };
    let checkout = Checkout::new(cart.clone(), stub.client(), settings);
    checkout.begin().expect("begin");
    checkout.set_delivery_details(delivery()).expect("details");

    let err = checkout.submit().await.expect_err("service is too slow");
    assert!(matches!(
        err,
        CheckoutError::Submission(SubmissionError::Timeout(_))
    ));
    assert!(matches!(checkout.phase(), CheckoutPhase::Failed { .. }));
    assert_eq!(cart.count(), 1);
}

#[tokio::test]
async fn test_second_submit_while_in_flight_is_ignored() {
    let stub = StubService::spawn(demo_products()).await;
    stub.set_order_delay(Duration::from_millis(300));
    let cart = CartStore::new();
    cart.add_item(&product(1));

    let checkout = Checkout::new(cart, stub.client(), CheckoutSettings::default());
    checkout.begin().expect("begin");
    checkout.set_delivery_details(delivery()).expect("details");

    let first = {
        let checkout = checkout.clone();
        tokio::spawn(async move { checkout.submit().await })
    };
    while checkout.phase() != CheckoutPhase::Submitting {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let second = checkout.submit().await.expect("second trigger");
    assert_eq!(second, SubmitOutcome::AlreadySubmitting);

    let first = first.await.expect("join").expect("first submit");
    assert!(matches!(first, SubmitOutcome::Confirmed(_)));
    assert_eq!(stub.orders().len(), 1);
}

#[tokio::test]
async fn test_missing_details_never_reach_the_service() {
    let stub = StubService::spawn(demo_products()).await;
    let cart = CartStore::new();
    cart.add_item(&product(1));

    let checkout = Checkout::new(cart, stub.client(), CheckoutSettings::default());
    checkout.begin().expect("begin");
    checkout
        .set_delivery_details(DeliveryDetails {
            phone: "  ".to_string(),
            ..delivery()
        })
        .expect("details");

    let err = checkout.submit().await.expect_err("phone is blank");
    assert!(matches!(err, CheckoutError::Validation(_)));
    assert_eq!(checkout.phase(), CheckoutPhase::Reviewing);
    assert!(stub.orders().is_empty());
}

#[tokio::test]
async fn test_persisted_cart_survives_restart_and_clears_after_order() {
    let dir = std::env::temp_dir().join(format!("bistro-it-{}", std::process::id()));
    let path = dir.join("cart.json");
    let _ = std::fs::remove_file(&path);

    let stub = StubService::spawn(demo_products()).await;
    {
        let cart = CartStore::open(FileCartStorage::new(&path));
        cart.add_item(&product(1));
        cart.set_quantity(ProductId::new(1), 2);
        cart.flush().await;
    }

    let cart = CartStore::open(FileCartStorage::new(&path));
    assert_eq!(cart.count(), 3);

    let checkout = Checkout::new(cart.clone(), stub.client(), CheckoutSettings::default());
    checkout.begin().expect("begin");
    checkout.set_delivery_details(delivery()).expect("details");
    checkout.submit().await.expect("submit");
    cart.flush().await;

    let reopened = CartStore::open(FileCartStorage::new(&path));
    assert!(reopened.is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}
