//! `ApiClient` against the in-process stub service.

use bistro_client::{ApiError, OrderService};
use bistro_core::{
    DeliveryDetails, LineItem, OrderSubmission, PaymentMethod, Price, ProductId, ProductInput,
};
use bistro_integration_tests::{StubService, demo_products, stub_delivery_fee};

fn delivery() -> DeliveryDetails {
    DeliveryDetails {
        full_name: "Ada Lovelace".to_string(),
        address: "12 Analytical Row".to_string(),
        phone: "555-0199".to_string(),
        payment_method: PaymentMethod::Card,
    }
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_list_products_with_category_filter() {
    let stub = StubService::spawn(demo_products()).await;
    let api = stub.client();

    let all = api.list_products(None).await.expect("list all");
    assert_eq!(all.len(), 4);

    let mains = api.list_products(Some("Mains")).await.expect("list mains");
    let names: Vec<&str> = mains.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Wagyu Burger", "Saffron Paella"]);

    let none = api.list_products(Some("Soups")).await.expect("list soups");
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_all_category_shares_the_unfiltered_cache_entry() {
    let stub = StubService::spawn(demo_products()).await;
    let api = stub.client();

    api.list_products(None).await.expect("list");
    api.list_products(Some("All")).await.expect("list All");
    api.list_products(Some("  ")).await.expect("list blank");

    assert_eq!(stub.list_requests(), 1);
}

#[tokio::test]
async fn test_listing_is_cached_until_a_write() {
    let stub = StubService::spawn(demo_products()).await;
    let api = stub.client();

    api.list_products(None).await.expect("first list");
    api.list_products(None).await.expect("second list");
    assert_eq!(stub.list_requests(), 1);

    let created = api
        .create_product(&ProductInput {
            name: "Burrata".to_string(),
            description: "With heirloom tomatoes".to_string(),
            price: Price::from_cents(1400),
            image_url: None,
            category: "Starters".to_string(),
            available: true,
        })
        .await
        .expect("create");
    assert_eq!(created.id, ProductId::new(5));

    let all = api.list_products(None).await.expect("list after create");
    assert_eq!(stub.list_requests(), 2);
    assert!(all.iter().any(|p| p.name == "Burrata"));
}

#[tokio::test]
async fn test_invalid_product_input_is_reported() {
    let stub = StubService::spawn(demo_products()).await;
    let api = stub.client();

    let err = api
        .create_product(&ProductInput {
            name: "   ".to_string(),
            description: String::new(),
            price: Price::from_cents(100),
            image_url: None,
            category: "Mains".to_string(),
            available: true,
        })
        .await
        .expect_err("blank name must be rejected");

    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn test_missing_product_maps_to_not_found() {
    let stub = StubService::spawn(demo_products()).await;
    let api = stub.client();

    let err = api
        .get_product(ProductId::new(99))
        .await
        .expect_err("product 99 does not exist");

    match err {
        ApiError::NotFound(message) => assert_eq!(message, "Product not found"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn test_submit_order_returns_service_priced_confirmation() {
    let stub = StubService::spawn(demo_products()).await;
    let api = stub.client();
    let products = demo_products();

    let mut burger = LineItem::from_product(&products[0]);
    burger.quantity = 2;
    burger.unit_price = Price::from_cents(1);
    let submission = OrderSubmission {
        line_items: vec![burger],
        total_price: Some(Price::from_cents(2)),
        delivery: delivery(),
    };

    let confirmation = api.submit_order(&submission).await.expect("submit");

    assert_eq!(confirmation.subtotal, Price::from_cents(4800));
    assert_eq!(confirmation.delivery_fee, stub_delivery_fee());
    assert_eq!(confirmation.total_price, Price::from_cents(5300));
    assert_eq!(stub.orders().len(), 1);
    assert_eq!(stub.orders()[0].delivery.full_name, "Ada Lovelace");
}

#[tokio::test]
async fn test_rejected_order_carries_service_message() {
    let stub = StubService::spawn(demo_products()).await;
    let api = stub.client();

    let err = api
        .submit_order(&OrderSubmission {
            line_items: Vec::new(),
            total_price: None,
            delivery: delivery(),
        })
        .await
        .expect_err("empty order must be rejected");

    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Order must contain at least one item");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_service_is_an_http_error() {
    // Port 1 is never listening locally.
    let api = bistro_client::ApiClient::new(
        url::Url::parse("http://127.0.0.1:1/").expect("url"),
        std::time::Duration::from_secs(1),
    );
    let err = api.list_products(None).await.expect_err("nothing listens");
    assert!(matches!(err, ApiError::Http(_)));
}
