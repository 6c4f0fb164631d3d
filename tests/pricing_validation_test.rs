//! Pricing service behavior: server-derived totals, validation order, and
//! repeatability of the intent/completion re-pricing pair.

mod common;

use assert_matches::assert_matches;
use common::TestApp;
use storefront_api::{errors::ServiceError, services::pricing::CartLineRequest};
use uuid::Uuid;

fn line(product_id: Uuid, quantity: i32) -> CartLineRequest {
    CartLineRequest {
        product_id,
        quantity,
        customization: None,
    }
}

#[tokio::test]
async fn totals_come_from_product_records() {
    let app = TestApp::new().await;
    let beans = app.seed_product("Beans", 500, Some(10)).await;
    let mug = app.seed_product("Mug", 250, Some(10)).await;

    let priced = app
        .state
        .services
        .pricing
        .price_cart(&[line(beans.id, 2), line(mug.id, 3)])
        .await
        .unwrap();

    assert_eq!(priced.total_minor, 1750);
    assert_eq!(priced.lines.len(), 2);
    assert_eq!(priced.lines[0].unit_price_minor, 500);
    assert_eq!(priced.lines[0].name, "Beans");
}

#[tokio::test]
async fn pricing_is_repeatable() {
    // Intent and completion price the same cart independently; with no
    // intervening catalog change the two snapshots must agree.
    let app = TestApp::new().await;
    let beans = app.seed_product("Beans", 500, Some(10)).await;
    let cart = [line(beans.id, 4)];

    let first = app.state.services.pricing.price_cart(&cart).await.unwrap();
    let second = app.state.services.pricing.price_cart(&cart).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let app = TestApp::new().await;

    let err = app
        .state
        .services
        .pricing
        .price_cart(&[])
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InvalidPayload(_));
}

#[tokio::test]
async fn zero_and_negative_quantities_are_rejected() {
    let app = TestApp::new().await;
    let beans = app.seed_product("Beans", 500, Some(10)).await;

    for quantity in [0, -3] {
        let err = app
            .state
            .services
            .pricing
            .price_cart(&[line(beans.id, quantity)])
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::InvalidQuantity { quantity: q, .. } if q == quantity);
    }
}

#[tokio::test]
async fn unknown_product_is_rejected() {
    let app = TestApp::new().await;
    let missing = Uuid::new_v4();

    let err = app
        .state
        .services
        .pricing
        .price_cart(&[line(missing, 1)])
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::ProductNotFound(id) if id == missing);
}

#[tokio::test]
async fn quantity_above_stock_is_rejected() {
    let app = TestApp::new().await;
    let beans = app.seed_product("Beans", 500, Some(3)).await;

    let err = app
        .state
        .services
        .pricing
        .price_cart(&[line(beans.id, 4)])
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InsufficientInventory(_));
}

#[tokio::test]
async fn untracked_products_skip_the_stock_check() {
    let app = TestApp::new().await;
    let gift_card = app.seed_product("Gift Card", 2000, None).await;

    let priced = app
        .state
        .services
        .pricing
        .price_cart(&[line(gift_card.id, 500)])
        .await
        .unwrap();

    assert_eq!(priced.total_minor, 1_000_000);
}

#[tokio::test]
async fn customization_is_carried_through() {
    let app = TestApp::new().await;
    let mug = app.seed_product("Mug", 250, Some(10)).await;

    let priced = app
        .state
        .services
        .pricing
        .price_cart(&[CartLineRequest {
            product_id: mug.id,
            quantity: 1,
            customization: Some("engraving: R.".to_string()),
        }])
        .await
        .unwrap();

    assert_eq!(
        priced.lines[0].customization.as_deref(),
        Some("engraving: R.")
    );
}
