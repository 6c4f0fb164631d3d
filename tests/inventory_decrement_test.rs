//! Inventory decrement semantics: conditional updates that fail rather than
//! clamp, untracked products, and rollback on partial failure.

mod common;

use assert_matches::assert_matches;
use common::TestApp;
use sea_orm::TransactionTrait;
use storefront_api::{
    errors::ServiceError,
    services::{inventory::InventoryService, pricing::ResolvedLineItem},
};
use uuid::Uuid;

fn resolved(product_id: Uuid, quantity: i32) -> ResolvedLineItem {
    ResolvedLineItem {
        product_id,
        name: "test".to_string(),
        unit_price_minor: 100,
        quantity,
        customization: None,
    }
}

#[tokio::test]
async fn decrement_consumes_stock_exactly_once() {
    let app = TestApp::new().await;
    let product = app.seed_product("Last Unit", 500, Some(1)).await;
    let inventory = InventoryService::new();

    let txn = app.state.db.begin().await.unwrap();
    let applied = inventory
        .decrement_for_order(&txn, &[resolved(product.id, 1)])
        .await
        .unwrap();
    txn.commit().await.unwrap();

    assert_eq!(applied.len(), 1);
    assert_eq!(app.stock_of(product.id).await, Some(0));

    // The same unit cannot be consumed twice.
    let txn = app.state.db.begin().await.unwrap();
    let err = inventory
        .decrement_for_order(&txn, &[resolved(product.id, 1)])
        .await
        .unwrap_err();
    drop(txn);

    assert_matches!(err, ServiceError::InsufficientInventory(_));
    assert_eq!(app.stock_of(product.id).await, Some(0));
}

#[tokio::test]
async fn stock_never_goes_negative() {
    let app = TestApp::new().await;
    let product = app.seed_product("Scarce", 500, Some(3)).await;
    let inventory = InventoryService::new();

    let txn = app.state.db.begin().await.unwrap();
    let err = inventory
        .decrement_for_order(&txn, &[resolved(product.id, 4)])
        .await
        .unwrap_err();
    drop(txn);

    assert_matches!(err, ServiceError::InsufficientInventory(_));
    assert_eq!(app.stock_of(product.id).await, Some(3));
}

#[tokio::test]
async fn untracked_products_are_skipped() {
    let app = TestApp::new().await;
    let product = app.seed_product("Gift Card", 2000, None).await;
    let inventory = InventoryService::new();

    let txn = app.state.db.begin().await.unwrap();
    let applied = inventory
        .decrement_for_order(&txn, &[resolved(product.id, 9)])
        .await
        .unwrap();
    txn.commit().await.unwrap();

    assert!(applied.is_empty());
    assert_eq!(app.stock_of(product.id).await, None);
}

#[tokio::test]
async fn failed_line_rolls_back_earlier_decrements() {
    let app = TestApp::new().await;
    let beans = app.seed_product("Beans", 500, Some(10)).await;
    let mug = app.seed_product("Mug", 250, Some(1)).await;
    let inventory = InventoryService::new();

    let txn = app.state.db.begin().await.unwrap();
    let err = inventory
        .decrement_for_order(&txn, &[resolved(beans.id, 2), resolved(mug.id, 5)])
        .await
        .unwrap_err();
    txn.rollback().await.unwrap();

    assert_matches!(err, ServiceError::InsufficientInventory(_));
    assert_eq!(app.stock_of(beans.id).await, Some(10));
    assert_eq!(app.stock_of(mug.id).await, Some(1));
}

#[tokio::test]
async fn deactivated_product_fails_the_decrement() {
    let app = TestApp::new().await;
    let product = app.seed_product("Retired", 500, Some(10)).await;
    app.deactivate(product.id).await;
    let inventory = InventoryService::new();

    let txn = app.state.db.begin().await.unwrap();
    let err = inventory
        .decrement_for_order(&txn, &[resolved(product.id, 1)])
        .await
        .unwrap_err();
    drop(txn);

    assert_matches!(err, ServiceError::ProductInactive(id) if id == product.id);
    assert_eq!(app.stock_of(product.id).await, Some(10));
}
