use actix_web::{http::StatusCode, test, test::TestRequest, App};
use chrono::Utc;
use order_lifecycle_engine::{
    db_types::{Order, OrderId, OrderStatusType},
    lease::{lease_key, MemoryLeaseStore},
    test_utils::fixtures::sample_new_order,
    webhook::SignatureMode,
    OrderManagementError,
};
use serde_json::json;

use super::{
    helpers::{call, new_order_json, shipping_body, verifier, TestContext, SIGNATURE_HEADER},
    mocks::{MockOrderStore, SharedOrderStore},
};

fn order_in(id: &str, status: OrderStatusType) -> Order {
    let mut order = Order::from_new_order(OrderId::from(id), sample_new_order(), Utc::now());
    order.status = status;
    order
}

fn db_down() -> OrderManagementError {
    OrderManagementError::DatabaseError("disk I/O error".into())
}

#[actix_web::test]
async fn read_failures_are_internal_errors() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_fetch_order().returning(|_| Err(db_down()));
    db.expect_fetch_history().returning(|_| Err(db_down()));
    db.expect_create_order().returning(|_| Err(db_down()));
    let ctx = TestContext::with_backends(SharedOrderStore::from(db), MemoryLeaseStore::new());
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

    let (status, err) = call(&app, TestRequest::get().uri("/orders/o-1").to_request()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err, json!({"error": "Database error: disk I/O error"}));
    let (status, _) = call(&app, TestRequest::get().uri("/orders/o-1/history").to_request()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let req = TestRequest::post().uri("/orders").set_json(new_order_json()).to_request();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn corrupt_orders_are_internal_errors() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_fetch_order()
        .returning(|id| Err(OrderManagementError::InvalidData(format!("order {id}: unknown status SHIPPED"))));
    db.expect_update_order_status().never();
    let leases = MemoryLeaseStore::new();
    let ctx = TestContext::with_backends(SharedOrderStore::from(db), leases.clone());
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

    let (status, err) = call(&app, TestRequest::get().uri("/orders/o-3").to_request()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(err["error"].as_str().unwrap().contains("Stored order data is invalid"), "{err}");
    // A transition that reads the corrupt row fails the same way and lets go of the lease
    let (status, _) = call(&app, TestRequest::post().uri("/orders/o-3/ship").to_request()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!leases.is_held(&lease_key(&OrderId::from("o-3"))).await);
}

#[actix_web::test]
async fn failed_writes_release_the_lease() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_fetch_order().returning(|id| Ok(Some(order_in(id.as_str(), OrderStatusType::Paid))));
    db.expect_update_order_status().times(1).returning(|_, _, _| Err(db_down()));
    db.expect_update_payment_id().never();
    let leases = MemoryLeaseStore::new();
    let ctx = TestContext::with_backends(SharedOrderStore::from(db), leases.clone());
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

    let (status, _) = call(&app, TestRequest::post().uri("/orders/o-7/ship").to_request()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!leases.is_held(&lease_key(&OrderId::from("o-7"))).await);
}

#[actix_web::test]
async fn payment_id_failures_do_not_fail_the_payment() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_fetch_order().returning(|id| Ok(Some(order_in(id.as_str(), OrderStatusType::PendingPayment))));
    db.expect_update_order_status()
        .withf(|_, status, reason| *status == OrderStatusType::Paid && reason.contains("payment confirmed: p-77"))
        .times(1)
        .returning(|_, _, _| Ok(()));
    db.expect_update_payment_id().times(1).returning(|_, _| Err(db_down()));
    let ctx = TestContext::with_backends(SharedOrderStore::from(db), MemoryLeaseStore::new());
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

    let req = TestRequest::post().uri("/orders/o-8/pay").set_json(json!({"payment_id": "p-77"})).to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PAID");
}

#[actix_web::test]
async fn webhook_write_failures_are_internal_errors() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_fetch_order().returning(|id| Ok(Some(order_in(id.as_str(), OrderStatusType::Shipping))));
    db.expect_update_order_status().times(1).returning(|_, _, _| Err(db_down()));
    let ctx = TestContext::with_backends(SharedOrderStore::from(db), MemoryLeaseStore::new());
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

    let body = shipping_body("o-9", "SHP-9", "RETURNED");
    let signature = verifier().sign(SignatureMode::Canonical, &body).unwrap();
    let req = TestRequest::post()
        .uri("/webhooks/shipping")
        .insert_header((SIGNATURE_HEADER, signature))
        .set_payload(body)
        .to_request();
    let (status, err) = call(&app, req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(err["error"].as_str().unwrap().contains("disk I/O error"));
}
