use std::time::Duration;

use actix_web::{http::StatusCode, test, test::TestRequest, App};
use order_lifecycle_engine::{
    db_types::{OrderId, OrderStatusType},
    lease::{lease_key, LeaseStore},
    test_utils::fixtures::seed_order,
    OrderManagement,
    ProcessingDelay,
};
use serde_json::json;

use super::helpers::{call, new_order_json, TestContext};
use crate::config::ServerOptions;

#[actix_web::test]
async fn health_endpoint() {
    let _ = env_logger::try_init().ok();
    let ctx = TestContext::new();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    let (status, body) = call(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[actix_web::test]
async fn create_and_fetch_order() {
    let _ = env_logger::try_init().ok();
    let ctx = TestContext::new();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    let req = TestRequest::post().uri("/orders").set_json(new_order_json()).to_request();
    let (status, order) = call(&app, req).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "PENDING_PAYMENT");
    assert_eq!(order["total"], 25.0);
    assert_eq!(order["customer_id"], "cust-1");
    assert!(order.get("payment_id").is_none());
    let order_id = order["order_id"].as_str().expect("order_id should be a string").to_string();
    assert!(!order_id.is_empty());

    let (status, fetched) = call(&app, TestRequest::get().uri(&format!("/orders/{order_id}")).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, order);
    assert_eq!(ctx.db.order_count().await, 1);
}

#[actix_web::test]
async fn create_order_validation() {
    let _ = env_logger::try_init().ok();
    let ctx = TestContext::new();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    let bodies = [
        json!({"customer_id": "", "items": [{"product_id": "p", "quantity": 1, "price": 1.0}]}),
        json!({"customer_id": "c", "items": []}),
        json!({"customer_id": "c"}),
    ];
    for body in bodies {
        let req = TestRequest::post().uri("/orders").set_json(&body).to_request();
        let (status, err) = call(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(err["error"].is_string(), "{body} -> {err}");
    }
    let req = TestRequest::post()
        .uri("/orders")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let (status, err) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().unwrap().starts_with("Invalid request body"));
    assert_eq!(ctx.db.order_count().await, 0);
}

#[actix_web::test]
async fn unknown_orders() {
    let _ = env_logger::try_init().ok();
    let ctx = TestContext::new();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    let (status, err) = call(&app, TestRequest::get().uri("/orders/nope").to_request()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(err["error"].as_str().unwrap().contains("does not exist"));

    let req = TestRequest::post().uri("/orders/nope/pay").set_json(json!({"payment_id": "p-1"})).to_request();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, TestRequest::post().uri("/orders/nope/ship").to_request()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // History of an unknown order is simply empty
    let (status, body) = call(&app, TestRequest::get().uri("/orders/nope/history").to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"order_id": "nope", "history": []}));
}

#[actix_web::test]
async fn pay_then_ship() {
    let _ = env_logger::try_init().ok();
    let ctx = TestContext::new();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    seed_order(&ctx.db, "o-100", OrderStatusType::PendingPayment).await;

    let req = TestRequest::post().uri("/orders/o-100/pay").set_json(json!({"payment_id": "pay-9"})).to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"order_id": "o-100", "status": "PAID", "message": "payment accepted"}));

    let (status, body) = call(&app, TestRequest::post().uri("/orders/o-100/ship").to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"order_id": "o-100", "status": "SHIPPING", "message": "shipping initiated"}));

    let (status, order) = call(&app, TestRequest::get().uri("/orders/o-100").to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "SHIPPING");
    assert_eq!(order["payment_id"], "pay-9");
    assert_eq!(order["reason"], "shipment initiated");

    let (_, body) = call(&app, TestRequest::get().uri("/orders/o-100/history").to_request()).await;
    let history = body["history"].as_array().unwrap();
    let statuses = history.iter().map(|c| c["status"].as_str().unwrap()).collect::<Vec<_>>();
    assert_eq!(statuses, vec!["SHIPPING", "PAID", "PENDING_PAYMENT"]);
    assert_eq!(history[1]["reason"], "payment confirmed: pay-9");

    // Shipping twice is not a legal transition
    let (status, err) = call(&app, TestRequest::post().uri("/orders/o-100/ship").to_request()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(err["error"].as_str().unwrap().contains("SHIPPING -> SHIPPING"));
}

#[actix_web::test]
async fn cancellation() {
    let _ = env_logger::try_init().ok();
    let ctx = TestContext::new();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    seed_order(&ctx.db, "no-body", OrderStatusType::PendingPayment).await;
    seed_order(&ctx.db, "with-reason", OrderStatusType::PendingPayment).await;
    seed_order(&ctx.db, "garbage", OrderStatusType::PendingPayment).await;
    seed_order(&ctx.db, "paid", OrderStatusType::Paid).await;

    let (status, body) = call(&app, TestRequest::post().uri("/orders/no-body/cancel").to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"order_id": "no-body", "status": "CANCELLED", "message": "order cancelled"}));
    let history = ctx.db.fetch_history(&OrderId::from("no-body")).await.unwrap();
    assert_eq!(history[0].reason, "cancelled by customer");

    let req =
        TestRequest::post().uri("/orders/with-reason/cancel").set_json(json!({"reason": "found it cheaper"})).to_request();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    let order = ctx.db.fetch_order(&OrderId::from("with-reason")).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Cancelled);
    assert_eq!(order.reason.as_deref(), Some("found it cheaper"));

    let req = TestRequest::post().uri("/orders/garbage/cancel").set_payload("reason=please").to_request();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let order = ctx.db.fetch_order(&OrderId::from("garbage")).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::PendingPayment);

    // Paid orders can no longer be cancelled
    let (status, err) = call(&app, TestRequest::post().uri("/orders/paid/cancel").to_request()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(err["error"].as_str().unwrap().contains("PAID -> CANCELLED"));
}

#[actix_web::test]
async fn busy_lease_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let mut ctx = TestContext::new();
    ctx.policy = ctx.policy.with_max_attempts(3).with_retry_interval(Duration::from_millis(5));
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    let id = seed_order(&ctx.db, "busy", OrderStatusType::PendingPayment).await.order_id;
    assert!(ctx.leases.set_if_absent(&lease_key(&id), "1", Duration::from_secs(60)).await.unwrap());

    let req = TestRequest::post().uri("/orders/busy/pay").set_json(json!({"payment_id": "p"})).to_request();
    let (status, err) = call(&app, req).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(err["error"].as_str().unwrap().contains("Could not acquire the lock"));
    let order = ctx.db.fetch_order(&id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::PendingPayment);
    assert!(order.payment_id.is_none());
    // The other holder keeps its lease
    assert!(ctx.leases.is_held(&lease_key(&id)).await);
}

#[actix_web::test]
async fn timed_out_transitions_complete_in_the_background() {
    let _ = env_logger::try_init().ok();
    let mut ctx = TestContext::new();
    ctx.delay = ProcessingDelay::Fixed(Duration::from_millis(300));
    ctx.options = ServerOptions { request_timeout: Duration::from_millis(50) };
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    let id = seed_order(&ctx.db, "slow", OrderStatusType::PendingPayment).await.order_id;

    let req = TestRequest::post().uri("/orders/slow/pay").set_json(json!({"payment_id": "p-slow"})).to_request();
    let (status, err) = call(&app, req).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(err["error"].as_str().unwrap().contains("timed out"));
    assert_eq!(ctx.db.fetch_order(&id).await.unwrap().unwrap().status, OrderStatusType::PendingPayment);

    tokio::time::sleep(Duration::from_millis(600)).await;
    let order = ctx.db.fetch_order(&id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Paid);
    assert_eq!(order.payment_id.as_deref(), Some("p-slow"));
    assert!(!ctx.leases.is_held(&lease_key(&id)).await);
}
