use actix_web::{http::StatusCode, test, test::TestRequest, App};
use order_lifecycle_engine::{
    db_types::{OrderId, OrderStatusType},
    test_utils::fixtures::seed_order,
    webhook::SignatureMode,
    OrderManagement,
};
use serde_json::json;

use super::helpers::{call, shipping_body, verifier, TestContext, SIGNATURE_HEADER};

fn signed(mode: SignatureMode, body: Vec<u8>) -> TestRequest {
    let signature = verifier().sign(mode, &body).expect("Could not sign body");
    unsigned(body).insert_header((SIGNATURE_HEADER, signature))
}

fn unsigned(body: Vec<u8>) -> TestRequest {
    TestRequest::post().uri("/webhooks/shipping").insert_header(("content-type", "application/json")).set_payload(body)
}

async fn status_of(ctx: &TestContext, id: &str) -> OrderStatusType {
    ctx.db.fetch_order(&OrderId::from(id)).await.unwrap().unwrap().status
}

#[actix_web::test]
async fn delivered_webhook() {
    let _ = env_logger::try_init().ok();
    let ctx = TestContext::new();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    seed_order(&ctx.db, "o-1", OrderStatusType::Shipping).await;

    let req = signed(SignatureMode::Canonical, shipping_body("o-1", "SHP-1", "DELIVERED")).to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "order_id": "o-1",
            "shipment_id": "SHP-1",
            "previous_status": "SHIPPING",
            "new_status": "DELIVERED",
            "refund_triggered": false,
            "message": "order transitioned to DELIVERED"
        })
    );
    assert_eq!(status_of(&ctx, "o-1").await, OrderStatusType::Delivered);
    let history = ctx.db.fetch_history(&OrderId::from("o-1")).await.unwrap();
    assert_eq!(history[0].reason, "delivered - confirmed by webhook (shipment SHP-1)");
}

#[actix_web::test]
async fn lost_and_in_transit() {
    let _ = env_logger::try_init().ok();
    let ctx = TestContext::new();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    seed_order(&ctx.db, "lost", OrderStatusType::Shipping).await;
    seed_order(&ctx.db, "moving", OrderStatusType::Shipping).await;

    let req = signed(SignatureMode::Canonical, shipping_body("lost", "SHP-2", "LOST")).to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["new_status"], "SHIP_FAILED");
    assert_eq!(body["refund_triggered"], true);
    assert_eq!(status_of(&ctx, "lost").await, OrderStatusType::ShipFailed);

    let req = signed(SignatureMode::Canonical, shipping_body("moving", "SHP-3", "IN_TRANSIT")).to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["previous_status"], "SHIPPING");
    assert_eq!(body["new_status"], "SHIPPING");
    assert_eq!(body["message"], "status noted, no state change");
    assert_eq!(ctx.db.fetch_history(&OrderId::from("moving")).await.unwrap().len(), 1);
}

#[actix_web::test]
async fn signatures_are_required() {
    let _ = env_logger::try_init().ok();
    let ctx = TestContext::new();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    seed_order(&ctx.db, "o-2", OrderStatusType::Shipping).await;

    let (status, err) = call(&app, unsigned(shipping_body("o-2", "SHP-1", "DELIVERED")).to_request()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(err["error"].is_string());

    let req = unsigned(shipping_body("o-2", "SHP-1", "DELIVERED")).insert_header((SIGNATURE_HEADER, "00ff")).to_request();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Signed for a different order
    let signature = verifier().sign(SignatureMode::Canonical, &shipping_body("o-3", "SHP-1", "DELIVERED")).unwrap();
    let req = unsigned(shipping_body("o-2", "SHP-1", "DELIVERED")).insert_header((SIGNATURE_HEADER, signature)).to_request();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A canonical signature cannot be computed over a body that is not JSON
    let req = unsigned(b"{not json".to_vec()).insert_header((SIGNATURE_HEADER, "abcd")).to_request();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(status_of(&ctx, "o-2").await, OrderStatusType::Shipping);
}

#[actix_web::test]
async fn canonical_signatures_do_not_cover_the_status() {
    let _ = env_logger::try_init().ok();
    let ctx = TestContext::new();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    seed_order(&ctx.db, "o-4", OrderStatusType::Shipping).await;

    let signature = verifier().sign(SignatureMode::Canonical, &shipping_body("o-4", "SHP-4", "DELIVERED")).unwrap();
    let forged = shipping_body("o-4", "SHP-4", "DAMAGED");
    let (status, body) = call(&app, unsigned(forged).insert_header((SIGNATURE_HEADER, signature)).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["new_status"], "SHIP_FAILED");
    assert_eq!(body["refund_triggered"], true);
}

#[actix_web::test]
async fn raw_signatures_cover_every_byte() {
    let _ = env_logger::try_init().ok();
    let mut ctx = TestContext::new();
    ctx.mode = SignatureMode::Raw;
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    seed_order(&ctx.db, "o-5", OrderStatusType::Shipping).await;

    let signature = verifier().sign(SignatureMode::Raw, &shipping_body("o-5", "SHP-5", "DELIVERED")).unwrap();
    let forged = shipping_body("o-5", "SHP-5", "DAMAGED");
    let req = unsigned(forged).insert_header((SIGNATURE_HEADER, signature.clone())).to_request();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(status_of(&ctx, "o-5").await, OrderStatusType::Shipping);

    let genuine = shipping_body("o-5", "SHP-5", "DELIVERED");
    let req = unsigned(genuine).insert_header((SIGNATURE_HEADER, signature)).to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["new_status"], "DELIVERED");

    // A correctly signed body that is not JSON gets past the signature check, then fails to parse
    let req = signed(SignatureMode::Raw, b"{not json".to_vec()).to_request();
    let (status, err) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().unwrap().starts_with("Invalid event payload"));
}

#[actix_web::test]
async fn dispatch_errors() {
    let _ = env_logger::try_init().ok();
    let ctx = TestContext::new();
    let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
    seed_order(&ctx.db, "paid", OrderStatusType::Paid).await;
    seed_order(&ctx.db, "shipping", OrderStatusType::Shipping).await;

    let cases = [
        (shipping_body("paid", "SHP-1", "DELIVERED"), StatusCode::CONFLICT),
        (shipping_body("ghost", "SHP-1", "DELIVERED"), StatusCode::NOT_FOUND),
        (shipping_body("shipping", "", "DELIVERED"), StatusCode::BAD_REQUEST),
        (shipping_body("", "SHP-1", "DELIVERED"), StatusCode::BAD_REQUEST),
        (shipping_body("shipping", "SHP-1", "TELEPORTED"), StatusCode::BAD_REQUEST),
    ];
    for (body, expected) in cases {
        let text = String::from_utf8_lossy(&body).to_string();
        let (status, err) = call(&app, signed(SignatureMode::Canonical, body).to_request()).await;
        assert_eq!(status, expected, "{text}");
        assert!(err["error"].is_string(), "{text}");
    }
    let (_, err) = call(&app, signed(SignatureMode::Canonical, shipping_body("paid", "SHP-1", "DELIVERED")).to_request())
        .await;
    assert_eq!(err["error"], "Order #paid is in PAID state, expected SHIPPING");
    assert_eq!(status_of(&ctx, "paid").await, OrderStatusType::Paid);
    assert_eq!(status_of(&ctx, "shipping").await, OrderStatusType::Shipping);
}
