use std::time::Duration as StdDuration;

use chrono::Utc;

use reqwest::StatusCode;

use serde_json::{json, Value};

use sqlx::PgPool;

use uuid::Uuid;

use wiremock::matchers::*;
use wiremock::{Mock, ResponseTemplate};

use barqueue::domain::OrderStatus;

use crate::helpers::{force_ready, seed_order, TestApp};

#[sqlx::test]
async fn notify_marks_order_ready_and_texts_guest(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let order = seed_order(&pool).await;

    Mock::given(method("POST"))
        .and(body_string_contains("To=%2B5511999998888"))
        .and(body_string_contains("Caipirinha"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sid": "SMready" })))
        .expect(1)
        .mount(&app.sms_server)
        .await;

    let res = app
        .notify(&json!({ "id": order.id }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: Value = res.json().await.expect("Failed to parse response");
    assert_eq!(json!({ "ok": true, "channel": "sms", "sid": "SMready" }), body);

    let stored = app.fetch_order(order.id).await;
    assert_eq!(OrderStatus::Ready, stored.status);
    assert!(stored.ready_at.is_some());

    Ok(())
}

#[sqlx::test]
async fn notify_twice_reports_already_and_keeps_ready_at(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let order = seed_order(&pool).await;
    app.expect_sms(1).await;

    app.notify(&json!({ "id": order.id }))
        .await
        .expect("Failed to execute request");
    let ready_at = app.fetch_order(order.id).await.ready_at;

    let res = app
        .notify(&json!({ "id": order.id }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: Value = res.json().await.expect("Failed to parse response");
    assert_eq!(json!({ "ok": true, "channel": "none", "already": true }), body);
    assert_eq!(ready_at, app.fetch_order(order.id).await.ready_at);

    Ok(())
}

#[sqlx::test]
async fn concurrent_notify_texts_guest_once(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let order = seed_order(&pool).await;
    app.expect_sms(1).await;

    let body = json!({ "id": order.id });
    let (first, second) = tokio::join!(app.notify(&body), app.notify(&body));

    assert_eq!(StatusCode::OK, first.expect("Failed to execute request").status());
    assert_eq!(StatusCode::OK, second.expect("Failed to execute request").status());
    assert_eq!(OrderStatus::Ready, app.fetch_order(order.id).await.status);

    Ok(())
}

#[sqlx::test]
async fn notify_with_messaging_disabled_still_marks_ready(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn_without_sms(&pool).await;
    let order = seed_order(&pool).await;
    app.expect_sms(0).await;

    let res = app
        .notify(&json!({ "id": order.id }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: Value = res.json().await.expect("Failed to parse response");
    assert_eq!(json!(true), body["ok"]);
    assert_eq!(json!("disabled"), body["channel"]);
    assert_eq!(OrderStatus::Ready, app.fetch_order(order.id).await.status);

    Ok(())
}

#[sqlx::test]
async fn notify_reports_gateway_rejection_but_keeps_order_ready(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let order = seed_order(&pool).await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 21211,
            "message": "The 'To' number is not a valid phone number.",
            "status": 400
        })))
        .expect(1)
        .mount(&app.sms_server)
        .await;

    let res = app
        .notify(&json!({ "id": order.id }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: Value = res.json().await.expect("Failed to parse response");
    assert_eq!(json!(false), body["ok"]);
    assert_eq!(json!(21211), body["error_code"]);
    assert_eq!(OrderStatus::Ready, app.fetch_order(order.id).await.status);

    Ok(())
}

#[sqlx::test]
async fn notify_backfills_legacy_ready_order_without_texting(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let order = seed_order(&pool).await;
    force_ready(&pool, order.id, None).await;
    app.expect_sms(0).await;

    let res = app
        .notify(&json!({ "id": order.id }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: Value = res.json().await.expect("Failed to parse response");
    assert_eq!(json!(true), body["already"]);

    let ready_at = app.fetch_order(order.id).await.ready_at.expect("ready_at not backfilled");
    assert!(ready_at <= Utc::now());

    Ok(())
}

#[sqlx::test]
async fn notify_returns_400_for_invalid_bodies(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    let test_cases = vec![
        (json!({}), "missing id"),
        (json!({ "id": null }), "null id"),
        (json!({ "id": "order-1" }), "malformed id"),
    ];

    for (body, description) in test_cases {
        let res = app.notify(&body).await.expect("Failed to execute request");

        assert_eq!(
            StatusCode::BAD_REQUEST,
            res.status(),
            "The API did not fail with 400 Bad Request when the payload had {}",
            description
        );
        let body: Value = res.json().await.expect("Failed to parse response");
        assert_eq!(json!(false), body["ok"]);
    }

    Ok(())
}

#[sqlx::test]
async fn notify_returns_404_for_unknown_order(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    app.expect_sms(0).await;

    let res = app
        .notify(&json!({ "id": Uuid::new_v4() }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::NOT_FOUND, res.status());

    Ok(())
}

#[sqlx::test]
async fn notify_moves_order_out_of_pending_event_stream(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let order = seed_order(&pool).await;
    app.expect_sms(1).await;

    let mut events = app
        .events("pending", None)
        .await
        .expect("Failed to execute request");
    let first = tokio::time::timeout(StdDuration::from_secs(10), events.chunk())
        .await
        .expect("Timed out waiting for first event")
        .expect("Failed to read event")
        .expect("Stream ended early");
    assert!(String::from_utf8_lossy(&first).contains(&order.id.to_string()));

    app.notify(&json!({ "id": order.id }))
        .await
        .expect("Failed to execute request");

    let cleared = tokio::time::timeout(StdDuration::from_secs(10), async {
        while let Ok(Some(chunk)) = events.chunk().await {
            if !String::from_utf8_lossy(&chunk).contains(&order.id.to_string()) {
                return true;
            }
        }
        false
    })
    .await
    .expect("Timed out waiting for order to leave the pending stream");
    assert!(cleared);

    Ok(())
}
