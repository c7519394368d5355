use chrono::{Duration, Utc};

use reqwest::StatusCode;

use serde_json::{json, Value};

use sqlx::PgPool;

use uuid::Uuid;

use wiremock::matchers::*;
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{force_ready, seed_order, TestApp};

#[sqlx::test]
async fn remind_after_cooldown_texts_guest_once(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let order = seed_order(&pool).await;
    force_ready(&pool, order.id, Some(Utc::now() - Duration::minutes(12))).await;

    Mock::given(method("POST"))
        .and(body_string_contains("Reminder"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sid": "SMremind" })))
        .expect(1)
        .mount(&app.sms_server)
        .await;

    let res = app
        .remind(&json!({ "id": order.id }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: Value = res.json().await.expect("Failed to parse response");
    assert_eq!(json!(true), body["ok"]);
    assert_eq!(json!("SMremind"), body["sid"]);
    assert!(app.fetch_order(order.id).await.reminded_at.is_some());

    let res = app
        .remind(&json!({ "id": order.id }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::CONFLICT, res.status());

    Ok(())
}

#[sqlx::test]
async fn remind_before_cooldown_is_rejected(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let order = seed_order(&pool).await;
    force_ready(&pool, order.id, Some(Utc::now() - Duration::minutes(9))).await;
    app.expect_sms(0).await;

    let res = app
        .remind(&json!({ "id": order.id }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::CONFLICT, res.status());
    assert!(app.fetch_order(order.id).await.reminded_at.is_none());

    Ok(())
}

#[sqlx::test]
async fn remind_for_pending_order_is_400(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let order = seed_order(&pool).await;
    app.expect_sms(0).await;

    let res = app
        .remind(&json!({ "id": order.id }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::BAD_REQUEST, res.status());

    Ok(())
}

#[sqlx::test]
async fn failed_reminder_can_be_retried(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let order = seed_order(&pool).await;
    force_ready(&pool, order.id, Some(Utc::now() - Duration::minutes(12))).await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&app.sms_server)
        .await;

    let res = app
        .remind(&json!({ "id": order.id }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: Value = res.json().await.expect("Failed to parse response");
    assert_eq!(json!(false), body["ok"]);
    assert!(app.fetch_order(order.id).await.reminded_at.is_none());

    app.expect_sms(1).await;
    let res = app
        .remind(&json!({ "id": order.id }))
        .await
        .expect("Failed to execute request");

    let body: Value = res.json().await.expect("Failed to parse response");
    assert_eq!(json!(true), body["ok"]);

    Ok(())
}

#[sqlx::test]
async fn remind_with_messaging_disabled_reports_not_ok(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn_without_sms(&pool).await;
    let order = seed_order(&pool).await;
    force_ready(&pool, order.id, Some(Utc::now() - Duration::minutes(12))).await;

    let res = app
        .remind(&json!({ "id": order.id }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: Value = res.json().await.expect("Failed to parse response");
    assert_eq!(json!(false), body["ok"]);
    assert_eq!(json!("disabled"), body["channel"]);
    assert!(app.fetch_order(order.id).await.reminded_at.is_none());

    Ok(())
}

#[sqlx::test]
async fn remind_returns_404_for_unknown_order(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    let res = app
        .remind(&json!({ "id": Uuid::new_v4() }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::NOT_FOUND, res.status());

    Ok(())
}

#[sqlx::test]
async fn remind_without_id_is_400(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    let res = app
        .remind(&json!({}))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::BAD_REQUEST, res.status());

    Ok(())
}
