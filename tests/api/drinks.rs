use reqwest::StatusCode;

use serde_json::{json, Value};

use sqlx::PgPool;

use crate::helpers::{seed_drink, TestApp};

#[sqlx::test]
async fn drinks_are_listed_in_menu_order(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    seed_drink(&pool, "Caipirinha").await;
    seed_drink(&pool, "Negroni").await;

    let res = app.drinks().await.expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: Vec<Value> = res.json().await.expect("Failed to parse response");
    let names: Vec<&str> = body.iter().filter_map(|d| d["name"].as_str()).collect();
    assert_eq!(vec!["Caipirinha", "Negroni"], names);
    assert!(body.iter().all(|d| d["available"] == json!(true)));

    Ok(())
}

#[sqlx::test]
async fn staff_can_toggle_availability(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let drink = seed_drink(&pool, "Caipirinha").await;

    let res = app
        .set_availability(drink.id, &json!({ "available": false }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: Value = res.json().await.expect("Failed to parse response");
    assert_eq!(json!(false), body["available"]);

    Ok(())
}

#[sqlx::test]
async fn toggling_unknown_drink_is_404(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    let res = app
        .set_availability(4242, &json!({ "available": false }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::NOT_FOUND, res.status());

    Ok(())
}
