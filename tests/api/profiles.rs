use reqwest::StatusCode;

use serde_json::{json, Value};

use sqlx::PgPool;

use uuid::Uuid;

use crate::helpers::{Registration, TestApp};

fn registration(id: Option<Uuid>) -> Registration {
    Registration {
        id,
        name: Some("Luísa Prado".into()),
        phone: Some("(11) 99999-8888".into()),
        photo_url: None,
    }
}

#[sqlx::test]
async fn register_normalizes_phone_and_keeps_client_id(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let id = Uuid::new_v4();

    let res = app
        .register(&registration(Some(id)))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::CREATED, res.status());
    let body: Value = res.json().await.expect("Failed to parse response");
    assert_eq!(json!(id), body["id"]);
    assert_eq!(json!("+5511999998888"), body["phone"]);

    Ok(())
}

#[sqlx::test]
async fn register_twice_with_same_id_is_409(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let id = Uuid::new_v4();

    app.register(&registration(Some(id)))
        .await
        .expect("Failed to execute request");
    let res = app
        .register(&registration(Some(id)))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::CONFLICT, res.status());

    Ok(())
}

#[sqlx::test]
async fn register_returns_400_for_invalid_data(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    let test_cases = vec![
        (
            Registration {
                name: None,
                ..registration(None)
            },
            "missing name",
        ),
        (
            Registration {
                name: Some("   ".into()),
                ..registration(None)
            },
            "blank name",
        ),
        (
            Registration {
                name: Some("<script>".into()),
                ..registration(None)
            },
            "invalid name characters",
        ),
        (
            Registration {
                phone: Some("call me".into()),
                ..registration(None)
            },
            "phone without digits",
        ),
    ];

    for (payload, description) in test_cases {
        let res = app
            .register(&payload)
            .await
            .expect("Failed to execute request");

        assert_eq!(
            StatusCode::BAD_REQUEST,
            res.status(),
            "The API did not fail with 400 Bad Request when the payload had {}",
            description
        );
    }

    Ok(())
}

#[sqlx::test]
async fn me_requires_registration(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    let missing = app.me(None).await.expect("Failed to execute request");
    let unknown = app
        .me(Some(Uuid::new_v4()))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::UNAUTHORIZED, missing.status());
    assert_eq!(StatusCode::UNAUTHORIZED, unknown.status());

    Ok(())
}

#[sqlx::test]
async fn me_and_photo_update_use_session_profile(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let id = Uuid::new_v4();
    app.register(&registration(Some(id)))
        .await
        .expect("Failed to execute request");

    let res = app
        .update_photo(Some(id), &json!({ "url": "https://cdn.test/me.jpg" }))
        .await
        .expect("Failed to execute request");
    assert_eq!(StatusCode::OK, res.status());

    let res = app.me(Some(id)).await.expect("Failed to execute request");
    assert_eq!(StatusCode::OK, res.status());
    let body: Value = res.json().await.expect("Failed to parse response");
    assert_eq!(json!("Luísa Prado"), body["name"]);
    assert_eq!(json!("https://cdn.test/me.jpg"), body["photo_url"]);

    Ok(())
}
