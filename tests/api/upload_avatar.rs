use reqwest::StatusCode;

use serde_json::{json, Value};

use sqlx::PgPool;

use uuid::Uuid;

use wiremock::matchers::*;
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{AvatarUpload, TestApp};

fn encode(bytes: &[u8]) -> String {
    use base64::Engine;

    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn upload(file_base64: Option<String>, profile_id: Uuid) -> AvatarUpload {
    AvatarUpload {
        file_base64,
        content_type: Some("image/jpeg".into()),
        filename: Some("Me At The Bar.PNG".into()),
        profile_id: Some(profile_id.to_string()),
    }
}

#[sqlx::test]
async fn upload_stores_image_and_returns_public_url(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let profile_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path_regex(format!(
            r"^/storage/v1/object/avatars/profiles/{}/\d+-meatthebar\.png\.jpg$",
            profile_id
        )))
        .and(header("Authorization", "Bearer TestServiceKey"))
        .and(header("x-upsert", "true"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.storage_server)
        .await;

    let res = app
        .upload_avatar(&upload(Some(encode(b"\xff\xd8\xff\xe0jpeg")), profile_id))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: Value = res.json().await.expect("Failed to parse response");
    assert_eq!(json!(true), body["ok"]);
    let url = body["url"].as_str().expect("Missing url");
    assert!(url.contains(&format!("/storage/v1/object/public/avatars/profiles/{}/", profile_id)));

    Ok(())
}

#[sqlx::test]
async fn upload_returns_400_for_invalid_payloads(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let profile_id = Uuid::new_v4();

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.storage_server)
        .await;

    let oversized = vec![0u8; 1024 * 1024 + 1];
    let test_cases = vec![
        (upload(None, profile_id), "no file"),
        (upload(Some("!!not base64!!".into()), profile_id), "bad base64"),
        (upload(Some(encode(&oversized)), profile_id), "an image over 1 MiB"),
        (
            AvatarUpload {
                profile_id: None,
                ..upload(Some(encode(b"jpeg")), profile_id)
            },
            "no profile id",
        ),
    ];

    for (payload, description) in test_cases {
        let res = app
            .upload_avatar(&payload)
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
async fn upload_returns_500_when_storage_fails(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.storage_server)
        .await;

    let res = app
        .upload_avatar(&upload(Some(encode(b"jpeg")), Uuid::new_v4()))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, res.status());

    Ok(())
}
