use actix_web::dev::HttpServiceFactory;
use actix_web::{post, web, HttpResponse, Responder};

use chrono::Utc;

use serde::Deserialize;
use serde_json::json;

use uuid::Uuid;

use crate::client::AvatarStore;
use crate::domain::AvatarImage;
use crate::error::{RestError, RestResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAvatarBody {
    file_base64: Option<String>,
    content_type: Option<String>,
    filename: Option<String>,
    profile_id: Option<String>,
}

impl UploadAvatarBody {
    fn into_image(self) -> RestResult<AvatarImage> {
        let (Some(file_base64), Some(content_type), Some(filename), Some(profile_id)) = (
            present(self.file_base64),
            present(self.content_type),
            present(self.filename),
            present(self.profile_id),
        ) else {
            return Err(RestError::ParseError("Missing upload parameters".into()));
        };

        if !content_type.starts_with("image/") {
            return Err(RestError::ParseError("Upload must be an image".into()));
        }

        let profile_id: Uuid = profile_id
            .trim()
            .parse()
            .map_err(|_| RestError::ParseError("Invalid profile id".into()))?;

        AvatarImage::decode(&file_base64, &filename, profile_id, Utc::now())
            .map_err(RestError::ParseError)
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[tracing::instrument(name = "Upload guest avatar", skip(body, store))]
#[post("/upload-avatar")]
async fn upload(
    body: web::Json<UploadAvatarBody>,
    store: web::Data<AvatarStore>,
) -> RestResult<impl Responder> {
    let image = body.into_inner().into_image()?;

    let url = store.upload(image).await?;

    Ok(HttpResponse::Ok().json(json!({ "ok": true, "url": url.as_str() })))
}

/// Avatar upload endpoint
pub fn services() -> impl HttpServiceFactory {
    upload
}
