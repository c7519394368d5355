use actix_web::dev::HttpServiceFactory;
use actix_web::{get, post, put, web, HttpResponse, Responder};

use serde::Deserialize;

use sqlx::PgPool;

use uuid::Uuid;

use crate::error::{RestError, RestResult};
use crate::model::NewProfile;
use crate::repo::ProfilesRepo;
use crate::session::GuestSession;

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    id: Option<Uuid>,
    name: Option<String>,
    phone: Option<String>,
    photo_url: Option<String>,
}

impl TryFrom<RegisterBody> for NewProfile {
    type Error = String;

    fn try_from(body: RegisterBody) -> Result<Self, Self::Error> {
        let name = body.name.unwrap_or_default().parse()?;
        let phone = body.phone.unwrap_or_default().parse()?;
        let photo_url = body.photo_url.filter(|url| !url.trim().is_empty());

        Ok(Self {
            id: body.id,
            name,
            phone,
            photo_url,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PhotoBody {
    url: Option<String>,
}

#[tracing::instrument(name = "Register guest profile", skip(pool))]
#[post("")]
async fn register(
    body: web::Json<RegisterBody>,
    pool: web::Data<PgPool>,
) -> RestResult<impl Responder> {
    let new_profile: NewProfile = body.into_inner().try_into().map_err(RestError::ParseError)?;

    let profile = ProfilesRepo::insert(pool.get_ref(), &new_profile)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RestError::Conflict("Profile already registered".into())
            }
            other => other.into(),
        })?;

    Ok(HttpResponse::Created().json(profile))
}

#[tracing::instrument(name = "Fetch session profile", skip(session), fields(profile_id = %session.profile().id))]
#[get("/me")]
async fn me(session: GuestSession) -> RestResult<impl Responder> {
    Ok(HttpResponse::Ok().json(session.into_profile()))
}

#[tracing::instrument(name = "Update profile photo", skip(session, pool), fields(profile_id = %session.profile().id))]
#[put("/me/photo")]
async fn update_photo(
    session: GuestSession,
    body: web::Json<PhotoBody>,
    pool: web::Data<PgPool>,
) -> RestResult<impl Responder> {
    let url = body
        .into_inner()
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| RestError::ParseError("Photo url is required".into()))?;

    let profile = ProfilesRepo::update_photo(pool.get_ref(), session.profile().id, &url)
        .await?
        .ok_or(RestError::Unregistered)?;

    Ok(HttpResponse::Ok().json(profile))
}

/// Guest profile endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/profiles")
        .service(register)
        .service(me)
        .service(update_photo)
}
