use std::future::Future;
use std::pin::Pin;

use actix_web::http::header::HeaderMap;
use actix_web::{dev, web, FromRequest, HttpRequest};

use sqlx::PgPool;

use uuid::Uuid;

use crate::error::RestError;
use crate::model::Profile;
use crate::repo::ProfilesRepo;

/// Header carrying the guest's profile ID
pub const PROFILE_ID_HEADER: &str = "X-Profile-Id";

/// A registered guest. Guest-only endpoints take this as an argument and
/// reject the request with 401 when no stored profile matches.
#[derive(Debug, Clone)]
pub struct GuestSession {
    profile: Profile,
}

impl GuestSession {
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn into_profile(self) -> Profile {
        self.profile
    }

    /// Normalized phone number orders are looked up by
    pub fn phone(&self) -> &str {
        &self.profile.phone
    }
}

impl FromRequest for GuestSession {
    type Error = RestError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let pool = req
                .app_data::<web::Data<PgPool>>()
                .ok_or_else(|| RestError::InternalError("PgPool not registered".into()))?;

            let profile_id = profile_id_from_headers(req.headers()).ok_or(RestError::Unregistered)?;

            let profile = ProfilesRepo::fetch_by_id(pool.get_ref(), profile_id)
                .await?
                .ok_or(RestError::Unregistered)?;

            Ok(GuestSession { profile })
        })
    }
}

fn profile_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(PROFILE_ID_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
