use actix_web::dev::HttpServiceFactory;
use actix_web::{get, put, web, HttpResponse, Responder};

use serde::Deserialize;

use sqlx::PgPool;

use crate::error::{RestError, RestResult};
use crate::repo::DrinksRepo;

#[derive(Debug, Deserialize)]
pub struct AvailabilityBody {
    available: bool,
}

#[tracing::instrument(name = "List drinks", skip(pool))]
#[get("")]
async fn list(pool: web::Data<PgPool>) -> RestResult<impl Responder> {
    let drinks = DrinksRepo::fetch_all(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(drinks))
}

#[tracing::instrument(name = "Set drink availability", skip(pool))]
#[put("/{id}/availability")]
async fn set_availability(
    id: web::Path<i32>,
    body: web::Json<AvailabilityBody>,
    pool: web::Data<PgPool>,
) -> RestResult<impl Responder> {
    let id = id.into_inner();

    let drink = DrinksRepo::set_available(pool.get_ref(), id, body.available)
        .await?
        .ok_or_else(|| RestError::NotFound(format!("Drink {} not found", id)))?;

    Ok(HttpResponse::Ok().json(drink))
}

/// Drinks menu endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/drinks").service(list).service(set_availability)
}
