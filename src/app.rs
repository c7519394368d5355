use std::net::TcpListener;
use std::time::Duration;

use actix_web::dev::Server;
use actix_web::{get, HttpResponse, Responder};
use actix_web::{web, App, HttpServer};

use sqlx::PgPool;

use tracing_actix_web::TracingLogger;

use crate::client::AvatarStore;
use crate::controller::{avatars, drinks, notifications, orders, profiles};
use crate::error::RestError;
use crate::lifecycle::{Notifier, OrderPolicy};
use crate::read_model::OrderFeed;

/// Room for a base64 encoded avatar at the decoded size limit
const JSON_LIMIT_BYTES: usize = 4 * 1024 * 1024;

/// Simple health-check endpoint
#[tracing::instrument(name = "Health check")]
#[get("/health_check")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("I am alive")
}

/// Run the application on a specified TCP listener
pub fn run(
    listener: TcpListener,
    pool: PgPool,
    notifier: Notifier,
    avatar_store: AvatarStore,
    policy: OrderPolicy,
    poll_interval: Duration,
) -> anyhow::Result<Server> {
    let feed = web::Data::new(OrderFeed::new(pool.clone(), poll_interval, policy));

    // Wrap application data
    let pool = web::Data::new(pool);
    let notifier = web::Data::new(notifier);
    let avatar_store = web::Data::new(avatar_store);
    let policy = web::Data::new(policy);

    // Malformed bodies get the same JSON error shape as everything else
    let json_config = web::JsonConfig::default()
        .limit(JSON_LIMIT_BYTES)
        .error_handler(|err, _req| RestError::ParseError(err.to_string()).into());

    // Start the server
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(json_config.clone())
            .app_data(pool.clone())
            .app_data(notifier.clone())
            .app_data(avatar_store.clone())
            .app_data(policy.clone())
            .app_data(feed.clone())
            .service(health_check)
            .service(
                web::scope("/api")
                    .service(notifications::services())
                    .service(avatars::services())
                    .service(profiles::scope())
                    .service(drinks::scope())
                    .service(orders::scope()),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
