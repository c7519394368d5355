use std::net::TcpListener;

use anyhow::Context;

use sqlx::PgPool;

use barqueue::app;
use barqueue::settings::Settings;
use barqueue::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("Failed to load settings")?;

    let subscriber = telemetry::create_subscriber(settings.log.filter.clone(), std::io::stdout);
    telemetry::set_subscriber(subscriber)?;

    let pool = PgPool::connect_with(settings.database.with_db())
        .await
        .context("Failed to connect to database")?;
    sqlx::migrate!()
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let notifier = settings.sms.notifier()?;
    let avatar_store = settings.storage.avatar_store()?;

    let listener = TcpListener::bind(settings.app.addr())?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    app::run(
        listener,
        pool,
        notifier,
        avatar_store,
        settings.queue.policy(),
        settings.queue.poll_interval(),
    )?
    .await
    .context("Failed to run app")
}
