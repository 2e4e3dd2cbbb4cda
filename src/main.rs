use std::time::Duration;

use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use pulse_service::config::Config;
use pulse_service::handlers;
use pulse_service::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    info!(env = %config.app.env, "starting pulse-service");

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database.url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    let state = AppState::postgres(pool);

    let bind_addr = (config.app.host.clone(), config.app.port);
    info!(host = %config.app.host, port = config.app.port, "listening");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure)
    })
    .bind(bind_addr)
    .context("failed to bind HTTP listener")?
    .run()
    .await
    .context("HTTP server terminated")?;

    Ok(())
}
