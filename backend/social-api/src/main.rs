use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::prelude::*;

use social_api::config::Config;
use social_api::context::AppState;
use social_api::db::{InMemoryRepository, PgRepository, MIGRATOR};
use social_api::middleware::JwtMiddleware;
use social_api::pubsub::{BroadcastBroker, EventBroker};
use social_api::schema::build_schema;
use social_api::seed::seed;
use social_api::server::configure_routes;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // JSON logs with span context, thread ids and source locations
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,social_api=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_line_number(true)
                .with_file(true)
                .with_target(true),
        )
        .init();

    info!("Starting social API...");

    let config = Config::from_env().context("Failed to load configuration")?;

    let broker: Arc<dyn EventBroker> = Arc::new(BroadcastBroker::new(config.pubsub.capacity));

    let state = match &config.database {
        Some(db_config) => {
            db_config.log_config();
            let pool = db_pool::create_pool(db_config.clone())
                .await
                .context("Failed to create database pool")?;
            db_pool::migrate(&pool, &MIGRATOR)
                .await
                .context("Failed to run database migrations")?;

            AppState::new(
                PgRepository::new(pool),
                broker,
                config.jwt.clone(),
                config.pagination,
            )
        }
        None => AppState::new(
            InMemoryRepository::new(),
            broker,
            config.jwt.clone(),
            config.pagination,
        ),
    };

    if config.seed_database {
        let users = seed(&state).await.context("Failed to seed demo data")?;
        info!(users = users.len(), "Demo data seeded");
    }

    let schema = build_schema(&config.graphql);
    let playground = config.graphql.playground;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Social API starting on http://{}/graphql", bind_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .wrap(JwtMiddleware::new(state.jwt.clone()))
            .app_data(web::Data::new(schema.clone()))
            .app_data(web::Data::new(state.clone()))
            .configure(|cfg| configure_routes(cfg, playground))
    })
    .workers(config.server.workers)
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind {}", bind_addr))?
    .run()
    .await?;

    Ok(())
}
