/// Sociogram API server
///
/// Loads configuration, connects storage (Postgres with migrations, or the
/// in-memory store), picks a push notifier and serves the HTTP API until
/// SIGINT/SIGTERM.
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, HttpServer};
use anyhow::Context;
use crypto_core::JwtKeys;
use fcm_push::FcmClient;
use sociogram_api::config::{Config, StorageBackend};
use sociogram_api::db::{MemoryStore, PgPostRepository, PgUserRepository, PostRepository, UserRepository};
use sociogram_api::services::{LoggingNotifier, PushNotifier};
use sociogram_api::AppState;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn storage(
    config: &Config,
) -> anyhow::Result<(Arc<dyn UserRepository>, Arc<dyn PostRepository>)> {
    match config.storage {
        StorageBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(&config.database.url)
                .await
                .context("failed to connect to Postgres")?;

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("failed to run database migrations")?;

            tracing::info!(max_connections = config.database.max_connections, "connected to Postgres");
            Ok((
                Arc::new(PgUserRepository::new(pool.clone())),
                Arc::new(PgPostRepository::new(pool)),
            ))
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage; data is lost on restart");
            let store = MemoryStore::new();
            Ok((store.users(), store.posts()))
        }
    }
}

fn notifier(config: &Config) -> Arc<dyn PushNotifier> {
    let Some(fcm) = &config.fcm else {
        tracing::info!("FCM not configured; push notifications are logged only");
        return Arc::new(LoggingNotifier);
    };

    match FcmClient::from_service_account_file(fcm.project_id.clone(), &fcm.service_account_path) {
        Ok(client) => {
            tracing::info!(project_id = %fcm.project_id, "FCM push notifications enabled");
            Arc::new(client)
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to load FCM credentials; push notifications are logged only");
            Arc::new(LoggingNotifier)
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            anyhow::bail!("invalid configuration: {}", e);
        }
    };

    tracing::info!("Starting sociogram-api v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let jwt = JwtKeys::from_secret(&config.jwt.secret, config.jwt.expiration_hours)
        .context("failed to initialize JWT keys")?;
    let (users, posts) = storage(&config).await?;
    let state = AppState::new(users, posts, notifier(&config), jwt.clone());

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        sociogram_api::app(state.clone(), jwt.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
    })
    .bind(&bind_address)
    .with_context(|| format!("failed to bind {}", bind_address))?
    .run();

    let server_handle = server.handle();
    let mut server_task = actix_web::rt::spawn(server);

    tokio::select! {
        joined = &mut server_task => {
            joined.context("server task failed")??;
            return Ok(());
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
        }
    }

    server_task.await.context("server task failed")??;

    tracing::info!("sociogram-api shut down");
    Ok(())
}
