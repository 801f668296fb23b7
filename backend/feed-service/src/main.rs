use actix_cors::Cors;
use actix_middleware::CorrelationIdMiddleware;
use actix_web::{App, HttpServer};
use anyhow::Context;
use crypto_core::TokenIssuer;
use db_pool::{create_pool, DbConfig};
use feed_service::config::LogFormat;
use feed_service::services::UploadStore;
use feed_service::{configure_app, db, error, AppState, Config};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SERVICE_NAME: &str = "feed-service";
const DEFAULT_LOG_FILTER: &str = "info,actix_web=info,sqlx=warn";

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn build_cors(allowed_origins: &str) -> Cors {
    let mut cors = Cors::default();
    for origin in allowed_origins.split(',') {
        let origin = origin.trim();
        if origin == "*" {
            cors = cors.allow_any_origin();
        } else if !origin.is_empty() {
            cors = cors.allowed_origin(origin);
        }
    }
    cors.allow_any_method().allow_any_header().max_age(3600)
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
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Feed Service
///
/// Serves account signup/login and the post feed.
///
/// # Routes
///
/// - `/api/auth/*` - signup, login, current user
/// - `/api/posts/*` - feed, posts, likes, comments
/// - `/api/health` - liveness and storage check
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.log.format);
    error::set_include_error_detail(config.expose_error_detail());

    tracing::info!("Starting {} v{}", SERVICE_NAME, env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    if config.jwt_secret_is_weak() {
        tracing::warn!("JWT_SECRET is weak; use at least 32 random characters outside development");
    }

    let tokens = TokenIssuer::new(&config.jwt.secret, config.jwt.lifetime);

    let uploads = UploadStore::new(&config.upload.dir, config.upload.max_bytes);
    uploads
        .ensure_dir()
        .await
        .with_context(|| format!("Failed to create upload directory {}", uploads.dir().display()))?;

    let state = match config.database.url.as_deref() {
        Some(url) => {
            let db_cfg = DbConfig::with_url(SERVICE_NAME, url);
            db_cfg.log_config();

            let pool = create_pool(&db_cfg)
                .await
                .context("Failed to create database pool")?;
            db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Connected to database via db-pool crate");

            AppState::postgres(pool, tokens, uploads)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory storage");
            AppState::in_memory(tokens, uploads)
        }
    };

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&allowed_origins))
            .wrap(CorrelationIdMiddleware)
            .wrap(TracingLogger::default())
            .configure(|cfg| configure_app(cfg, &state))
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .disable_signals()
    .shutdown_timeout(30)
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, draining connections");
        handle.stop(true).await;
    });

    server.await.context("HTTP server failed")?;
    tracing::info!("{} stopped", SERVICE_NAME);
    Ok(())
}
