//! Dealerline Server
//!
//! Serves the dealership REST API:
//! - `/api/...` - inventory, sales, workshop, accounts and self-service
//! - `/api/openapi.json` and `/swagger-ui` - API documentation
//! - `/health`, `/health/live`, `/health/ready` - probes
//!
//! ## Configuration
//!
//! Read from `config.toml` (or the file named by `DEALERLINE_CONFIG`) with
//! `DEALERLINE_*` environment overrides, e.g.:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DEALERLINE_HTTP_PORT` | `8080` | HTTP port |
//! | `DEALERLINE_STORAGE_BACKEND` | `mongo` | `mongo` or `memory` |
//! | `DEALERLINE_MONGODB_URI` | local replica set | MongoDB connection URI |
//! | `DEALERLINE_JWT_SECRET` | - | HS256 secret (required outside dev mode) |
//! | `DEALERLINE_ADMIN_EMAIL` / `DEALERLINE_ADMIN_PASSWORD` | - | Bootstrap admin |
//! | `DEALERLINE_SEED_DEMO_DATA` | `false` | Stock demo inventory when empty |
//! | `LOG_FORMAT` | text | `json` for structured logs |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use axum::Router;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use utoipa_swagger_ui::SwaggerUi;

use dl_config::{AppConfig, StorageBackend};
use dl_platform::auth::{Argon2Config, AuthConfig, PasswordPolicy};
use dl_platform::shared::health_api::health_router;
use dl_platform::shared::middleware::AuthLayer;
use dl_platform::{
    Bootstrapper, InMemoryStore, InMemoryUnitOfWork, MongoStore, MongoUnitOfWork, Platform, PlatformSettings,
};

const DEV_JWT_SECRET: &str = "dealerline-dev-only-secret";

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    dl_common::logging::init_logging("dl-server");

    info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = ?config.storage.backend,
        dev_mode = config.dev_mode,
        "Starting Dealerline Server"
    );

    let settings = platform_settings(&config)?;
    let platform = match config.storage.backend {
        StorageBackend::Mongo => {
            info!(database = %config.mongodb.database, "Connecting to MongoDB");
            let client = mongodb::Client::with_uri_str(&config.mongodb.uri)
                .await
                .context("Failed to connect to MongoDB")?;
            let db = client.database(&config.mongodb.database);
            Platform::build(
                Arc::new(MongoStore::new(db.clone())),
                Arc::new(MongoUnitOfWork::new(client, db)),
                settings,
            )?
        }
        StorageBackend::Memory => {
            warn!("Using the in-memory store: all data is lost on restart");
            let store = Arc::new(InMemoryStore::new());
            let unit_of_work = Arc::new(InMemoryUnitOfWork::new(store.clone()));
            Platform::build(store, unit_of_work, settings)?
        }
    };

    let bootstrap = &config.bootstrap;
    let admin = bootstrap
        .admin_email
        .as_deref()
        .zip(bootstrap.admin_password.as_deref());
    let report = Bootstrapper::new(
        platform.repos.users.clone(),
        platform.repos.vehicles.clone(),
        platform.passwords.clone(),
    )
    .run(admin, bootstrap.seed_demo_data)
    .await
    .context("Bootstrap failed")?;
    info!(
        admin_created = report.admin_created,
        vehicles_seeded = report.vehicles_seeded,
        "Bootstrap complete"
    );

    let (api, openapi) = platform.api_parts();
    let app = Router::new()
        .merge(api)
        .nest(
            "/health",
            health_router(platform.health_state(Some(env!("CARGO_PKG_VERSION").to_string()))),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", openapi))
        .layer(AuthLayer::new(platform.app_state()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.http.cors_origins));

    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("API listening on http://{}/api", addr);
    info!("Swagger UI at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Dealerline Server shutdown complete");
    Ok(())
}

fn platform_settings(config: &AppConfig) -> Result<PlatformSettings> {
    let auth = &config.auth;
    let secret_key = if auth.jwt_secret.trim().is_empty() {
        warn!("No JWT secret configured, using the development secret");
        DEV_JWT_SECRET.to_string()
    } else {
        auth.jwt_secret.clone()
    };

    Ok(PlatformSettings {
        auth: AuthConfig {
            secret_key,
            issuer: auth.issuer.clone(),
            audience: auth.audience.clone(),
            access_token_expiry_secs: i64::try_from(auth.access_token_ttl_secs)
                .context("access_token_ttl_secs is too large")?,
            refresh_token_expiry_secs: i64::try_from(auth.refresh_token_ttl_secs)
                .context("refresh_token_ttl_secs is too large")?,
        },
        argon2: if config.dev_mode {
            Argon2Config::testing()
        } else {
            Argon2Config::default()
        },
        password_policy: PasswordPolicy::with_min_length(auth.password_min_length),
        session_cookie_name: auth.session_cookie_name.clone(),
        secure_cookie: !config.dev_mode,
    })
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
