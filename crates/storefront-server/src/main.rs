mod config;

use std::sync::Arc;

use anyhow::Context;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use storefront_api::mailer::{HttpMailer, Mailer};
use storefront_api::tokens::TokenService;
use storefront_api::{AppState, AppStateInner, Site};
use storefront_db::Database;

use crate::config::{Config, MailConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "storefront_server=debug,storefront_api=debug,storefront_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Database::open(&config.db_path)?;

    let mailer = match &config.mail {
        MailConfig::Log => {
            warn!("No mail API configured; verification links will only be logged");
            Mailer::Log
        }
        MailConfig::Http {
            api_url,
            api_key,
            from_email,
        } => Mailer::Http(HttpMailer::new(
            api_url.clone(),
            api_key.clone(),
            from_email.clone(),
            Some(config.site_name.clone()),
        )),
    };

    let ttl = config
        .token_ttl_hours
        .map(|h| chrono::Duration::try_hours(h).context("STOREFRONT_TOKEN_TTL_HOURS out of range"))
        .transpose()?;
    if ttl.is_none() {
        info!("Tokens are issued without expiry");
    }

    let state: AppState = Arc::new(AppStateInner {
        db,
        tokens: TokenService::new(&config.jwt_secret, ttl),
        mailer,
        site: Site {
            url: config.site_url.clone(),
            name: config.site_name.clone(),
        },
        upload_dir: config.upload_dir.clone(),
    });

    let app = storefront_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("{} listening on {}", config.site_name, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
