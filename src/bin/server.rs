use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use delhivery_track::relay::ScriptRelay;
use delhivery_track::server::{AppState, build_app};
use delhivery_track::{AppsScriptSheet, CarrierClient, Tracker, TrackerConfig};

/// Server configuration
struct ServerConfig {
    port: u16,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=info,delhivery_track=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    let tracker_config = TrackerConfig::from_env().context("Invalid tracking configuration")?;

    let sheet = Arc::new(
        AppsScriptSheet::new(&tracker_config).context("Failed to build sheet client")?,
    );
    let relay = ScriptRelay::new(&tracker_config).context("Failed to build relay client")?;
    let carrier = CarrierClient::new(&tracker_config).context("Failed to build carrier client")?;
    let tracker = Tracker::with_parts(tracker_config, carrier, sheet.clone());

    let report = tracker.self_test();
    tracing::info!(
        surface = report.diag.surface_token_present,
        express = report.diag.express_token_present,
        auth = %report.diag.auth_header_format,
        sheet = report.diag.sheet_lookup_configured,
        "Loaded carrier configuration"
    );
    if !report.diag.surface_token_present && !report.diag.express_token_present {
        tracing::warn!("No Delhivery tokens set; every tracking request will fail");
    }

    let app = build_app(AppState::new(tracker, sheet, relay));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}
