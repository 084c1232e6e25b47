//! Geofence service - vehicle zone tracking over HTTP
//!
//! Ingests vehicle location pings, resolves which circular zone each vehicle
//! is in and reports enter/exit transitions.
//!
//! Module structure:
//! - `domain/` - Core types, haversine distance, errors
//! - `services/` - Zone registry, transition tracker, history, engine
//! - `io/` - HTTP server, request validation, Prometheus output
//! - `infra/` - Config, Metrics

use clap::Parser;
use geofence_service::infra::config::LogFormat;
use geofence_service::infra::{Config, Metrics};
use geofence_service::io::{start_http_server, AppState};
use geofence_service::services::{GeofenceEngine, ZoneRegistry};
use std::env;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Geofence service - vehicle zone enter/exit tracking
#[derive(Parser, Debug)]
#[command(name = "geofence-service", version, about)]
struct Args {
    /// Path to TOML configuration file (default: $CONFIG_FILE or config/dev.toml)
    #[arg(short, long)]
    config: Option<String>,
}

/// Initialize structured logging
///
/// Filter precedence: RUST_LOG, then LOG_LEVEL, then the config file level.
fn init_tracing(config_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = env::var("LOG_LEVEL")
            .map(|l| l.to_lowercase())
            .unwrap_or_else(|_| config_level.to_string());
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Read the file before logging is up so its level can seed the filter
    let config_path = Config::resolve_config_path(args.config);
    let loaded = Config::from_file(&config_path);
    let file_level =
        loaded.as_ref().map(|c| c.log_level().to_string()).unwrap_or_else(|_| "info".to_string());
    let log_format = env::var("LOG_FORMAT")
        .ok()
        .and_then(|f| f.parse().ok())
        .or_else(|| loaded.as_ref().ok().map(Config::log_format))
        .unwrap_or_default();
    init_tracing(&file_level, log_format);

    info!(version = env!("CARGO_PKG_VERSION"), "geofence-service starting");

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %format!("{e:#}"), "config_load_failed_using_defaults");
            Config::default()
        }
    }
    .with_env_overrides(|key| env::var(key).ok());

    info!(
        config_file = %config.config_file(),
        host = %config.host(),
        log_format = %config.log_format(),
        port = %config.port(),
        static_dir = %config.static_dir(),
        api_base_url = %config.api_base_url(),
        zones = %config.zones().len(),
        max_history_per_vehicle = %config.max_events_per_vehicle(),
        "config_loaded"
    );

    // Invalid or duplicate zones abort startup
    let registry = match ZoneRegistry::from_definitions(config.zones()) {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            error!(config_file = %config.config_file(), error = %e, "zone_config_invalid");
            return Err(e.into());
        }
    };
    let metrics = Arc::new(Metrics::new());
    let engine = Arc::new(GeofenceEngine::new(
        registry,
        config.max_events_per_vehicle(),
        metrics.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Periodic metrics summary
    let metrics_interval = config.metrics_interval_secs();
    if metrics_interval > 0 {
        let reporter_metrics = metrics.clone();
        let reporter_engine = engine.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
            interval.tick().await;
            loop {
                interval.tick().await;
                reporter_metrics.report(reporter_engine.tracked_vehicles()).log();
            }
        });
    }

    // Handle shutdown on Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_tx.send(true);
    });

    let addr = tokio::net::lookup_host((config.host(), config.port()))
        .await?
        .next()
        .ok_or("listen host did not resolve to an address")?;
    let state = Arc::new(AppState::new(engine, metrics, &config));

    info!(frontend = %config.api_base_url(), "frontend_available");

    if let Err(e) = start_http_server(addr, state, shutdown_rx).await {
        error!(error = %format!("{e:#}"), "http_server_error");
        return Err(e.into());
    }

    info!("geofence-service shutdown complete");
    Ok(())
}
