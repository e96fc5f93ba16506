use anyhow::Result;
use firewatch::config::{load_config, FirewatchConfig};
use firewatch::connection::WsConnector;
use firewatch::preferences::PreferenceStore;
use firewatch::session::LiveSession;
use firewatch::state::StoreChange;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "firewatch=info".into()),
        )
        .init();

    info!("Firewatch starting...");

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("FIREWATCH_CONFIG").ok());
    let mut config = match config_path {
        Some(path) => {
            info!(path = %path, "Loading configuration");
            load_config(&path)?
        }
        None => FirewatchConfig::default(),
    };
    config.apply_env();

    match PreferenceStore::open(&config.preferences.path) {
        Ok(store) => match store.load_overlays() {
            Ok(overlays) => info!(floors = overlays.len(), "Overlay calibrations loaded"),
            Err(e) => warn!(error = %e, "Failed to read overlay calibrations"),
        },
        Err(e) => warn!(error = %e, path = %config.preferences.path, "Preferences unavailable"),
    }

    let mut session = LiveSession::start(&config, Arc::new(WsConnector));
    let mut changes = session.subscribe();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
            change = changes.recv() => match change {
                Ok(change) => log_change(&change),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Change feed lagged"),
                Err(RecvError::Closed) => {
                    error!("Change feed closed");
                    break;
                }
            },
        }
    }

    session.shutdown().await;
    info!("Firewatch stopped");
    Ok(())
}

fn log_change(change: &StoreChange) {
    match change {
        StoreChange::AlertRaised(alert) => warn!(
            alert_id = %alert.id,
            kind = %alert.kind,
            firefighter = alert.firefighter.as_ref().map(|f| f.name.as_str()),
            local = alert.is_local(),
            "ALERT"
        ),
        StoreChange::AlertUpdated(alert) => info!(
            alert_id = %alert.id,
            resolved = alert.resolved,
            acknowledged = alert.acknowledged,
            "Alert updated"
        ),
        StoreChange::ConnectivityChanged { connected } => {
            info!(connected = *connected, "Connectivity changed")
        }
        _ => {}
    }
}
