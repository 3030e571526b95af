//! EnOcean integration server
//!
//! Loads the YAML configuration, sets up the hub and runs until Ctrl-C.
//! Outbound telegrams are logged; a transport attaches to the dispatcher's
//! `SendMessage` and `ReceiveMessage` signals.

use anyhow::{Context, Result};
use enocean_components::Hub;
use enocean_config_entries::load_config;
use enocean_core::events::IntegrationEvent;
use enocean_core::Telegram;
use enocean_dispatcher::{Dispatcher, Signal};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_CONFIG_PATH: &str = "enocean.yaml";

fn config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var("ENOCEAN_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
        .into()
}

fn hex(telegram: &Telegram) -> String {
    telegram
        .data()
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Log outbound telegrams and integration events until cancelled
fn spawn_monitor(dispatcher: &Dispatcher, token: CancellationToken) -> JoinHandle<()> {
    let mut outbound = dispatcher.subscribe(Signal::SendMessage);
    let mut events = dispatcher.subscribe_events();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                sent = outbound.recv() => match sent {
                    Ok(telegram) => info!(
                        destination = %telegram.destination,
                        data = %hex(&telegram),
                        "Outbound telegram"
                    ),
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "Outbound monitor lagged"),
                    Err(RecvError::Closed) => break,
                },
                event = events.recv() => match event {
                    Ok(IntegrationEvent::StateChanged(data)) => debug!(
                        unique_id = %data.unique_id,
                        old_state = ?data.old_state,
                        new_state = %data.new_state,
                        "State changed"
                    ),
                    Ok(IntegrationEvent::ButtonPressed(data)) => info!(
                        device_id = %data.id,
                        pushed = ?data.pushed,
                        which = ?data.which,
                        onoff = ?data.onoff,
                        "Button pressed"
                    ),
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event monitor lagged"),
                    Err(RecvError::Closed) => break,
                },
            }
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting EnOcean integration");

    let path = config_path();
    let config = load_config(&path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;
    let dongle = config.dongle.path.clone();
    let entry = config.into_entry();

    let dispatcher = Arc::new(Dispatcher::new());
    let token = CancellationToken::new();
    let monitor = spawn_monitor(&dispatcher, token.child_token());

    let hub = Arc::new(Hub::new(dispatcher));
    let entities = hub.setup_entry(&entry);
    let receiver = hub.spawn(token.child_token());

    info!(dongle = %dongle, entities, "EnOcean integration is running");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    token.cancel();
    hub.shutdown();
    let _ = tokio::join!(receiver, monitor);

    Ok(())
}
