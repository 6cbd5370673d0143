use crate::model::{ServerRecord, Store, StoreError, StoreEvent};
use log::{error, info};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type SharedStore = Arc<Mutex<Store>>;

/// Supplies the simulated ping values, one per server.
pub trait PingSource: Send {
    fn next_ping(&mut self) -> f64;
}

/// Uniform random ping in `[0, ceiling)` milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct RandomPing {
    ceiling: f64,
}

impl RandomPing {
    pub fn new(ceiling: f64) -> Self {
        Self { ceiling }
    }
}

impl PingSource for RandomPing {
    fn next_ping(&mut self) -> f64 {
        rand::random::<f64>() * self.ceiling
    }
}

fn dispatch(store: &SharedStore, event: StoreEvent) -> Result<(), StoreError> {
    store
        .lock()
        .expect("Failed to lock store for dispatch")
        .dispatch(event)
}

/// Adds the servers one by one, waiting `delay` before each.
pub async fn add_servers(
    store: &SharedStore,
    servers: &[ServerRecord],
    delay: Duration,
) -> Result<(), StoreError> {
    for server in servers {
        tokio::time::sleep(delay).await;
        info!("Adding server {}", server.name);
        dispatch(
            store,
            StoreEvent::Add {
                server: server.clone(),
            },
        )?;
    }
    Ok(())
}

/// Sets a ping on each server in turn, waiting `delay` before each.
/// Stops at the first server the store does not know.
pub async fn ping_servers<S: PingSource>(
    store: &SharedStore,
    servers: &[ServerRecord],
    delay: Duration,
    source: &mut S,
) -> Result<(), StoreError> {
    for server in servers {
        tokio::time::sleep(delay).await;
        info!("Pinging server {}", server.name);
        dispatch(
            store,
            StoreEvent::SetPing {
                id: server.id.clone(),
                ping: source.next_ping(),
            },
        )?;
    }
    Ok(())
}

/// Population first, then pinging. Pinging never starts before every add has been applied.
pub async fn startup_sequence<S: PingSource>(
    store: SharedStore,
    servers: Vec<ServerRecord>,
    delay: Duration,
    mut source: S,
) -> Result<(), StoreError> {
    add_servers(&store, &servers, delay).await?;
    ping_servers(&store, &servers, delay, &mut source).await?;
    info!("Startup sequence finished for {} servers", servers.len());
    Ok(())
}

/// Runs [`startup_sequence`] on a dedicated thread with its own tokio runtime.
pub fn spawn_startup<S: PingSource + 'static>(
    store: SharedStore,
    servers: Vec<ServerRecord>,
    delay: Duration,
    source: S,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("Failed to start runtime for startup sequence: {e}");
                return;
            }
        };

        if let Err(e) = runtime.block_on(startup_sequence(store, servers, delay, source)) {
            error!("Startup sequence stopped: {e}");
        }
    })
}

#[cfg(test)]
#[path = "sequencer_tests.rs"]
mod tests;
