//! Gateway — wires the messaging channel, the folder watcher, the licensing
//! gate, and the confirmation state machine into one event loop.
//!
//! Concurrency model: one polling task per client plus one task per inbound
//! message, all serialized per client through the registry's client lock.
//! Shutdown fans out over a watch channel; pollers finish their in-flight
//! tick and stop.

mod confirm;
mod executor;
mod license;
mod notices;
mod registry;
mod watcher;

#[cfg(test)]
pub(crate) mod testutil;

pub use license::{Access, LicenseGate};

use confirm::ConfirmPolicy;
use registry::ClientRegistry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{error, info, warn};
use vigia_core::{
    config::{ApiConfig, ClientSeed, Config, WatcherConfig},
    message::OutgoingMessage,
    traits::{Channel, FolderBrowser, ProcessingAgent},
};
use vigia_memory::{ExecutionLogger, Store};

/// The central gateway owning all long-lived state.
pub struct Gateway {
    pub(super) channel: Arc<dyn Channel>,
    pub(super) browser: Arc<dyn FolderBrowser>,
    pub(super) agent: Arc<dyn ProcessingAgent>,
    pub(super) store: Store,
    pub(super) executions: ExecutionLogger,
    pub(super) gate: LicenseGate,
    pub(super) registry: ClientRegistry,
    pub(super) policy: ConfirmPolicy,
    pub(super) watcher: WatcherConfig,
    pub(super) api: ApiConfig,
    pub(super) seeds: Vec<ClientSeed>,
    pub(super) trial_days: u64,
    pub(super) agent_timeout: Duration,
    pub(super) uptime: Instant,
}

impl Gateway {
    /// Create a new gateway.
    pub fn new(
        channel: Arc<dyn Channel>,
        browser: Arc<dyn FolderBrowser>,
        agent: Arc<dyn ProcessingAgent>,
        store: Store,
        config: &Config,
    ) -> Self {
        let gate = LicenseGate::new(
            store.clone(),
            channel.clone(),
            &config.license,
            &config.storage.default_folder_id,
        );
        let executions = ExecutionLogger::new(store.pool().clone());
        Self {
            channel,
            browser,
            agent,
            store,
            executions,
            gate,
            registry: ClientRegistry::default(),
            policy: ConfirmPolicy::from_config(&config.confirm),
            watcher: config.watcher.clone(),
            api: config.api.clone(),
            seeds: config.clients.clone(),
            trial_days: config.license.trial_days,
            agent_timeout: Duration::from_secs(config.agent.timeout_secs),
            uptime: Instant::now(),
        }
    }

    /// Run the main event loop until a shutdown signal arrives.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        info!(
            "Vigía gateway running | channel: {} | storage: {} | agent: {}",
            self.channel.name(),
            self.browser.name(),
            self.agent.name(),
        );

        self.seed_clients().await?;

        let mut rx = self
            .channel
            .start()
            .await
            .map_err(|e| anyhow::anyhow!("failed to start channel: {e}"))?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Spawn the watcher supervisor.
        let watcher_handle = if self.watcher.enabled {
            let gw = self.clone();
            let rx = shutdown_rx.clone();
            Some(tokio::spawn(async move {
                gw.supervisor_loop(rx).await;
            }))
        } else {
            None
        };

        // Spawn the payment-callback API server.
        let api_handle = if self.api.enabled {
            let config = self.api.clone();
            let gate = self.gate.clone();
            let uptime = self.uptime;
            Some(tokio::spawn(async move {
                crate::api::serve(config, gate, uptime).await;
            }))
        } else {
            None
        };

        // Main event loop with graceful shutdown.
        loop {
            tokio::select! {
                Some(incoming) = rx.recv() => {
                    let gw = self.clone();
                    tokio::spawn(async move {
                        gw.handle_message(incoming).await;
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        self.shutdown(shutdown_tx, watcher_handle, api_handle).await;
        Ok(())
    }

    /// Register config-seeded clients that are not in the store yet.
    async fn seed_clients(&self) -> anyhow::Result<()> {
        if self.seeds.is_empty() {
            return Ok(());
        }
        let expires_on = chrono::Local::now().date_naive() + chrono::Days::new(self.trial_days);
        for seed in &self.seeds {
            self.store
                .ensure_client(&seed.chat_id, &seed.folder_id, expires_on)
                .await
                .map_err(|e| anyhow::anyhow!("failed to seed client {}: {e}", seed.chat_id))?;
        }
        info!("seeded {} client(s) from config", self.seeds.len());
        Ok(())
    }

    /// Graceful shutdown: stop pollers (in-flight ticks complete), then the
    /// API server and the channel.
    async fn shutdown(
        &self,
        shutdown_tx: watch::Sender<bool>,
        watcher_handle: Option<tokio::task::JoinHandle<()>>,
        api_handle: Option<tokio::task::JoinHandle<()>>,
    ) {
        info!("Shutting down...");
        let _ = shutdown_tx.send(true);

        if let Some(handle) = watcher_handle {
            let abort = handle.abort_handle();
            if tokio::time::timeout(Duration::from_secs(30), handle)
                .await
                .is_err()
            {
                warn!("watcher did not stop in time, aborting");
                abort.abort();
            }
        }

        if let Some(handle) = api_handle {
            handle.abort();
        }

        if let Err(e) = self.channel.stop().await {
            warn!("failed to stop channel: {e}");
        }

        info!("Shutdown complete.");
    }

    /// Fire a notification at a client; failures are logged, never fatal.
    pub(super) async fn notify(&self, chat_id: &str, text: String) {
        let msg = OutgoingMessage::new(chat_id, text);
        if let Err(e) = self.channel.send(msg).await {
            error!("failed to send notification to {chat_id}: {e}");
        }
    }
}
