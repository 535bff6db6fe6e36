//! Folder watcher.
//!
//! A supervisor rescans the client table on the poll interval and keeps one
//! lightweight polling task alive per client. Each tick gates on the
//! subscription, lists the watched folder, and diffs against the seen-file
//! record — membership there is the single source of truth for "already
//! reported", never wall-clock time.

use super::license::Access;
use super::registry::Pending;
use super::{notices, Gateway};
use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use vigia_core::{error::VigiaError, types::FileRef};

impl Gateway {
    /// Background task: keep one poller per known client.
    pub(super) async fn supervisor_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let interval = Duration::from_secs(self.watcher.poll_interval_secs);
        let mut handles = Vec::new();
        let mut started: HashSet<String> = HashSet::new();

        loop {
            match self.store.list_clients().await {
                Ok(clients) => {
                    for client in clients {
                        if started.insert(client.client_id.clone()) {
                            info!("watcher: starting poller for {}", client.client_id);
                            let gw = self.clone();
                            let rx = shutdown.clone();
                            let client_id = client.client_id;
                            handles.push(tokio::spawn(async move {
                                gw.client_poll_loop(client_id, rx).await;
                            }));
                        }
                    }
                }
                Err(e) => error!("watcher: failed to list clients: {e}"),
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => break,
            }
        }

        // No new ticks start after the signal; in-flight ones finish here.
        for handle in handles {
            let _ = handle.await;
        }
        info!("watcher: all pollers stopped");
    }

    /// Polling loop for one client. Nominal interval on success, longer
    /// sleep after an error; the loop itself never dies.
    pub(super) async fn client_poll_loop(
        self: Arc<Self>,
        client_id: String,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let nominal = Duration::from_secs(self.watcher.poll_interval_secs);
        let backoff = Duration::from_secs(self.watcher.error_backoff_secs);

        loop {
            if *shutdown.borrow() {
                break;
            }

            let sleep_for = match self.poll_once(&client_id).await {
                Ok(()) => nominal,
                Err(e) => {
                    warn!("watcher: tick failed for {client_id}: {e}");
                    backoff
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {}
                _ = shutdown.changed() => break,
            }
        }
        debug!("watcher: poller for {client_id} stopped");
    }

    /// One poll tick: gate, list, diff, record, announce.
    pub(super) async fn poll_once(&self, client_id: &str) -> Result<(), VigiaError> {
        if self.gate.check(client_id).await? == Access::Suspended {
            // Suspension notice already went out on the transition; no
            // listing call while the client stays gated.
            return Ok(());
        }

        let Some(client) = self.store.get_client(client_id).await? else {
            return Err(VigiaError::License(format!(
                "client {client_id} vanished from the store"
            )));
        };

        let listed = self.browser.list_children(&client.folder_id).await?;

        let state = self.registry.get_or_create(client_id);
        let mut slot = state.lock_hydrated(&self.store).await?;

        let new = new_files(&listed, &slot.seen);
        if new.is_empty() {
            return Ok(());
        }

        // Durable record first: if this write fails, nothing is marked seen
        // and the next tick re-detects the same files.
        self.store.mark_seen(client_id, &new).await?;
        for file in &new {
            slot.seen.insert(file.id.clone());
        }

        let busy = state.executing.load(Ordering::SeqCst);
        let text = if matches!(slot.pending, Pending::None) && slot.queued.is_empty() && !busy {
            slot.pending = Pending::Detected { files: new.clone() };
            notices::new_files(&new)
        } else if let Pending::Detected { files } = &mut slot.pending {
            // Instruction not captured yet: fold the batch in, one combined
            // task instead of a lost one.
            files.extend(new.iter().cloned());
            notices::new_files(&new)
        } else {
            // A confirmation or execution is outstanding: queue behind it.
            slot.queued.push_back(new.clone());
            notices::batch_queued(new.len())
        };
        drop(slot);

        info!("watcher: {} new file(s) for {client_id}", new.len());
        self.notify(client_id, text).await;
        Ok(())
    }
}

/// Files present in the listing but not yet reported.
fn new_files(listed: &[FileRef], seen: &HashSet<String>) -> Vec<FileRef> {
    listed
        .iter()
        .filter(|f| !seen.contains(&f.id))
        .cloned()
        .collect()
}
