//! Process-wide registry of per-client state.
//!
//! Each client owns one `ClientState`: a single async mutex guarding the
//! seen-file set and the pending task, plus the execution flag. Entries are
//! created on first reference and never removed while the process runs.
//! Cross-client state shares nothing, so one slow client cannot stall
//! another.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};
use vigia_core::{error::VigiaError, types::FileRef};
use vigia_memory::Store;

/// The undecided unit of work for one client.
///
/// `instruction` exists exactly in the `Awaiting` phase, so the invariant
/// "instruction is present iff a confirmation is outstanding" holds by
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Pending {
    /// No files pending.
    #[default]
    None,
    /// Files detected, instruction not yet captured.
    Detected { files: Vec<FileRef> },
    /// Files and instruction captured, awaiting yes/no.
    Awaiting {
        files: Vec<FileRef>,
        instruction: String,
    },
}

/// Mutable per-client state, guarded by the client lock.
#[derive(Default)]
pub struct ClientSlot {
    /// File ids already reported. Hydrated from the store on first touch.
    pub seen: HashSet<String>,
    pub hydrated: bool,
    pub pending: Pending,
    /// Batches detected while a confirmation or execution was outstanding.
    pub queued: VecDeque<Vec<FileRef>>,
}

impl ClientSlot {
    /// Promote the next queued batch into the pending slot.
    ///
    /// Only fires when the slot is free; returns the promoted files so the
    /// caller can announce them.
    pub fn promote_queued(&mut self) -> Option<Vec<FileRef>> {
        if !matches!(self.pending, Pending::None) {
            return None;
        }
        let files = self.queued.pop_front()?;
        self.pending = Pending::Detected {
            files: files.clone(),
        };
        Some(files)
    }
}

/// Long-lived state for one client.
pub struct ClientState {
    pub client_id: String,
    slot: AsyncMutex<ClientSlot>,
    /// True while a confirmed task is running for this client.
    pub executing: AtomicBool,
}

impl ClientState {
    fn new(client_id: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            slot: AsyncMutex::new(ClientSlot::default()),
            executing: AtomicBool::new(false),
        }
    }

    /// Lock the slot without touching the store. Use only when the seen set
    /// is not consulted.
    pub async fn lock(&self) -> MutexGuard<'_, ClientSlot> {
        self.slot.lock().await
    }

    /// Lock the slot, hydrating the seen set from the store on first touch.
    pub async fn lock_hydrated(
        &self,
        store: &Store,
    ) -> Result<MutexGuard<'_, ClientSlot>, VigiaError> {
        let mut slot = self.slot.lock().await;
        if !slot.hydrated {
            slot.seen = store.seen_files(&self.client_id).await?;
            slot.hydrated = true;
        }
        Ok(slot)
    }
}

/// Registry of per-client state objects.
#[derive(Default)]
pub struct ClientRegistry {
    inner: Mutex<HashMap<String, Arc<ClientState>>>,
}

impl ClientRegistry {
    /// Fetch the state for a client, creating it on first reference.
    pub fn get_or_create(&self, client_id: &str) -> Arc<ClientState> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .entry(client_id.to_string())
            .or_insert_with(|| Arc::new(ClientState::new(client_id)))
            .clone()
    }
}
