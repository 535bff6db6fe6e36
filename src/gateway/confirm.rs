//! Confirmation state machine.
//!
//! Per client: Idle → files detected → instruction captured (awaiting
//! yes/no) → executing → Idle. Driven entirely by inbound operator messages;
//! the watcher only ever installs file batches.
//!
//! Policy for a non-affirmative reply while a confirmation is outstanding:
//! an explicit negative token cancels, anything else becomes the replacement
//! instruction and requires a fresh confirmation. No typed instruction is
//! ever dropped silently.

use super::license::Access;
use super::registry::Pending;
use super::{notices, Gateway};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, error, info};
use vigia_core::{config::ConfirmConfig, message::IncomingMessage};

/// Confirmation token sets, injected from config.
pub(crate) struct ConfirmPolicy {
    affirmative: Vec<String>,
    negative: Vec<String>,
}

impl ConfirmPolicy {
    pub(crate) fn from_config(config: &ConfirmConfig) -> Self {
        let lower = |tokens: &[String]| tokens.iter().map(|t| t.to_lowercase()).collect();
        Self {
            affirmative: lower(&config.affirmative_tokens),
            negative: lower(&config.negative_tokens),
        }
    }

    pub(crate) fn is_affirmative(&self, text: &str) -> bool {
        self.affirmative.contains(&normalize(text))
    }

    pub(crate) fn is_negative(&self, text: &str) -> bool {
        self.negative.contains(&normalize(text))
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

impl Gateway {
    /// Handle one inbound operator message.
    pub(super) async fn handle_message(self: Arc<Self>, incoming: IncomingMessage) {
        let client_id = incoming.chat_id.clone();

        let access = match self.gate.check(&client_id).await {
            Ok(access) => access,
            Err(e) => {
                error!("license check failed for {client_id}: {e}");
                return;
            }
        };
        if access == Access::Suspended {
            debug!("dropping message from suspended client {client_id}");
            return;
        }

        let text = incoming.text.trim();
        if text.is_empty() {
            return;
        }

        let state = self.registry.get_or_create(&client_id);
        let mut slot = match state.lock_hydrated(&self.store).await {
            Ok(slot) => slot,
            Err(e) => {
                error!("failed to load state for {client_id}: {e}");
                return;
            }
        };

        match slot.pending.clone() {
            Pending::None => {
                drop(slot);
                if state.executing.load(Ordering::SeqCst) {
                    self.notify(&client_id, notices::task_running()).await;
                } else {
                    self.notify(&client_id, notices::no_pending()).await;
                }
            }

            Pending::Detected { files } => {
                // First free text while files are pending becomes the
                // instruction; it is never read as a yes/no.
                let instruction = text.to_string();
                slot.pending = Pending::Awaiting {
                    files: files.clone(),
                    instruction: instruction.clone(),
                };
                drop(slot);
                info!("{client_id}: instruction captured, awaiting confirmation");
                self.notify(&client_id, notices::confirm_prompt(&instruction, files.len()))
                    .await;
            }

            Pending::Awaiting { files, instruction } => {
                if self.policy.is_affirmative(text) {
                    // Claim the execution slot while still holding the client
                    // lock, so racing confirmations cannot both pass.
                    if state
                        .executing
                        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                        .is_err()
                    {
                        drop(slot);
                        self.notify(&client_id, notices::task_running()).await;
                        return;
                    }
                    slot.pending = Pending::None;
                    drop(slot);
                    info!("{client_id}: confirmed, executing \"{instruction}\"");
                    self.execute_task(&state, &client_id, files, instruction)
                        .await;
                } else if self.policy.is_negative(text) {
                    slot.pending = Pending::None;
                    let promoted = slot.promote_queued();
                    drop(slot);
                    info!("{client_id}: cancelled pending task");
                    self.notify(&client_id, notices::cancelled()).await;
                    if let Some(next) = promoted {
                        self.notify(&client_id, notices::new_files(&next)).await;
                    }
                } else {
                    let replacement = text.to_string();
                    slot.pending = Pending::Awaiting {
                        files: files.clone(),
                        instruction: replacement.clone(),
                    };
                    drop(slot);
                    info!("{client_id}: instruction replaced, awaiting fresh confirmation");
                    self.notify(
                        &client_id,
                        notices::replaced_prompt(&replacement, files.len()),
                    )
                    .await;
                }
            }
        }
    }
}
