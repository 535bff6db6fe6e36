//! Subscription gate.
//!
//! Every processing path — poll tick and inbound message alike — asks the
//! gate first. A fresh client gets a trial; a lapsed one is suspended with a
//! single notice on the transition, and stays silent afterwards until a
//! payment callback renews it.

use super::notices;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};
use vigia_core::{
    config::LicenseConfig,
    error::VigiaError,
    message::OutgoingMessage,
    traits::Channel,
    types::SubscriptionState,
};
use vigia_memory::Store;

/// Gate verdict for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Suspended,
}

/// Evaluates a client's subscription against the current date.
#[derive(Clone)]
pub struct LicenseGate {
    store: Store,
    channel: Arc<dyn Channel>,
    trial_days: u64,
    default_folder_id: String,
}

impl LicenseGate {
    pub fn new(
        store: Store,
        channel: Arc<dyn Channel>,
        config: &LicenseConfig,
        default_folder_id: &str,
    ) -> Self {
        Self {
            store,
            channel,
            trial_days: config.trial_days,
            default_folder_id: default_folder_id.to_string(),
        }
    }

    /// Check a client, provisioning it with a trial on first observation.
    ///
    /// A store failure here fails the current tick/request; the next
    /// scheduled tick retries naturally.
    pub async fn check(&self, client_id: &str) -> Result<Access, VigiaError> {
        let today = chrono::Local::now().date_naive();

        let Some(client) = self.store.get_client(client_id).await? else {
            let expires_on = today + chrono::Days::new(self.trial_days);
            self.store
                .ensure_client(client_id, &self.default_folder_id, expires_on)
                .await?;
            info!("license: provisioned {client_id} with trial until {expires_on}");
            return Ok(Access::Allowed);
        };

        let lapsed = today > client.expires_on;
        if client.state == SubscriptionState::Active && !lapsed {
            return Ok(Access::Allowed);
        }

        if client.state == SubscriptionState::Active {
            // Stored as active but lapsed: this is the suspension transition,
            // the only moment the client hears about it.
            self.store
                .set_client_state(client_id, SubscriptionState::Suspended)
                .await?;
            info!(
                "license: suspended {client_id} (expired {})",
                client.expires_on
            );
            let notice = OutgoingMessage::new(client_id, notices::suspended());
            if let Err(e) = self.channel.send(notice).await {
                warn!("license: failed to send suspension notice to {client_id}: {e}");
            }
        }

        Ok(Access::Suspended)
    }

    /// Reactivate a client with a new expiry. Creates the client if the
    /// payment provider knows it before we do.
    pub async fn renew(&self, client_id: &str, new_expiry: NaiveDate) -> Result<(), VigiaError> {
        self.store
            .renew_client(client_id, &self.default_folder_id, new_expiry)
            .await?;
        info!("license: renewed {client_id} until {new_expiry}");
        Ok(())
    }
}
