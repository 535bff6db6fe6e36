//! Client/subscription record CRUD.

use super::Store;
use chrono::NaiveDate;
use vigia_core::{
    error::VigiaError,
    types::{ClientRecord, SubscriptionState},
};

const DATE_FMT: &str = "%Y-%m-%d";

impl Store {
    /// Fetch a client record.
    pub async fn get_client(&self, client_id: &str) -> Result<Option<ClientRecord>, VigiaError> {
        let row: Option<(String, String, String, String)> = sqlx::query_as(
            "SELECT client_id, folder_id, state, expires_on FROM clients WHERE client_id = ?",
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| VigiaError::Memory(format!("get client failed: {e}")))?;

        row.map(|(client_id, folder_id, state, expires_on)| {
            let expires_on = NaiveDate::parse_from_str(&expires_on, DATE_FMT).map_err(|e| {
                VigiaError::Memory(format!("bad expires_on for {client_id}: {e}"))
            })?;
            Ok(ClientRecord {
                client_id,
                folder_id,
                state: SubscriptionState::parse(&state),
                expires_on,
            })
        })
        .transpose()
    }

    /// Register a client if it does not exist yet. Existing rows are left
    /// untouched.
    pub async fn ensure_client(
        &self,
        client_id: &str,
        folder_id: &str,
        expires_on: NaiveDate,
    ) -> Result<(), VigiaError> {
        sqlx::query(
            "INSERT OR IGNORE INTO clients (client_id, folder_id, state, expires_on) \
             VALUES (?, ?, 'active', ?)",
        )
        .bind(client_id)
        .bind(folder_id)
        .bind(expires_on.format(DATE_FMT).to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| VigiaError::Memory(format!("ensure client failed: {e}")))?;
        Ok(())
    }

    /// Update a client's subscription state.
    pub async fn set_client_state(
        &self,
        client_id: &str,
        state: SubscriptionState,
    ) -> Result<(), VigiaError> {
        sqlx::query(
            "UPDATE clients SET state = ?, updated_at = datetime('now') WHERE client_id = ?",
        )
        .bind(state.as_str())
        .bind(client_id)
        .execute(&self.pool)
        .await
        .map_err(|e| VigiaError::Memory(format!("set client state failed: {e}")))?;
        Ok(())
    }

    /// Reactivate a client with a new expiry, creating it if missing.
    pub async fn renew_client(
        &self,
        client_id: &str,
        default_folder_id: &str,
        expires_on: NaiveDate,
    ) -> Result<(), VigiaError> {
        sqlx::query(
            "INSERT INTO clients (client_id, folder_id, state, expires_on) \
             VALUES (?, ?, 'active', ?) \
             ON CONFLICT(client_id) DO UPDATE SET \
                 state = 'active', \
                 expires_on = excluded.expires_on, \
                 updated_at = datetime('now')",
        )
        .bind(client_id)
        .bind(default_folder_id)
        .bind(expires_on.format(DATE_FMT).to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| VigiaError::Memory(format!("renew client failed: {e}")))?;
        Ok(())
    }

    /// List all registered clients (the watcher supervisor scans this).
    pub async fn list_clients(&self) -> Result<Vec<ClientRecord>, VigiaError> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(
            "SELECT client_id, folder_id, state, expires_on FROM clients ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| VigiaError::Memory(format!("list clients failed: {e}")))?;

        rows.into_iter()
            .map(|(client_id, folder_id, state, expires_on)| {
                let expires_on =
                    NaiveDate::parse_from_str(&expires_on, DATE_FMT).map_err(|e| {
                        VigiaError::Memory(format!("bad expires_on for {client_id}: {e}"))
                    })?;
                Ok(ClientRecord {
                    client_id,
                    folder_id,
                    state: SubscriptionState::parse(&state),
                    expires_on,
                })
            })
            .collect()
    }
}
