//! Per-client record of already-reported file ids.
//!
//! The set only ever grows: files are never "un-seen" while the process (or
//! the database) lives, which is what makes duplicate notifications
//! impossible across restarts.

use super::Store;
use std::collections::HashSet;
use vigia_core::{error::VigiaError, types::FileRef};

impl Store {
    /// Load the full seen-file set for a client.
    pub async fn seen_files(&self, client_id: &str) -> Result<HashSet<String>, VigiaError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT file_id FROM seen_files WHERE client_id = ?")
                .bind(client_id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| VigiaError::Memory(format!("load seen files failed: {e}")))?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Record a batch of files as reported, atomically.
    ///
    /// `INSERT OR IGNORE` keeps the call idempotent: re-marking an already
    /// seen file is a no-op, not an error.
    pub async fn mark_seen(&self, client_id: &str, files: &[FileRef]) -> Result<(), VigiaError> {
        if files.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| VigiaError::Memory(format!("mark seen begin failed: {e}")))?;

        for file in files {
            sqlx::query(
                "INSERT OR IGNORE INTO seen_files (client_id, file_id, file_name) VALUES (?, ?, ?)",
            )
            .bind(client_id)
            .bind(&file.id)
            .bind(&file.name)
            .execute(&mut *tx)
            .await
            .map_err(|e| VigiaError::Memory(format!("mark seen failed: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| VigiaError::Memory(format!("mark seen commit failed: {e}")))?;

        Ok(())
    }
}
