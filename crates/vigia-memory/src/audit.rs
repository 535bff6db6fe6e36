//! Execution log — records every confirmed task handed to the processing agent.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;
use vigia_core::error::VigiaError;

/// An entry to write to the execution log.
pub struct ExecutionEntry {
    pub client_id: String,
    pub instruction: String,
    pub file_count: i64,
    pub status: ExecutionStatus,
    pub artifact_location: Option<String>,
    pub failure_reason: Option<String>,
    pub elapsed_ms: i64,
}

/// Status of a logged execution.
pub enum ExecutionStatus {
    Ok,
    Error,
}

impl ExecutionStatus {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// Execution logger backed by SQLite.
#[derive(Clone)]
pub struct ExecutionLogger {
    pool: SqlitePool,
}

impl ExecutionLogger {
    /// Create a new logger sharing the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Write an entry to the execution log.
    pub async fn log(&self, entry: &ExecutionEntry) -> Result<(), VigiaError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO executions \
             (id, client_id, instruction, file_count, status, artifact_location, \
              failure_reason, elapsed_ms) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&entry.client_id)
        .bind(&entry.instruction)
        .bind(entry.file_count)
        .bind(entry.status.as_str())
        .bind(&entry.artifact_location)
        .bind(&entry.failure_reason)
        .bind(entry.elapsed_ms)
        .execute(&self.pool)
        .await
        .map_err(|e| VigiaError::Memory(format!("execution log write failed: {e}")))?;

        debug!(
            "execution: {} [{}] {}",
            entry.client_id,
            entry.status.as_str(),
            truncate(&entry.instruction, 80)
        );

        Ok(())
    }
}

/// Trim to at most `max` bytes without splitting a multi-byte char.
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    &s[..cut]
}
