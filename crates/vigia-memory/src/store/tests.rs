use super::Store;
use crate::audit::{ExecutionEntry, ExecutionLogger, ExecutionStatus};
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use vigia_core::types::{FileRef, SubscriptionState};

/// Create an in-memory store for testing.
async fn test_store() -> Store {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await
        .unwrap();
    Store::run_migrations(&pool).await.unwrap();
    Store { pool }
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn test_ensure_and_get_client() {
    let store = test_store().await;
    store
        .ensure_client("chat-1", "folder-1", date("2026-12-31"))
        .await
        .unwrap();

    let client = store.get_client("chat-1").await.unwrap().unwrap();
    assert_eq!(client.client_id, "chat-1");
    assert_eq!(client.folder_id, "folder-1");
    assert_eq!(client.state, SubscriptionState::Active);
    assert_eq!(client.expires_on, date("2026-12-31"));
}

#[tokio::test]
async fn test_get_client_missing() {
    let store = test_store().await;
    assert!(store.get_client("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn test_ensure_client_does_not_overwrite() {
    let store = test_store().await;
    store
        .ensure_client("chat-1", "folder-1", date("2026-12-31"))
        .await
        .unwrap();
    // Second ensure with different values must be a no-op.
    store
        .ensure_client("chat-1", "folder-2", date("2030-01-01"))
        .await
        .unwrap();

    let client = store.get_client("chat-1").await.unwrap().unwrap();
    assert_eq!(client.folder_id, "folder-1");
    assert_eq!(client.expires_on, date("2026-12-31"));
}

#[tokio::test]
async fn test_set_client_state() {
    let store = test_store().await;
    store
        .ensure_client("chat-1", "folder-1", date("2026-12-31"))
        .await
        .unwrap();
    store
        .set_client_state("chat-1", SubscriptionState::Suspended)
        .await
        .unwrap();

    let client = store.get_client("chat-1").await.unwrap().unwrap();
    assert_eq!(client.state, SubscriptionState::Suspended);
}

#[tokio::test]
async fn test_renew_existing_client_reactivates() {
    let store = test_store().await;
    store
        .ensure_client("chat-1", "folder-1", date("2020-01-01"))
        .await
        .unwrap();
    store
        .set_client_state("chat-1", SubscriptionState::Suspended)
        .await
        .unwrap();

    store
        .renew_client("chat-1", "folder-default", date("2027-06-30"))
        .await
        .unwrap();

    let client = store.get_client("chat-1").await.unwrap().unwrap();
    assert_eq!(client.state, SubscriptionState::Active);
    assert_eq!(client.expires_on, date("2027-06-30"));
    // Renewal must not clobber the existing folder assignment.
    assert_eq!(client.folder_id, "folder-1");
}

#[tokio::test]
async fn test_renew_missing_client_creates_it() {
    let store = test_store().await;
    store
        .renew_client("new-chat", "folder-default", date("2027-06-30"))
        .await
        .unwrap();

    let client = store.get_client("new-chat").await.unwrap().unwrap();
    assert_eq!(client.state, SubscriptionState::Active);
    assert_eq!(client.folder_id, "folder-default");
}

#[tokio::test]
async fn test_list_clients() {
    let store = test_store().await;
    store
        .ensure_client("a", "fa", date("2026-12-31"))
        .await
        .unwrap();
    store
        .ensure_client("b", "fb", date("2026-12-31"))
        .await
        .unwrap();

    let clients = store.list_clients().await.unwrap();
    assert_eq!(clients.len(), 2);
    let ids: Vec<_> = clients.iter().map(|c| c.client_id.as_str()).collect();
    assert!(ids.contains(&"a"));
    assert!(ids.contains(&"b"));
}

#[tokio::test]
async fn test_seen_files_empty_for_fresh_client() {
    let store = test_store().await;
    let seen = store.seen_files("chat-1").await.unwrap();
    assert!(seen.is_empty());
}

#[tokio::test]
async fn test_mark_seen_and_reload() {
    let store = test_store().await;
    let files = vec![FileRef::new("f1", "informe.pdf"), FileRef::new("f2", "datos.csv")];
    store.mark_seen("chat-1", &files).await.unwrap();

    let seen = store.seen_files("chat-1").await.unwrap();
    assert_eq!(seen.len(), 2);
    assert!(seen.contains("f1"));
    assert!(seen.contains("f2"));
}

#[tokio::test]
async fn test_mark_seen_idempotent() {
    let store = test_store().await;
    let files = vec![FileRef::new("f1", "informe.pdf")];
    store.mark_seen("chat-1", &files).await.unwrap();
    store.mark_seen("chat-1", &files).await.unwrap();

    let seen = store.seen_files("chat-1").await.unwrap();
    assert_eq!(seen.len(), 1);
}

#[tokio::test]
async fn test_seen_files_are_per_client() {
    let store = test_store().await;
    store
        .mark_seen("chat-1", &[FileRef::new("f1", "a.pdf")])
        .await
        .unwrap();

    let other = store.seen_files("chat-2").await.unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn test_execution_log_write() {
    let store = test_store().await;
    let logger = ExecutionLogger::new(store.pool().clone());

    logger
        .log(&ExecutionEntry {
            client_id: "chat-1".to_string(),
            instruction: "resumir los archivos".to_string(),
            file_count: 2,
            status: ExecutionStatus::Ok,
            artifact_location: Some("https://example.com/out.xlsx".to_string()),
            failure_reason: None,
            elapsed_ms: 1234,
        })
        .await
        .unwrap();

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM executions")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);

    let (status, artifact): (String, Option<String>) =
        sqlx::query_as("SELECT status, artifact_location FROM executions")
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!(status, "ok");
    assert_eq!(artifact.as_deref(), Some("https://example.com/out.xlsx"));
}

#[tokio::test]
async fn test_execution_log_failure_entry() {
    let store = test_store().await;
    let logger = ExecutionLogger::new(store.pool().clone());

    logger
        .log(&ExecutionEntry {
            client_id: "chat-1".to_string(),
            instruction: "convertir a planilla".to_string(),
            file_count: 1,
            status: ExecutionStatus::Error,
            artifact_location: None,
            failure_reason: Some("agent timed out".to_string()),
            elapsed_ms: 600_000,
        })
        .await
        .unwrap();

    let (status, reason): (String, Option<String>) =
        sqlx::query_as("SELECT status, failure_reason FROM executions")
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!(status, "error");
    assert_eq!(reason.as_deref(), Some("agent timed out"));
}
