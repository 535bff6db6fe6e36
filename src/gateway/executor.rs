//! Task executor.
//!
//! Runs a confirmed instruction through the processing agent, bounded by a
//! timeout. Every internal failure becomes `Failure(reason)` and is reported
//! to the operator; nothing escapes this module as a panic or raw error.

use super::registry::ClientState;
use super::{notices, Gateway};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use vigia_core::types::{ExecutionResult, FileRef, Outcome};
use vigia_memory::audit::{ExecutionEntry, ExecutionStatus};

impl Gateway {
    /// Run a confirmed task to completion and report the outcome.
    ///
    /// The caller must have claimed the client's `executing` flag; it is
    /// released here. The flag guarantees at most one in-flight execution
    /// per client.
    pub(super) async fn execute_task(
        &self,
        state: &Arc<ClientState>,
        client_id: &str,
        files: Vec<FileRef>,
        instruction: String,
    ) {
        let result = self.run_agent(&files, &instruction).await;

        match &result.outcome {
            Outcome::Success => info!(
                "{client_id}: task finished in {:.1}s",
                result.elapsed.as_secs_f64()
            ),
            Outcome::Failure(reason) => warn!("{client_id}: task failed: {reason}"),
        }

        let text = match &result.outcome {
            Outcome::Success => {
                notices::finalized(result.artifact_location.as_deref(), result.elapsed)
            }
            Outcome::Failure(reason) => notices::failed(reason),
        };
        self.notify(client_id, text).await;

        let (status, failure_reason) = match &result.outcome {
            Outcome::Success => (ExecutionStatus::Ok, None),
            Outcome::Failure(reason) => (ExecutionStatus::Error, Some(reason.clone())),
        };
        let entry = ExecutionEntry {
            client_id: client_id.to_string(),
            instruction,
            file_count: files.len() as i64,
            status,
            artifact_location: result.artifact_location.clone(),
            failure_reason,
            elapsed_ms: result.elapsed.as_millis() as i64,
        };
        if let Err(e) = self.executions.log(&entry).await {
            error!("{client_id}: execution log write failed: {e}");
        }

        state.executing.store(false, Ordering::SeqCst);

        // A batch may have queued up behind this task; surface it now.
        let promoted = {
            let mut slot = state.lock().await;
            slot.promote_queued()
        };
        if let Some(next) = promoted {
            self.notify(client_id, notices::new_files(&next)).await;
        }
    }

    /// Invoke the agent with a bounded wait; all failure modes collapse into
    /// a reason string.
    async fn run_agent(&self, files: &[FileRef], instruction: &str) -> ExecutionResult {
        let started = Instant::now();
        let outcome =
            tokio::time::timeout(self.agent_timeout, self.agent.run(files, instruction)).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(Ok(output)) => ExecutionResult {
                artifact_location: output.artifact_location,
                elapsed,
                outcome: Outcome::Success,
            },
            Ok(Err(e)) => ExecutionResult {
                artifact_location: None,
                elapsed,
                outcome: Outcome::Failure(e.to_string()),
            },
            Err(_) => ExecutionResult {
                artifact_location: None,
                elapsed,
                outcome: Outcome::Failure(format!(
                    "agent timed out after {}s",
                    self.agent_timeout.as_secs()
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::gateway::testutil::{harness, harness_custom, harness_with, incoming, MockAgent};
    use vigia_core::types::FileRef;

    #[tokio::test]
    async fn test_rapid_double_confirmation_executes_once() {
        let agent = MockAgent {
            delay: std::time::Duration::from_millis(200),
            ..MockAgent::new()
        };
        let h = harness_with(agent).await;
        h.seed_pending_files("chat-1", vec![FileRef::new("f1", "a.pdf")])
            .await;
        h.gateway
            .clone()
            .handle_message(incoming("chat-1", "resumir"))
            .await;

        // Two confirmations racing for the same client.
        let first = tokio::spawn({
            let gw = h.gateway.clone();
            async move { gw.handle_message(incoming("chat-1", "si")).await }
        });
        let second = tokio::spawn({
            let gw = h.gateway.clone();
            async move { gw.handle_message(incoming("chat-1", "confirmo")).await }
        });
        first.await.unwrap();
        second.await.unwrap();

        assert_eq!(h.agent_calls.lock().unwrap().len(), 1);

        // One of the two got a "task running" rejection or an idle reply,
        // never a second execution.
        let sent = h.sent.lock().unwrap();
        assert!(sent
            .iter()
            .any(|m| m.text.contains("en ejecución") || m.text.contains("No hay archivos")));
    }

    #[tokio::test]
    async fn test_agent_failure_reported_and_slot_cleared() {
        let agent = MockAgent {
            fail_with: Some("unsupported file type".to_string()),
            ..MockAgent::new()
        };
        let h = harness_with(agent).await;
        h.seed_pending_files("chat-1", vec![FileRef::new("f1", "a.pdf")])
            .await;
        h.gateway
            .clone()
            .handle_message(incoming("chat-1", "resumir"))
            .await;
        h.gateway
            .clone()
            .handle_message(incoming("chat-1", "si"))
            .await;

        {
            let sent = h.sent.lock().unwrap();
            let last = &sent[sent.len() - 1];
            assert!(last.text.contains("falló"));
            assert!(last.text.contains("unsupported file type"));
        }

        // PendingTask cleared regardless of failure: no retry loop.
        h.gateway
            .clone()
            .handle_message(incoming("chat-1", "si"))
            .await;
        assert_eq!(h.agent_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_agent_timeout_becomes_failure() {
        let agent = MockAgent {
            delay: std::time::Duration::from_millis(200),
            ..MockAgent::new()
        };
        let h = harness_custom(agent, |config| config.agent.timeout_secs = 0).await;
        h.seed_pending_files("chat-1", vec![FileRef::new("f1", "a.pdf")])
            .await;
        h.gateway
            .clone()
            .handle_message(incoming("chat-1", "resumir"))
            .await;
        h.gateway
            .clone()
            .handle_message(incoming("chat-1", "si"))
            .await;

        let sent = h.sent.lock().unwrap();
        let last = &sent[sent.len() - 1];
        assert!(last.text.contains("falló"), "got: {}", last.text);
        assert!(last.text.contains("timed out"), "got: {}", last.text);
    }

    #[tokio::test]
    async fn test_execution_is_logged() {
        let h = harness().await;
        h.seed_pending_files("chat-1", vec![
            FileRef::new("f1", "a.pdf"),
            FileRef::new("f2", "b.pdf"),
        ])
        .await;
        h.gateway
            .clone()
            .handle_message(incoming("chat-1", "resumir"))
            .await;
        h.gateway
            .clone()
            .handle_message(incoming("chat-1", "si"))
            .await;

        let (count, instruction, files): (i64, String, i64) = sqlx::query_as(
            "SELECT COUNT(*), instruction, file_count FROM executions WHERE client_id = 'chat-1'",
        )
        .fetch_one(h.store.pool())
        .await
        .unwrap();
        assert_eq!(count, 1);
        assert_eq!(instruction, "resumir");
        assert_eq!(files, 2);
    }

    #[tokio::test]
    async fn test_queued_batch_promoted_after_execution() {
        let h = harness().await;
        h.seed_pending_files("chat-1", vec![FileRef::new("f1", "a.pdf")])
            .await;
        h.gateway
            .clone()
            .handle_message(incoming("chat-1", "resumir"))
            .await;
        h.queue_batch("chat-1", vec![FileRef::new("f9", "z.pdf")]).await;

        h.gateway
            .clone()
            .handle_message(incoming("chat-1", "si"))
            .await;

        // After the task finished, the queued batch was announced.
        {
            let sent = h.sent.lock().unwrap();
            let last = &sent[sent.len() - 1];
            assert!(last.text.contains("z.pdf"), "got: {}", last.text);
        }

        // And the promoted batch accepts an instruction.
        h.gateway
            .clone()
            .handle_message(incoming("chat-1", "convertir"))
            .await;
        let sent = h.sent.lock().unwrap();
        assert!(sent[sent.len() - 1].text.contains("convertir"));
    }
}
