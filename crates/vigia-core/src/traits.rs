use crate::{
    error::VigiaError,
    message::{IncomingMessage, OutgoingMessage},
    types::{AgentOutput, FileRef},
};
use async_trait::async_trait;

/// Messaging channel trait — how the agent talks to operators.
///
/// The messaging platform (Telegram in production) implements this trait to
/// receive and send messages. Send failures are the caller's problem to log;
/// they must never abort processing.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Start listening for incoming messages.
    /// Returns a receiver that yields incoming messages.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<IncomingMessage>, VigiaError>;

    /// Send a notification back through this channel.
    async fn send(&self, message: OutgoingMessage) -> Result<(), VigiaError>;

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), VigiaError>;
}

/// Storage listing trait — how the agent sees the watched folder.
///
/// Implementations return a full current snapshot of a folder's children;
/// the core performs the diff against its seen-file record itself.
#[async_trait]
pub trait FolderBrowser: Send + Sync {
    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// List the current children of a remote folder.
    async fn list_children(&self, folder_id: &str) -> Result<Vec<FileRef>, VigiaError>;

    /// Check if the backend is reachable and configured.
    async fn is_available(&self) -> bool;
}

/// Processing agent trait — the opaque worker that executes a confirmed
/// instruction against a batch of files.
#[async_trait]
pub trait ProcessingAgent: Send + Sync {
    /// Human-readable agent name.
    fn name(&self) -> &str;

    /// Run the instruction against the files. Long-running; callers bound it
    /// with a timeout.
    async fn run(&self, files: &[FileRef], instruction: &str) -> Result<AgentOutput, VigiaError>;

    /// Check if the agent is reachable and configured.
    async fn is_available(&self) -> bool;
}
