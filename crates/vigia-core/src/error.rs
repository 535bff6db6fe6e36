use thiserror::Error;

/// Top-level error type for Vigía.
#[derive(Debug, Error)]
pub enum VigiaError {
    /// Error from the messaging channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// Error from the storage listing collaborator.
    #[error("storage error: {0}")]
    Storage(String),

    /// Error from the processing agent.
    #[error("agent error: {0}")]
    Agent(String),

    /// Error from the persistence layer.
    #[error("memory error: {0}")]
    Memory(String),

    /// Licensing/subscription error.
    #[error("license error: {0}")]
    License(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
