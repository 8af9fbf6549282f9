use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("validation: {0}")]
    Validation(String),

    /// Network failure or timeout talking to the processor. Retryable by the caller.
    #[error("gateway transport: {message}")]
    GatewayTransport { message: String, timed_out: bool },

    #[error("gateway returned status {status}: {body}")]
    GatewayStatus { status: u16, body: String },

    #[error("gateway response unreadable: {0}")]
    GatewayMalformed(String),

    /// The processor answered but refused to open the session.
    #[error("session failed: {0}")]
    GatewayRejected(String),

    /// Storage write failed after the remote session was already opened.
    #[error("failed to save payment link: {0}")]
    Persistence(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("queue full")]
    QueueFull,

    #[error("job worker is not running")]
    WorkerUnavailable,

    #[error("publish: {0}")]
    Publish(String),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Stable machine-readable code shared by HTTP responses and job records.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::GatewayTransport { .. } => "gateway_unavailable",
            Self::GatewayStatus { .. } => "gateway_error",
            Self::GatewayMalformed(_) => "gateway_error",
            Self::GatewayRejected(_) => "session_rejected",
            Self::Persistence(_) => "persistence_error",
            Self::Conflict(_) => "conflict",
            Self::NotFound(_) => "not_found",
            Self::QueueFull => "queue_full",
            Self::WorkerUnavailable => "worker_unavailable",
            Self::Publish(_) => "publish_error",
            Self::Database(_) | Self::Serialization(_) => "internal_error",
        }
    }

    /// Anything the caller may retry without changing the request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::GatewayTransport { .. }
                | Self::GatewayStatus { .. }
                | Self::QueueFull
                | Self::WorkerUnavailable
        )
    }
}

impl From<lapin::Error> for PipelineError {
    fn from(err: lapin::Error) -> Self {
        Self::Publish(err.to_string())
    }
}
