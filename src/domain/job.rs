use {
    super::audit::CallContext,
    super::error::PipelineError,
    super::id::JobId,
    super::payment_link::CreateLinkInput,
    serde::{Deserialize, Serialize},
    std::{fmt, future::Future, pin::Pin},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Done,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Queued)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Work the queue knows how to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobPayload {
    CreatePaymentLink {
        input: CreateLinkInput,
        #[serde(default)]
        context: CallContext,
    },
}

impl JobPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreatePaymentLink { .. } => "create_payment_link",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Job {
    pub fn queued(id: JobId, payload: &JobPayload) -> Self {
        Self {
            id,
            status: JobStatus::Queued,
            message: Some("job queued".into()),
            error: None,
            data: serde_json::to_value(payload).ok(),
        }
    }

    pub fn done(id: JobId, kind: &str, data: serde_json::Value) -> Self {
        Self {
            id,
            status: JobStatus::Done,
            message: Some(format!("{kind} completed")),
            error: None,
            data: Some(data),
        }
    }

    pub fn failed(id: JobId, err: &PipelineError) -> Self {
        Self {
            id,
            status: JobStatus::Error,
            message: Some(err.code().to_string()),
            error: Some(err.to_string()),
            data: None,
        }
    }
}

/// Executes one dequeued payload. Returns the JSON stored as the job's data.
pub trait JobHandler: Send + Sync {
    fn handle(
        &self,
        payload: JobPayload,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, PipelineError>> + Send + '_>>;
}
