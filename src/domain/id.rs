use {
    super::clock::Clock,
    super::error::PipelineError,
    derive_more::Display,
    serde::{Deserialize, Serialize},
    uuid::Uuid,
};

/// Prefix of every transaction id issued for ACLEDA payment links.
pub const TRANSACTION_PREFIX: &str = "ACL";

/// Correlates a processor session, the stored link and every audit/event record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(id: impl Into<String>) -> Result<Self, PipelineError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(PipelineError::Validation(
                "transaction id is required".into(),
            ));
        }
        Ok(Self(id))
    }

    /// `{prefix}-{unix seconds}`. Two calls inside the same second collide;
    /// the repository's unique constraint is what catches that.
    pub fn generate(prefix: &str, clock: &dyn Clock) -> Self {
        Self(format!("{prefix}-{}", clock.now().timestamp()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Async job identifier (`job-<uuid v7>` when generated).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Result<Self, PipelineError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(PipelineError::Validation("job id is required".into()));
        }
        Ok(Self(id))
    }

    pub fn generate() -> Self {
        Self(format!("job-{}", Uuid::now_v7().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
