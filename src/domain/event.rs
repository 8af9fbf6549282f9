use {
    super::error::PipelineError,
    super::id::TransactionId,
    chrono::{DateTime, Utc},
    serde::Serialize,
    std::{future::Future, pin::Pin},
};

pub const PAYMENT_CREATED: &str = "payment-created";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentCreatedPayload {
    pub session_id: String,
    pub payment_token_id: String,
    pub amount: String,
    pub currency: String,
    pub payment_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentCreatedEvent {
    pub timestamp: DateTime<Utc>,
    pub transaction_id: TransactionId,
    pub message: String,
    pub payload: PaymentCreatedPayload,
}

impl PaymentCreatedEvent {
    pub fn name(&self) -> &'static str {
        PAYMENT_CREATED
    }
}

/// Best-effort fan-out. Callers log failures; nothing is retried.
pub trait EventPublisher: Send + Sync {
    fn publish<'a>(
        &'a self,
        event: &'a PaymentCreatedEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), PipelineError>> + Send + 'a>>;
}
