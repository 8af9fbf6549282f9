use {
    super::audit::CallTrace,
    super::error::PipelineError,
    super::id::TransactionId,
    serde::{Deserialize, Serialize},
    std::{future::Future, pin::Pin},
};

/// Processor marker for an accepted session.
pub const SESSION_OK: &str = "SUCCESS";

/// Normalized open-session request; the adapter owns the wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSessionRequest {
    pub login: String,
    pub password: String,
    pub merchant_id: String,
    pub signature: String,
    pub transaction_id: TransactionId,
    pub purchase_amount: String,
    pub purchase_currency: String,
    /// `YYYY-MM-DD`.
    pub purchase_date: String,
    pub description: String,
    pub invoice_id: String,
    /// Minutes.
    pub expiry: i32,
}

impl OpenSessionRequest {
    pub fn validate(&self) -> Result<(), PipelineError> {
        let required = [
            ("login", &self.login),
            ("password", &self.password),
            ("merchant id", &self.merchant_id),
            ("signature", &self.signature),
            ("purchase amount", &self.purchase_amount),
            ("purchase currency", &self.purchase_currency),
            ("purchase date", &self.purchase_date),
            ("invoice id", &self.invoice_id),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(PipelineError::Validation(format!(
                    "open session: {name} is required"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenSessionResult {
    pub session_id: String,
    pub payment_token_id: String,
    pub error_details: String,
    pub purchase_amount: f64,
    pub purchase_date: i64,
    pub quantity: i32,
    pub confirm_date: i64,
    pub purchase_type: i32,
    pub save_token: i32,
    pub fee_amount: f64,
    pub tx_direction: i32,
}

/// Outcome of one gateway call plus what went over the wire, so the caller
/// can audit failed attempts too.
#[derive(Debug)]
pub struct SessionAttempt {
    pub trace: CallTrace,
    pub outcome: Result<OpenSessionResult, PipelineError>,
}

pub trait PaymentGateway: Send + Sync {
    /// Short service name recorded in the audit trail.
    fn name(&self) -> &str;

    fn open_session(
        &self,
        request: &OpenSessionRequest,
    ) -> Pin<Box<dyn Future<Output = SessionAttempt> + Send + '_>>;
}
