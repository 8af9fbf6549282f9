use {
    super::error::PipelineError,
    super::id::TransactionId,
    super::money::Amount,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::fmt,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkStatus {
    Pending,
    Success,
    Failed,
    Expired,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for LinkStatus {
    type Error = PipelineError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            "EXPIRED" => Ok(Self::Expired),
            other => Err(PipelineError::Validation(format!(
                "unknown link status: {other}"
            ))),
        }
    }
}

/// One row per transaction. Only `status` changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentLink {
    pub id: String,
    pub transaction_id: TransactionId,
    pub merchant_id: String,
    pub session_id: String,
    pub payment_token_id: String,
    pub description: String,
    pub amount: Amount,
    pub currency: String,
    pub invoice_id: String,
    pub status: LinkStatus,
    /// Minutes the processor keeps the session open.
    pub expiry_time: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // Processor echo, kept for debugging only.
    pub purchase_amount: f64,
    pub purchase_date: i64,
    pub quantity: i32,
    pub confirm_date: i64,
    pub purchase_type: i32,
    pub save_token: i32,
    pub fee_amount: f64,
    pub tx_direction: i32,

    pub return_url: String,
    pub error_url: String,

    pub request_json: String,
    pub response_json: String,
}

/// Create request as delivered by the HTTP layer or a queued job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateLinkInput {
    pub amount: String,
    pub currency: String,
    #[serde(default)]
    pub description: String,
    /// Recorded as the msisdn of the audited gateway call.
    #[serde(default)]
    pub customer_phone: String,
    pub return_url: String,
    pub callback_url: String,
    /// Session lifetime sent to the processor, in minutes; zero or absent
    /// means the configured default.
    #[serde(default)]
    pub expired_time: i32,
}

impl CreateLinkInput {
    pub fn validate(&self) -> Result<(), PipelineError> {
        let required = [
            ("amount", &self.amount),
            ("currency", &self.currency),
            ("return url", &self.return_url),
            ("callback url", &self.callback_url),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(PipelineError::Validation(format!("{name} is required")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateLinkOutput {
    pub transaction_id: TransactionId,
    pub payment_url: String,
    pub session_id: String,
    pub payment_token_id: String,
    pub amount: String,
    pub currency: String,
    pub status: LinkStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PaymentLink {
    /// End of the link's window. The window is fixed by configuration and
    /// does not follow the per-link `expiry_time`.
    pub fn expires_at(&self, window: chrono::Duration) -> DateTime<Utc> {
        self.created_at + window
    }

    pub fn is_past_expiry(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        self.status == LinkStatus::Pending && now >= self.expires_at(window)
    }
}

/// What the hosted payment page needs to render and hand off to ACLEDA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPage {
    pub transaction_id: TransactionId,
    pub merchant_id: String,
    pub session_id: String,
    pub payment_token_id: String,
    pub description: String,
    pub amount: Amount,
    pub currency: String,
    pub status: LinkStatus,
    pub return_url: String,
    pub error_url: String,
    pub expires_at: DateTime<Utc>,
}

impl PaymentPage {
    pub fn new(link: PaymentLink, window: chrono::Duration) -> Self {
        Self {
            expires_at: link.expires_at(window),
            transaction_id: link.transaction_id,
            merchant_id: link.merchant_id,
            session_id: link.session_id,
            payment_token_id: link.payment_token_id,
            description: link.description,
            amount: link.amount,
            currency: link.currency,
            status: link.status,
            return_url: link.return_url,
            error_url: link.error_url,
        }
    }
}

pub fn payment_url(
    base_url: &str,
    transaction_id: &TransactionId,
    session_id: &str,
    payment_token_id: &str,
) -> String {
    format!(
        "{}/payment-page/acleda/{}?sid={}&ptid={}",
        base_url.trim_end_matches('/'),
        transaction_id,
        session_id,
        payment_token_id
    )
}
