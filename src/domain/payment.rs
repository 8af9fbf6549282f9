use {
    super::payment_link::{LinkStatus, PaymentLink},
    chrono::{DateTime, Utc},
    rust_decimal::Decimal,
    serde::Serialize,
    uuid::Uuid,
};

pub const CHANNEL_ACLEDA: &str = "ACLEDA";

/// Row mirrored into the generic `payments` table after a link is stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub reference_id: String,
    pub payment_type: String,
    pub channel_code: String,
    pub currency: String,
    pub request_amount: Decimal,
    pub status: LinkStatus,
    pub description: String,
    pub payment_url: String,
    pub created_at: DateTime<Utc>,
}

impl PaymentRecord {
    pub fn from_link(link: &PaymentLink, payment_url: &str) -> Self {
        Self {
            id: Uuid::now_v7(),
            reference_id: link.transaction_id.as_str().to_string(),
            payment_type: "PAYMENT".to_string(),
            channel_code: CHANNEL_ACLEDA.to_string(),
            currency: link.currency.clone(),
            request_amount: link.amount.value(),
            status: link.status,
            description: link.description.clone(),
            payment_url: payment_url.to_string(),
            created_at: link.created_at,
        }
    }
}
