use {
    super::id::TransactionId,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::time::Duration,
    uuid::Uuid,
};

/// Who asked for the outbound call. Filled by the HTTP layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    #[serde(default)]
    pub merchant: String,
    /// Inbound route that triggered the call.
    #[serde(default)]
    pub track: String,
    #[serde(default)]
    pub webtype: String,
    #[serde(default)]
    pub msisdn: String,
}

/// Transport-level view of one outbound request, captured whatever the outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallTrace {
    pub url: String,
    pub method: String,
    pub request_body: String,
    pub request_headers: String,
    pub response_body: String,
    pub response_headers: String,
    /// `None` when no response arrived.
    pub status_code: Option<u16>,
    pub latency: Duration,
}

/// One row of the outbound-call audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiCall {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub transaction_id: String,
    pub service: String,
    pub merchant: String,
    pub track: String,
    pub webtype: String,
    pub msisdn: String,
    pub url: String,
    pub method: String,
    pub request_body: String,
    pub request_headers: String,
    pub response_body: String,
    pub response_headers: String,
    pub status_code: Option<i32>,
    pub latency_ms: i64,
    pub error: Option<String>,
}

impl ApiCall {
    pub fn new(
        service: &str,
        trace: CallTrace,
        context: &CallContext,
        transaction_id: &TransactionId,
        error: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            created_at: Utc::now(),
            transaction_id: transaction_id.as_str().to_string(),
            service: service.to_string(),
            merchant: context.merchant.clone(),
            track: context.track.clone(),
            webtype: context.webtype.clone(),
            msisdn: context.msisdn.clone(),
            url: trace.url,
            method: trace.method,
            request_body: trace.request_body,
            request_headers: trace.request_headers,
            response_body: trace.response_body,
            response_headers: trace.response_headers,
            status_code: trace.status_code.map(i32::from),
            latency_ms: i64::try_from(trace.latency.as_millis()).unwrap_or(i64::MAX),
            error,
        }
    }
}
