use {
    crate::domain::{
        audit::CallTrace,
        error::PipelineError,
        gateway::{OpenSessionRequest, OpenSessionResult, PaymentGateway, SESSION_OK, SessionAttempt},
    },
    reqwest::{Client, StatusCode, header::HeaderMap},
    serde::{Deserialize, Serialize},
    std::{
        future::Future,
        pin::Pin,
        time::{Duration, Instant},
    },
};

/// Longest response body kept in a `GatewayStatus` error message.
const ERROR_BODY_LIMIT: usize = 512;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionRequest {
    login_id: String,
    password: String,
    #[serde(rename = "merchantID")]
    merchant_id: String,
    signature: String,
    tx_id: String,
    xpay_transaction: XPayTransaction,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct XPayTransaction {
    #[serde(rename = "txid")]
    tx_id: String,
    purchase_amount: String,
    purchase_currency: String,
    purchase_date: String,
    purchase_desc: String,
    #[serde(rename = "invoiceid")]
    invoice_id: String,
    item: String,
    quantity: String,
    expiry_time: i32,
}

impl From<&OpenSessionRequest> for SessionRequest {
    fn from(req: &OpenSessionRequest) -> Self {
        Self {
            login_id: req.login.clone(),
            password: req.password.clone(),
            merchant_id: req.merchant_id.clone(),
            signature: req.signature.clone(),
            tx_id: req.transaction_id.as_str().to_string(),
            xpay_transaction: XPayTransaction {
                tx_id: req.transaction_id.as_str().to_string(),
                purchase_amount: req.purchase_amount.clone(),
                purchase_currency: req.purchase_currency.clone(),
                purchase_date: req.purchase_date.clone(),
                purchase_desc: req.description.clone(),
                invoice_id: req.invoice_id.clone(),
                item: "1".into(),
                quantity: "1".into(),
                expiry_time: req.expiry,
            },
        }
    }
}

impl SessionRequest {
    /// Copy safe to store in the audit trail and the link's debug payload.
    fn redacted(&self) -> Self {
        Self {
            password: "***".into(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    result: SessionResultDto,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SessionResultDto {
    code: i64,
    #[serde(rename = "errorDetails")]
    error_details: String,
    #[serde(rename = "sessionid")]
    session_id: String,
    #[serde(rename = "xTran")]
    x_tran: XTranDto,
    #[serde(rename = "TxDirection")]
    tx_direction: i32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct XTranDto {
    purchase_amount: f64,
    purchase_date: i64,
    quantity: i32,
    #[serde(rename = "paymentTokenid")]
    payment_token_id: String,
    confirm_date: i64,
    purchase_type: i32,
    #[serde(rename = "savetoken")]
    save_token: i32,
    fee_amount: f64,
}

impl From<SessionResultDto> for OpenSessionResult {
    fn from(dto: SessionResultDto) -> Self {
        Self {
            session_id: dto.session_id,
            payment_token_id: dto.x_tran.payment_token_id,
            error_details: dto.error_details,
            purchase_amount: dto.x_tran.purchase_amount,
            purchase_date: dto.x_tran.purchase_date,
            quantity: dto.x_tran.quantity,
            confirm_date: dto.x_tran.confirm_date,
            purchase_type: dto.x_tran.purchase_type,
            save_token: dto.x_tran.save_token,
            fee_amount: dto.x_tran.fee_amount,
            tx_direction: dto.tx_direction,
        }
    }
}

/// HTTP client for the ACLEDA XPay open-session endpoint.
#[derive(Clone)]
pub struct AcledaGateway {
    client: Client,
    open_session_url: String,
}

impl AcledaGateway {
    pub fn new(open_session_url: String, timeout: Duration) -> Result<Self, PipelineError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            PipelineError::GatewayTransport {
                message: format!("failed to build HTTP client: {e}"),
                timed_out: false,
            }
        })?;

        Ok(Self {
            client,
            open_session_url,
        })
    }

    async fn open_session_inner(&self, request: &OpenSessionRequest) -> SessionAttempt {
        let wire = SessionRequest::from(request);
        let mut trace = CallTrace {
            url: self.open_session_url.clone(),
            method: "POST".into(),
            request_body: serde_json::to_string(&wire.redacted()).unwrap_or_default(),
            request_headers: "content-type: application/json".into(),
            ..Default::default()
        };

        if let Err(e) = request.validate() {
            return SessionAttempt {
                trace,
                outcome: Err(e),
            };
        }

        let started = Instant::now();
        let sent = self
            .client
            .post(&self.open_session_url)
            .json(&wire)
            .send()
            .await;

        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                trace.latency = started.elapsed();
                return SessionAttempt {
                    trace,
                    outcome: Err(transport_error(e)),
                };
            }
        };

        let status = response.status();
        trace.status_code = Some(status.as_u16());
        trace.response_headers = format_headers(response.headers());

        let body = response.text().await;
        trace.latency = started.elapsed();

        let outcome = match body {
            Ok(body) => {
                let outcome = interpret(status, &body);
                trace.response_body = body;
                outcome
            }
            Err(e) => Err(transport_error(e)),
        };

        if let Ok(result) = &outcome {
            tracing::debug!(
                transaction_id = %request.transaction_id,
                session_id = %result.session_id,
                latency_ms = trace.latency.as_millis() as u64,
                "acleda session opened"
            );
        }

        SessionAttempt { trace, outcome }
    }
}

impl PaymentGateway for AcledaGateway {
    fn name(&self) -> &str {
        "acleda"
    }

    fn open_session(
        &self,
        request: &OpenSessionRequest,
    ) -> Pin<Box<dyn Future<Output = SessionAttempt> + Send + '_>> {
        let request = request.clone();
        Box::pin(async move { self.open_session_inner(&request).await })
    }
}

fn transport_error(e: reqwest::Error) -> PipelineError {
    PipelineError::GatewayTransport {
        timed_out: e.is_timeout(),
        message: e.to_string(),
    }
}

fn interpret(status: StatusCode, body: &str) -> Result<OpenSessionResult, PipelineError> {
    if status != StatusCode::OK {
        return Err(PipelineError::GatewayStatus {
            status: status.as_u16(),
            body: body.chars().take(ERROR_BODY_LIMIT).collect(),
        });
    }

    let parsed: SessionResponse =
        serde_json::from_str(body).map_err(|e| PipelineError::GatewayMalformed(e.to_string()))?;

    let code = parsed.result.code;
    let result = OpenSessionResult::from(parsed.result);
    if result.error_details != SESSION_OK {
        let details = if result.error_details.is_empty() {
            format!("processor code {code} without error details")
        } else {
            result.error_details
        };
        return Err(PipelineError::GatewayRejected(details));
    }

    Ok(result)
}

fn format_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value.to_str().unwrap_or("<binary>")))
        .collect::<Vec<_>>()
        .join("\n")
}
