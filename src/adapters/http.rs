use {
    crate::{
        AppState,
        adapters::api_errors::ApiError,
        domain::{
            audit::CallContext,
            error::PipelineError,
            id::JobId,
            job::{Job, JobPayload},
            payment_link::{CreateLinkInput, CreateLinkOutput, PaymentLink, PaymentPage},
        },
    },
    axum::{
        Json, Router,
        extract::{DefaultBodyLimit, Path, Query, State, rejection::JsonRejection},
        http::{HeaderMap, StatusCode, Uri},
        routing::{get, post},
    },
    serde::Deserialize,
    std::time::Duration,
    tower_http::timeout::TimeoutLayer,
};

pub const MERCHANT_HEADER: &str = "x-merchant";
pub const WEBTYPE_HEADER: &str = "x-webtype";

/// Upper bound on any request; the gateway timeout sits below it.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/acleda/payment-link", post(create_link))
        .route("/acleda/payment-link/{id}", get(get_link))
        .route("/payment-page/acleda/{id}", get(payment_page))
        .route("/acleda/jobs", post(enqueue_job))
        .route("/acleda/jobs/status", get(job_status))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .with_state(state)
}

fn call_context(headers: &HeaderMap, uri: &Uri) -> CallContext {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    CallContext {
        merchant: header(MERCHANT_HEADER),
        track: uri.path().to_string(),
        webtype: header(WEBTYPE_HEADER),
        // Taken from the request's customer phone.
        msisdn: String::new(),
    }
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, PipelineError> {
    body.map(|Json(v)| v)
        .map_err(|e| PipelineError::Validation(e.body_text()))
}

pub async fn create_link(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    body: Result<Json<CreateLinkInput>, JsonRejection>,
) -> Result<Json<CreateLinkOutput>, ApiError> {
    let input = json_body(body)?;
    let context = call_context(&headers, &uri);
    let output = state.links.create_payment_link(input, &context).await?;
    Ok(Json(output))
}

pub async fn get_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PaymentLink>, ApiError> {
    Ok(Json(state.links.get_payment_link(&id).await?))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    sid: Option<String>,
    ptid: Option<String>,
}

pub async fn payment_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PaymentPage>, ApiError> {
    let page = state
        .links
        .open_payment_page(&id, query.sid.as_deref(), query.ptid.as_deref())
        .await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    #[serde(default)]
    id: Option<String>,
    #[serde(flatten)]
    payload: JobPayload,
}

pub async fn enqueue_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    body: Result<Json<EnqueueRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let request = json_body(body)?;
    let id = request.id.map(JobId::new).transpose()?;

    let payload = match request.payload {
        JobPayload::CreatePaymentLink { input, .. } => {
            input.validate()?;
            JobPayload::CreatePaymentLink {
                input,
                context: call_context(&headers, &uri),
            }
        }
    };

    let id = state.jobs.enqueue(payload, id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "job_id": id, "status": "queued" })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    id: Option<String>,
}

pub async fn job_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Job>, ApiError> {
    let id = query
        .id
        .ok_or_else(|| PipelineError::Validation("id is required".into()))?;
    Ok(Json(state.jobs.get_job_status(&id).await?))
}
