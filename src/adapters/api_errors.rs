use crate::domain::error::PipelineError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Newtype so the domain error can implement axum's `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub PipelineError);

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
            PipelineError::GatewayTransport { timed_out: true, .. } => StatusCode::GATEWAY_TIMEOUT,
            PipelineError::GatewayTransport { .. }
            | PipelineError::GatewayStatus { .. }
            | PipelineError::GatewayMalformed(_) => StatusCode::BAD_GATEWAY,
            PipelineError::GatewayRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::Conflict(_) => StatusCode::CONFLICT,
            PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
            PipelineError::QueueFull | PipelineError::WorkerUnavailable => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            PipelineError::Persistence(_)
            | PipelineError::Publish(_)
            | PipelineError::Database(_)
            | PipelineError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (message, detail) = match &self.0 {
            PipelineError::Validation(msg) => (msg.clone(), None),
            PipelineError::GatewayTransport { message, timed_out } => {
                tracing::error!(timed_out, "gateway transport error: {message}");
                let message = if *timed_out {
                    "payment processor timed out"
                } else {
                    "payment processor unreachable"
                };
                (message.to_string(), None)
            }
            PipelineError::GatewayStatus { status, .. } => (
                "payment processor error".to_string(),
                Some(serde_json::json!({ "upstream_status": status })),
            ),
            PipelineError::GatewayMalformed(_) => {
                ("unreadable payment processor response".to_string(), None)
            }
            PipelineError::GatewayRejected(details) => (
                self.0.to_string(),
                Some(serde_json::json!({ "error_details": details })),
            ),
            PipelineError::Conflict(msg) | PipelineError::NotFound(msg) => (msg.clone(), None),
            PipelineError::QueueFull | PipelineError::WorkerUnavailable => {
                (self.0.to_string(), None)
            }
            PipelineError::Persistence(err) => {
                tracing::error!("persistence error: {err}");
                ("failed to save payment link".to_string(), None)
            }
            PipelineError::Publish(err) => {
                tracing::error!("publish error: {err}");
                ("internal error".to_string(), None)
            }
            PipelineError::Database(err) => {
                tracing::error!("database error: {err}");
                ("internal error".to_string(), None)
            }
            PipelineError::Serialization(err) => {
                tracing::error!("serialization error: {err}");
                ("internal error".to_string(), None)
            }
        };

        let mut body = serde_json::json!({
            "status": status.as_u16(),
            "error_code": self.0.code(),
            "message": message,
        });
        if let Some(detail) = detail {
            body["detail"] = detail;
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_maps_to_504() {
        let err = ApiError(PipelineError::GatewayTransport {
            message: "deadline".into(),
            timed_out: true,
        });
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn taxonomy_status_codes() {
        let cases = [
            (PipelineError::Validation("x".into()), 400),
            (PipelineError::GatewayRejected("DECLINED".into()), 422),
            (PipelineError::GatewayStatus { status: 500, body: String::new() }, 502),
            (PipelineError::Persistence("x".into()), 500),
            (PipelineError::Conflict("x".into()), 409),
            (PipelineError::NotFound("x".into()), 404),
            (PipelineError::QueueFull, 503),
        ];
        for (err, code) in cases {
            assert_eq!(ApiError(err).status().as_u16(), code);
        }
    }
}
