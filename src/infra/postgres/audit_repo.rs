use {
    crate::domain::audit::ApiCall,
    crate::domain::error::PipelineError,
    crate::domain::store::ApiCallStore,
    sqlx::PgPool,
    std::{future::Future, pin::Pin},
};

#[derive(Clone)]
pub struct PgApiCallStore {
    pool: PgPool,
}

impl PgApiCallStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub async fn insert_api_call(pool: &PgPool, call: &ApiCall) -> Result<(), PipelineError> {
    sqlx::query(
        r#"
        INSERT INTO api_calls
            (id, created_at, transaction_id, service, merchant, track, webtype, msisdn,
             url, method, request_body, request_headers, response_body, response_headers,
             status_code, latency_ms, error)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        "#,
    )
    .bind(call.id)
    .bind(call.created_at)
    .bind(&call.transaction_id)
    .bind(&call.service)
    .bind(&call.merchant)
    .bind(&call.track)
    .bind(&call.webtype)
    .bind(&call.msisdn)
    .bind(&call.url)
    .bind(&call.method)
    .bind(&call.request_body)
    .bind(&call.request_headers)
    .bind(&call.response_body)
    .bind(&call.response_headers)
    .bind(call.status_code)
    .bind(call.latency_ms)
    .bind(call.error.as_deref())
    .execute(pool)
    .await?;

    Ok(())
}

impl ApiCallStore for PgApiCallStore {
    fn insert<'a>(
        &'a self,
        call: &'a ApiCall,
    ) -> Pin<Box<dyn Future<Output = Result<(), PipelineError>> + Send + 'a>> {
        Box::pin(insert_api_call(&self.pool, call))
    }
}
