use {
    crate::domain::error::PipelineError,
    crate::domain::id::TransactionId,
    crate::domain::money::Amount,
    crate::domain::payment::PaymentRecord,
    crate::domain::payment_link::{LinkStatus, PaymentLink},
    crate::domain::store::PaymentLinkStore,
    chrono::{DateTime, Utc},
    rust_decimal::Decimal,
    sqlx::PgPool,
    std::{future::Future, pin::Pin},
};

#[derive(Clone)]
pub struct PgPaymentLinkStore {
    pool: PgPool,
}

impl PgPaymentLinkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct LinkRow {
    id: String,
    transaction_id: String,
    merchant_id: String,
    session_id: String,
    payment_token_id: String,
    description: String,
    amount: Decimal,
    payment_currency: String,
    invoice_id: String,
    status: String,
    expiry_time: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    purchase_amount: f64,
    purchase_date: i64,
    quantity: i32,
    confirm_date: i64,
    purchase_type: i32,
    save_token: i32,
    fee_amount: f64,
    tx_direction: i32,
    return_url: String,
    error_url: String,
    request_json: String,
    response_json: String,
}

impl TryFrom<LinkRow> for PaymentLink {
    type Error = PipelineError;

    fn try_from(row: LinkRow) -> Result<Self, Self::Error> {
        Ok(PaymentLink {
            id: row.id,
            transaction_id: TransactionId::new(row.transaction_id)?,
            merchant_id: row.merchant_id,
            session_id: row.session_id,
            payment_token_id: row.payment_token_id,
            description: row.description,
            amount: Amount::new(row.amount),
            currency: row.payment_currency,
            invoice_id: row.invoice_id,
            status: LinkStatus::try_from(row.status.as_str())?,
            expiry_time: row.expiry_time,
            created_at: row.created_at,
            updated_at: row.updated_at,
            purchase_amount: row.purchase_amount,
            purchase_date: row.purchase_date,
            quantity: row.quantity,
            confirm_date: row.confirm_date,
            purchase_type: row.purchase_type,
            save_token: row.save_token,
            fee_amount: row.fee_amount,
            tx_direction: row.tx_direction,
            return_url: row.return_url,
            error_url: row.error_url,
            request_json: row.request_json,
            response_json: row.response_json,
        })
    }
}

/// Unique violations become `Conflict`; everything else stays a database error.
fn map_insert_error(err: sqlx::Error, what: &str) -> PipelineError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PipelineError::Conflict(format!("{what} already exists"))
        }
        _ => PipelineError::Database(err),
    }
}

pub async fn insert_link(pool: &PgPool, link: &PaymentLink) -> Result<(), PipelineError> {
    sqlx::query(
        r#"
        INSERT INTO payment_acleda_payment_links
            (id, transaction_id, merchant_id, session_id, payment_token_id,
             description, amount, payment_currency, invoice_id, status,
             expiry_time, created_at, updated_at,
             purchase_amount, purchase_date, quantity, confirm_date,
             purchase_type, save_token, fee_amount, tx_direction,
             return_url, error_url, request_json, response_json)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25)
        "#,
    )
    .bind(&link.id)
    .bind(link.transaction_id.as_str())
    .bind(&link.merchant_id)
    .bind(&link.session_id)
    .bind(&link.payment_token_id)
    .bind(&link.description)
    .bind(link.amount.value())
    .bind(&link.currency)
    .bind(&link.invoice_id)
    .bind(link.status.as_str())
    .bind(link.expiry_time)
    .bind(link.created_at)
    .bind(link.updated_at)
    .bind(link.purchase_amount)
    .bind(link.purchase_date)
    .bind(link.quantity)
    .bind(link.confirm_date)
    .bind(link.purchase_type)
    .bind(link.save_token)
    .bind(link.fee_amount)
    .bind(link.tx_direction)
    .bind(&link.return_url)
    .bind(&link.error_url)
    .bind(&link.request_json)
    .bind(&link.response_json)
    .execute(pool)
    .await
    .map_err(|e| map_insert_error(e, &format!("payment link {}", link.transaction_id)))?;

    Ok(())
}

pub async fn find_link(pool: &PgPool, id: &TransactionId) -> Result<PaymentLink, PipelineError> {
    let row = sqlx::query_as::<_, LinkRow>(
        r#"
        SELECT id, transaction_id, merchant_id, session_id, payment_token_id,
               description, amount, payment_currency, invoice_id, status,
               expiry_time, created_at, updated_at,
               purchase_amount, purchase_date, quantity, confirm_date,
               purchase_type, save_token, fee_amount, tx_direction,
               return_url, error_url, request_json, response_json
        FROM payment_acleda_payment_links
        WHERE transaction_id = $1
        "#,
    )
    .bind(id.as_str())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => row.try_into(),
        None => Err(PipelineError::NotFound(format!("payment link {id}"))),
    }
}

pub async fn set_status(
    pool: &PgPool,
    id: &TransactionId,
    status: LinkStatus,
) -> Result<(), PipelineError> {
    let result = sqlx::query(
        r#"
        UPDATE payment_acleda_payment_links
        SET status = $1, updated_at = now()
        WHERE transaction_id = $2
        "#,
    )
    .bind(status.as_str())
    .bind(id.as_str())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(PipelineError::NotFound(format!("payment link {id}")));
    }
    Ok(())
}

pub async fn insert_payment(pool: &PgPool, record: &PaymentRecord) -> Result<(), PipelineError> {
    sqlx::query(
        r#"
        INSERT INTO payments
            (id, reference_id, payment_type, channel_code, currency,
             request_amount, status, description, payment_url, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(record.id)
    .bind(&record.reference_id)
    .bind(&record.payment_type)
    .bind(&record.channel_code)
    .bind(&record.currency)
    .bind(record.request_amount)
    .bind(record.status.as_str())
    .bind(&record.description)
    .bind(&record.payment_url)
    .bind(record.created_at)
    .execute(pool)
    .await
    .map_err(|e| map_insert_error(e, &format!("payment {}", record.reference_id)))?;

    Ok(())
}

impl PaymentLinkStore for PgPaymentLinkStore {
    fn create<'a>(
        &'a self,
        link: &'a PaymentLink,
    ) -> Pin<Box<dyn Future<Output = Result<(), PipelineError>> + Send + 'a>> {
        Box::pin(insert_link(&self.pool, link))
    }

    fn get_by_transaction_id<'a>(
        &'a self,
        id: &'a TransactionId,
    ) -> Pin<Box<dyn Future<Output = Result<PaymentLink, PipelineError>> + Send + 'a>> {
        Box::pin(find_link(&self.pool, id))
    }

    fn update_status<'a>(
        &'a self,
        id: &'a TransactionId,
        status: LinkStatus,
    ) -> Pin<Box<dyn Future<Output = Result<(), PipelineError>> + Send + 'a>> {
        Box::pin(set_status(&self.pool, id, status))
    }

    fn mirror_payment<'a>(
        &'a self,
        record: &'a PaymentRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), PipelineError>> + Send + 'a>> {
        Box::pin(insert_payment(&self.pool, record))
    }
}
