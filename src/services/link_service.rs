use {
    crate::domain::{
        audit::CallContext,
        clock::Clock,
        error::PipelineError,
        event::{EventPublisher, PaymentCreatedEvent, PaymentCreatedPayload},
        gateway::{OpenSessionRequest, PaymentGateway, SessionAttempt},
        id::TransactionId,
        job::{JobHandler, JobPayload},
        money::Amount,
        payment::PaymentRecord,
        payment_link::{
            CreateLinkInput, CreateLinkOutput, LinkStatus, PaymentLink, PaymentPage, payment_url,
        },
        store::PaymentLinkStore,
    },
    crate::services::audit_sink::AuditSink,
    chrono::Duration,
    std::{fmt, future::Future, pin::Pin, sync::Arc},
    uuid::Uuid,
};

/// Merchant credentials and link defaults, built once from config.
#[derive(Debug, Clone)]
pub struct LinkSettings {
    pub login: String,
    pub password: String,
    pub merchant_id: String,
    pub signature: String,
    /// Public origin used to build redirect URLs.
    pub base_url: String,
    /// Link window, and the session lifetime when the caller gives none.
    pub default_expiry_minutes: i32,
    pub prefix: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Validating,
    SessionOpening,
    Persisting,
    SecondaryPersisting,
    Completed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validating => "validating",
            Self::SessionOpening => "session_opening",
            Self::Persisting => "persisting",
            Self::SecondaryPersisting => "secondary_persisting",
            Self::Completed => "completed",
        };
        f.write_str(s)
    }
}

fn aborted(stage: Stage, err: &PipelineError) {
    if err.is_retryable() || matches!(err, PipelineError::Persistence(_)) {
        tracing::error!(%stage, error = %err, "payment link creation aborted");
    } else {
        tracing::warn!(%stage, error = %err, "payment link creation aborted");
    }
}

/// Opens an ACLEDA session and stores the resulting payment link.
pub struct LinkService {
    gateway: Arc<dyn PaymentGateway>,
    store: Arc<dyn PaymentLinkStore>,
    audit: AuditSink,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    settings: LinkSettings,
}

impl LinkService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        store: Arc<dyn PaymentLinkStore>,
        audit: AuditSink,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
        settings: LinkSettings,
    ) -> Self {
        Self {
            gateway,
            store,
            audit,
            publisher,
            clock,
            settings,
        }
    }

    /// Validate, open the remote session, persist, mirror, then announce.
    ///
    /// Once the link row is written the remote session stays open even if a
    /// later step fails; a failed `create` after a successful session is
    /// reported as `Persistence` and nothing is cancelled remotely.
    #[tracing::instrument(
        name = "create_payment_link",
        skip_all,
        fields(merchant = %context.merchant, transaction_id = tracing::field::Empty)
    )]
    pub async fn create_payment_link(
        &self,
        input: CreateLinkInput,
        context: &CallContext,
    ) -> Result<CreateLinkOutput, PipelineError> {
        input
            .validate()
            .inspect_err(|e| aborted(Stage::Validating, e))?;

        let now = self.clock.now();
        let transaction_id = TransactionId::generate(&self.settings.prefix, &*self.clock);
        tracing::Span::current().record("transaction_id", tracing::field::display(&transaction_id));

        let expiry_minutes = if input.expired_time > 0 {
            input.expired_time
        } else {
            self.settings.default_expiry_minutes
        };

        let mut context = context.clone();
        if context.msisdn.is_empty() {
            context.msisdn = input.customer_phone.trim().to_string();
        }

        let request = OpenSessionRequest {
            login: self.settings.login.clone(),
            password: self.settings.password.clone(),
            merchant_id: self.settings.merchant_id.clone(),
            signature: self.settings.signature.clone(),
            transaction_id: transaction_id.clone(),
            purchase_amount: input.amount.trim().to_string(),
            purchase_currency: input.currency.trim().to_string(),
            purchase_date: now.format("%Y-%m-%d").to_string(),
            description: input.description.clone(),
            invoice_id: transaction_id.as_str().to_string(),
            expiry: expiry_minutes,
        };

        tracing::debug!(stage = %Stage::SessionOpening, "opening gateway session");
        let SessionAttempt { trace, outcome } = self.gateway.open_session(&request).await;
        let request_json = trace.request_body.clone();
        let response_json = trace.response_body.clone();
        self.audit.record(
            self.gateway.name(),
            trace,
            &context,
            &transaction_id,
            outcome.as_ref().err().map(ToString::to_string),
        );
        let session = outcome.inspect_err(|e| aborted(Stage::SessionOpening, e))?;

        let link = PaymentLink {
            id: Uuid::now_v7().to_string(),
            transaction_id: transaction_id.clone(),
            merchant_id: self.settings.merchant_id.clone(),
            session_id: session.session_id,
            payment_token_id: session.payment_token_id,
            description: input.description,
            amount: Amount::parse_lenient(&input.amount),
            currency: request.purchase_currency,
            invoice_id: request.invoice_id,
            status: LinkStatus::Pending,
            expiry_time: expiry_minutes,
            created_at: now,
            updated_at: now,
            purchase_amount: session.purchase_amount,
            purchase_date: session.purchase_date,
            quantity: session.quantity,
            confirm_date: session.confirm_date,
            purchase_type: session.purchase_type,
            save_token: session.save_token,
            fee_amount: session.fee_amount,
            tx_direction: session.tx_direction,
            return_url: input.return_url,
            error_url: input.callback_url,
            request_json,
            response_json,
        };

        self.store.create(&link).await.map_err(|e| {
            let err = match e {
                PipelineError::Conflict(_) | PipelineError::Persistence(_) => e,
                other => PipelineError::Persistence(other.to_string()),
            };
            aborted(Stage::Persisting, &err);
            err
        })?;

        let url = payment_url(
            &self.settings.base_url,
            &transaction_id,
            &link.session_id,
            &link.payment_token_id,
        );

        let record = PaymentRecord::from_link(&link, &url);
        if let Err(e) = self.store.mirror_payment(&record).await {
            tracing::warn!(
                stage = %Stage::SecondaryPersisting,
                error = %e,
                "failed to mirror payment, link kept"
            );
        }

        let output = CreateLinkOutput {
            transaction_id,
            payment_url: url,
            session_id: link.session_id.clone(),
            payment_token_id: link.payment_token_id.clone(),
            amount: request.purchase_amount,
            currency: link.currency.clone(),
            status: link.status,
            expires_at: link.expires_at(self.expiry_window()),
            created_at: now,
        };

        self.announce(&output);
        tracing::info!(stage = %Stage::Completed, "payment link created");
        Ok(output)
    }

    pub async fn get_payment_link(&self, id: &str) -> Result<PaymentLink, PipelineError> {
        let id = TransactionId::new(id)?;
        self.store.get_by_transaction_id(&id).await
    }

    /// Page data for the redirect URL. `sid`/`ptid` must match the stored
    /// session; a pending link past its window is marked `EXPIRED` on read.
    pub async fn open_payment_page(
        &self,
        id: &str,
        session_id: Option<&str>,
        payment_token_id: Option<&str>,
    ) -> Result<PaymentPage, PipelineError> {
        let mut link = self.get_payment_link(id).await?;

        let mismatch = |given: Option<&str>, stored: &str| given.is_some_and(|g| g != stored);
        if mismatch(session_id, &link.session_id)
            || mismatch(payment_token_id, &link.payment_token_id)
        {
            return Err(PipelineError::NotFound(format!(
                "payment link {} for this session",
                link.transaction_id
            )));
        }

        let window = self.expiry_window();
        if link.is_past_expiry(self.clock.now(), window) {
            self.store
                .update_status(&link.transaction_id, LinkStatus::Expired)
                .await?;
            tracing::info!(transaction_id = %link.transaction_id, "payment link expired");
            link.status = LinkStatus::Expired;
        }

        Ok(PaymentPage::new(link, window))
    }

    fn expiry_window(&self) -> Duration {
        Duration::minutes(i64::from(self.settings.default_expiry_minutes))
    }

    fn announce(&self, output: &CreateLinkOutput) {
        let event = PaymentCreatedEvent {
            timestamp: self.clock.now(),
            transaction_id: output.transaction_id.clone(),
            message: "payment link created".into(),
            payload: PaymentCreatedPayload {
                session_id: output.session_id.clone(),
                payment_token_id: output.payment_token_id.clone(),
                amount: output.amount.clone(),
                currency: output.currency.clone(),
                payment_url: output.payment_url.clone(),
            },
        };
        let publisher = Arc::clone(&self.publisher);

        tokio::spawn(async move {
            if let Err(e) = publisher.publish(&event).await {
                tracing::warn!(
                    transaction_id = %event.transaction_id,
                    event = event.name(),
                    error = %e,
                    "failed to publish event"
                );
            }
        });
    }
}

impl JobHandler for LinkService {
    fn handle(
        &self,
        payload: JobPayload,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, PipelineError>> + Send + '_>> {
        Box::pin(async move {
            match payload {
                JobPayload::CreatePaymentLink { input, context } => {
                    let output = self.create_payment_link(input, &context).await?;
                    Ok(serde_json::to_value(output)?)
                }
            }
        })
    }
}
