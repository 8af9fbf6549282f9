use {
    crate::domain::audit::{ApiCall, CallContext, CallTrace},
    crate::domain::id::TransactionId,
    crate::domain::store::ApiCallStore,
    std::sync::Arc,
    tokio::sync::{mpsc, watch},
};

/// Non-blocking handle for the outbound-call audit trail.
///
/// Records go through a bounded channel; when it is full the record is dropped
/// with a warning, so a slow store never holds up a payment request.
#[derive(Clone)]
pub struct AuditSink {
    tx: mpsc::Sender<ApiCall>,
}

impl AuditSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ApiCall>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    pub fn record(
        &self,
        service: &str,
        trace: CallTrace,
        context: &CallContext,
        transaction_id: &TransactionId,
        error: Option<String>,
    ) {
        let call = ApiCall::new(service, trace, context, transaction_id, error);
        match self.tx.try_send(call) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(call)) => {
                tracing::warn!(
                    transaction_id = %call.transaction_id,
                    url = %call.url,
                    "audit buffer full, dropping api call record"
                );
            }
            Err(mpsc::error::TrySendError::Closed(call)) => {
                tracing::warn!(
                    transaction_id = %call.transaction_id,
                    "audit writer stopped, dropping api call record"
                );
            }
        }
    }
}

/// Drain audit records into the store until shutdown or until every sink is dropped.
pub async fn run_audit_writer(
    mut rx: mpsc::Receiver<ApiCall>,
    store: Arc<dyn ApiCallStore>,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!("audit writer started");

    loop {
        let call = tokio::select! {
            _ = shutdown.changed() => break,
            call = rx.recv() => match call {
                Some(call) => call,
                None => break,
            },
        };
        write(&*store, &call).await;
    }

    // Flush whatever was buffered before the signal.
    rx.close();
    while let Some(call) = rx.recv().await {
        write(&*store, &call).await;
    }

    tracing::info!("audit writer shutting down");
}

async fn write(store: &dyn ApiCallStore, call: &ApiCall) {
    if let Err(e) = store.insert(call).await {
        tracing::warn!(
            transaction_id = %call.transaction_id,
            error = %e,
            "failed to persist api call"
        );
    }
}
