use {
    super::audit::ApiCall,
    super::error::PipelineError,
    super::id::TransactionId,
    super::payment::PaymentRecord,
    super::payment_link::{LinkStatus, PaymentLink},
    std::{future::Future, pin::Pin},
};

type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, PipelineError>> + Send + 'a>>;

/// Payment link persistence. Implementations return `Conflict` for a
/// duplicate transaction id and `NotFound` for unknown ones.
pub trait PaymentLinkStore: Send + Sync {
    fn create<'a>(&'a self, link: &'a PaymentLink) -> StoreFuture<'a, ()>;

    fn get_by_transaction_id<'a>(&'a self, id: &'a TransactionId) -> StoreFuture<'a, PaymentLink>;

    /// Idempotent single-column update.
    fn update_status<'a>(
        &'a self,
        id: &'a TransactionId,
        status: LinkStatus,
    ) -> StoreFuture<'a, ()>;

    /// Secondary copy into the generic payments table.
    fn mirror_payment<'a>(&'a self, record: &'a PaymentRecord) -> StoreFuture<'a, ()>;
}

pub trait ApiCallStore: Send + Sync {
    fn insert<'a>(&'a self, call: &'a ApiCall) -> StoreFuture<'a, ()>;
}
