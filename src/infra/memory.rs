use {
    crate::domain::audit::ApiCall,
    crate::domain::error::PipelineError,
    crate::domain::id::TransactionId,
    crate::domain::payment::PaymentRecord,
    crate::domain::payment_link::{LinkStatus, PaymentLink},
    crate::domain::store::{ApiCallStore, PaymentLinkStore},
    std::collections::HashMap,
    std::sync::Arc,
    std::{future::Future, pin::Pin},
    tokio::sync::RwLock,
};

/// Process-local link storage. Backs tests and runs without `DATABASE_URL`.
///
/// Uniqueness on transaction id is enforced under the write lock, so concurrent
/// creates behave like the database constraint.
#[derive(Default, Clone)]
pub struct InMemoryLinkStore {
    links: Arc<RwLock<HashMap<TransactionId, PaymentLink>>>,
    payments: Arc<RwLock<HashMap<String, PaymentRecord>>>,
}

impl InMemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn link_count(&self) -> usize {
        self.links.read().await.len()
    }

    pub async fn payments(&self) -> Vec<PaymentRecord> {
        self.payments.read().await.values().cloned().collect()
    }
}

impl PaymentLinkStore for InMemoryLinkStore {
    fn create<'a>(
        &'a self,
        link: &'a PaymentLink,
    ) -> Pin<Box<dyn Future<Output = Result<(), PipelineError>> + Send + 'a>> {
        Box::pin(async move {
            let mut links = self.links.write().await;
            if links.contains_key(&link.transaction_id) {
                return Err(PipelineError::Conflict(format!(
                    "payment link {} already exists",
                    link.transaction_id
                )));
            }
            links.insert(link.transaction_id.clone(), link.clone());
            Ok(())
        })
    }

    fn get_by_transaction_id<'a>(
        &'a self,
        id: &'a TransactionId,
    ) -> Pin<Box<dyn Future<Output = Result<PaymentLink, PipelineError>> + Send + 'a>> {
        Box::pin(async move {
            self.links
                .read()
                .await
                .get(id)
                .cloned()
                .ok_or_else(|| PipelineError::NotFound(format!("payment link {id}")))
        })
    }

    fn update_status<'a>(
        &'a self,
        id: &'a TransactionId,
        status: LinkStatus,
    ) -> Pin<Box<dyn Future<Output = Result<(), PipelineError>> + Send + 'a>> {
        Box::pin(async move {
            let mut links = self.links.write().await;
            let link = links
                .get_mut(id)
                .ok_or_else(|| PipelineError::NotFound(format!("payment link {id}")))?;
            link.status = status;
            link.updated_at = chrono::Utc::now();
            Ok(())
        })
    }

    fn mirror_payment<'a>(
        &'a self,
        record: &'a PaymentRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), PipelineError>> + Send + 'a>> {
        Box::pin(async move {
            let mut payments = self.payments.write().await;
            if payments.contains_key(&record.reference_id) {
                return Err(PipelineError::Conflict(format!(
                    "payment {} already exists",
                    record.reference_id
                )));
            }
            payments.insert(record.reference_id.clone(), record.clone());
            Ok(())
        })
    }
}

#[derive(Default, Clone)]
pub struct InMemoryApiCallStore {
    calls: Arc<RwLock<Vec<ApiCall>>>,
}

impl InMemoryApiCallStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn calls(&self) -> Vec<ApiCall> {
        self.calls.read().await.clone()
    }
}

impl ApiCallStore for InMemoryApiCallStore {
    fn insert<'a>(
        &'a self,
        call: &'a ApiCall,
    ) -> Pin<Box<dyn Future<Output = Result<(), PipelineError>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.write().await.push(call.clone());
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Amount;
    use chrono::Utc;

    fn link(id: &str) -> PaymentLink {
        let now = Utc::now();
        PaymentLink {
            id: id.into(),
            transaction_id: TransactionId::new(id).unwrap(),
            merchant_id: "M1".into(),
            session_id: "S1".into(),
            payment_token_id: "P1".into(),
            description: String::new(),
            amount: Amount::parse_lenient("1.50"),
            currency: "USD".into(),
            invoice_id: id.into(),
            status: LinkStatus::Pending,
            expiry_time: 60,
            created_at: now,
            updated_at: now,
            purchase_amount: 1.5,
            purchase_date: 0,
            quantity: 1,
            confirm_date: 0,
            purchase_type: 0,
            save_token: 0,
            fee_amount: 0.0,
            tx_direction: 0,
            return_url: "https://a".into(),
            error_url: "https://b".into(),
            request_json: String::new(),
            response_json: String::new(),
        }
    }

    #[tokio::test]
    async fn create_then_get() {
        let store = InMemoryLinkStore::new();
        let stored = link("ACL-1");
        store.create(&stored).await.unwrap();

        let found = store
            .get_by_transaction_id(&stored.transaction_id)
            .await
            .unwrap();
        assert_eq!(found, stored);
    }

    #[tokio::test]
    async fn duplicate_create_is_conflict() {
        let store = InMemoryLinkStore::new();
        store.create(&link("ACL-2")).await.unwrap();
        let err = store.create(&link("ACL-2")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Conflict(_)));
        assert_eq!(store.link_count().await, 1);
    }

    #[tokio::test]
    async fn missing_link_is_not_found() {
        let store = InMemoryLinkStore::new();
        let id = TransactionId::new("ACL-404").unwrap();
        assert!(matches!(
            store.get_by_transaction_id(&id).await,
            Err(PipelineError::NotFound(_))
        ));
        assert!(matches!(
            store.update_status(&id, LinkStatus::Expired).await,
            Err(PipelineError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_status_is_idempotent() {
        let store = InMemoryLinkStore::new();
        store.create(&link("ACL-3")).await.unwrap();
        let id = TransactionId::new("ACL-3").unwrap();

        store.update_status(&id, LinkStatus::Success).await.unwrap();
        store.update_status(&id, LinkStatus::Success).await.unwrap();

        let found = store.get_by_transaction_id(&id).await.unwrap();
        assert_eq!(found.status, LinkStatus::Success);
        assert_eq!(found.session_id, "S1");
    }
}
