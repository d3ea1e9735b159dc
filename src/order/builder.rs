//! Order builder — classify → group → persist.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::classify::Classifier;
use crate::error::{ClassificationError, StoreError};
use crate::order::Order;
use crate::store::Store;

/// A built order plus whether it was durably stored.
///
/// `stored == false` means persistence failed; the order is still usable
/// for the synchronous reply, but must not be handed to the dispatcher.
#[derive(Debug, Clone)]
pub struct BuiltOrder {
    pub order: Order,
    pub stored: bool,
}

/// Assembles orders from raw utterance text.
///
/// Never initiates onboarding; callers guarantee a completed profile
/// exists for `identity`. Every call creates a new order — identical text
/// twice is two independent order requests.
pub struct OrderBuilder {
    classifier: Arc<dyn Classifier>,
    store: Arc<dyn Store>,
}

impl OrderBuilder {
    pub fn new(classifier: Arc<dyn Classifier>, store: Arc<dyn Store>) -> Self {
        Self { classifier, store }
    }

    /// Classify `utterance`, group the items, and persist the order.
    ///
    /// Classification failure (or zero items) is the only hard failure.
    /// Persistence failure degrades to `stored: false`.
    pub async fn build(
        &self,
        identity: &str,
        customer_name: &str,
        utterance: &str,
        audio_ref: &str,
    ) -> Result<BuiltOrder, ClassificationError> {
        let items = self.classifier.classify(utterance).await?;

        let order = Order::new(identity, customer_name, utterance, items, audio_ref);
        info!(
            order_id = %order.id,
            identity = %identity,
            items = order.total_items(),
            categories = order.total_categories(),
            "Order built"
        );

        let stored = match self.store.insert_order(&order).await {
            Ok(()) => {
                match self.store.increment_order_count(identity).await {
                    Ok(()) => {}
                    // Not a customer (e.g. a shopkeeper sent a voice note) —
                    // there is no count to bump.
                    Err(StoreError::NotFound { .. }) => {
                        debug!(identity = %identity, "No customer profile; order count unchanged");
                    }
                    Err(e) => {
                        warn!(identity = %identity, error = %e, "Failed to bump order count");
                    }
                }
                true
            }
            Err(e) => {
                error!(order_id = %order.id, error = %e, "Failed to store order");
                false
            }
        };

        Ok(BuiltOrder { order, stored })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::classify::ClassifiedItem;
    use crate::store::testutil::FlakyStore;
    use crate::store::{MemoryStore, Profile, Role};

    /// Classifier returning a fixed item list.
    struct FixedClassifier {
        items: Vec<ClassifiedItem>,
    }

    #[async_trait]
    impl Classifier for FixedClassifier {
        async fn classify(&self, _text: &str) -> Result<Vec<ClassifiedItem>, ClassificationError> {
            if self.items.is_empty() {
                return Err(ClassificationError::NoItems);
            }
            Ok(self.items.clone())
        }
    }

    fn rice() -> ClassifiedItem {
        ClassifiedItem {
            name: "rice".into(),
            quantity: "2kg".into(),
            category_name: "Consumables / Perishables".into(),
            category_number: 1,
        }
    }

    const ID: &str = "whatsapp:+911234";

    #[tokio::test]
    async fn build_stores_order_and_bumps_count() {
        let store = MemoryStore::new();
        store
            .upsert_profile(&Profile::new(ID, Role::Customer, "Asha"))
            .await
            .unwrap();
        let builder = OrderBuilder::new(
            Arc::new(FixedClassifier { items: vec![rice()] }),
            Arc::new(store.clone()),
        );

        let built = builder.build(ID, "Asha", "2kg rice", "text_input").await.unwrap();
        assert!(built.stored);
        assert_eq!(built.order.total_items(), 1);
        assert_eq!(built.order.customer_name, "Asha");

        let stored = store.get_order(built.order.id).await.unwrap().unwrap();
        assert_eq!(stored.utterance, "2kg rice");

        let refreshed = store.find_profile(Role::Customer, ID).await.unwrap().unwrap();
        assert_eq!(refreshed.total_orders, 1);
    }

    #[tokio::test]
    async fn classification_failure_propagates() {
        let builder = OrderBuilder::new(
            Arc::new(FixedClassifier { items: vec![] }),
            Arc::new(MemoryStore::new()),
        );

        let err = builder.build(ID, "Asha", "??", "text_input").await.unwrap_err();
        assert!(matches!(err, ClassificationError::NoItems));
    }

    #[tokio::test]
    async fn persistence_failure_degrades_to_unstored() {
        let store = FlakyStore::new();
        store.fail_order_inserts(true);
        let builder = OrderBuilder::new(
            Arc::new(FixedClassifier { items: vec![rice()] }),
            Arc::new(store),
        );

        let built = builder.build(ID, "Asha", "2kg rice", "text_input").await.unwrap();
        assert!(!built.stored);
        assert_eq!(built.order.total_items(), 1);
    }

    #[tokio::test]
    async fn non_customer_identity_still_builds() {
        // A shopkeeper sending an order-like message: no count to bump,
        // but the order itself goes through.
        let store = MemoryStore::new();
        store
            .upsert_profile(&Profile::new(ID, Role::Shopkeeper, "Ravi"))
            .await
            .unwrap();
        let builder = OrderBuilder::new(
            Arc::new(FixedClassifier { items: vec![rice()] }),
            Arc::new(store.clone()),
        );

        let built = builder
            .build(ID, "Unknown Customer", "2kg rice", "voice.ogg")
            .await
            .unwrap();
        assert!(built.stored);
        assert_eq!(built.order.customer_name, "Unknown Customer");
    }

    #[tokio::test]
    async fn identical_text_creates_distinct_orders() {
        let store = MemoryStore::new();
        store
            .upsert_profile(&Profile::new(ID, Role::Customer, "Asha"))
            .await
            .unwrap();
        let builder = OrderBuilder::new(
            Arc::new(FixedClassifier { items: vec![rice()] }),
            Arc::new(store.clone()),
        );

        let a = builder.build(ID, "Asha", "2kg rice", "text_input").await.unwrap();
        let b = builder.build(ID, "Asha", "2kg rice", "text_input").await.unwrap();
        assert_ne!(a.order.id, b.order.id);
        assert_eq!(store.list_orders(10).await.unwrap().len(), 2);
    }
}
