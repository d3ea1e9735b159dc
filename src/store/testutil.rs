//! Test-only store wrapper with switchable failure injection.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::order::{Order, OrderStatus};
use crate::store::traits::{Profile, Role, Store};
use crate::store::MemoryStore;

/// Memory store whose order inserts can be made to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_order_inserts: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_order_inserts(&self, fail: bool) {
        self.fail_order_inserts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn find_profile(
        &self,
        role: Role,
        identity: &str,
    ) -> Result<Option<Profile>, StoreError> {
        self.inner.find_profile(role, identity).await
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        self.inner.upsert_profile(profile).await
    }

    async fn list_profiles(&self, role: Role) -> Result<Vec<Profile>, StoreError> {
        self.inner.list_profiles(role).await
    }

    async fn active_shopkeepers(&self) -> Result<Vec<Profile>, StoreError> {
        self.inner.active_shopkeepers().await
    }

    async fn delete_profile(&self, role: Role, identity: &str) -> Result<bool, StoreError> {
        self.inner.delete_profile(role, identity).await
    }

    async fn increment_order_count(&self, identity: &str) -> Result<(), StoreError> {
        self.inner.increment_order_count(identity).await
    }

    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        if self.fail_order_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Query("injected insert failure".into()));
        }
        self.inner.insert_order(order).await
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        self.inner.get_order(id).await
    }

    async fn set_notified(&self, id: Uuid, recipients: &[String]) -> Result<(), StoreError> {
        self.inner.set_notified(id, recipients).await
    }

    async fn list_orders(&self, limit: usize) -> Result<Vec<Order>, StoreError> {
        self.inner.list_orders(limit).await
    }

    async fn orders_for_customer(&self, identity: &str) -> Result<Vec<Order>, StoreError> {
        self.inner.orders_for_customer(identity).await
    }

    async fn orders_for_recipient(&self, identity: &str) -> Result<Vec<Order>, StoreError> {
        self.inner.orders_for_recipient(identity).await
    }

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> Result<bool, StoreError> {
        self.inner.update_order_status(id, status).await
    }

    async fn delete_order(&self, id: Uuid) -> Result<bool, StoreError> {
        self.inner.delete_order(id).await
    }
}
