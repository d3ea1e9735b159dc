//! In-memory `Store` backend — used by tests and local development.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::order::{Order, OrderStatus};
use crate::store::traits::{Profile, Role, Store};

#[derive(Default)]
struct Inner {
    profiles: HashMap<(Role, String), Profile>,
    orders: HashMap<Uuid, Order>,
}

/// Map-backed store. Cheap to clone; clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_profile(
        &self,
        role: Role,
        identity: &str,
    ) -> Result<Option<Profile>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.profiles.get(&(role, identity.to_string())).cloned())
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let key = (profile.role, profile.identity.clone());
        let mut doc = profile.clone();
        if let Some(existing) = inner.profiles.get(&key) {
            doc.created_at = existing.created_at;
        }
        inner.profiles.insert(key, doc);
        Ok(())
    }

    async fn list_profiles(&self, role: Role) -> Result<Vec<Profile>, StoreError> {
        let inner = self.inner.read().await;
        let mut profiles: Vec<Profile> = inner
            .profiles
            .values()
            .filter(|p| p.role == role)
            .cloned()
            .collect();
        profiles.sort_by(|a, b| a.identity.cmp(&b.identity));
        Ok(profiles)
    }

    async fn active_shopkeepers(&self) -> Result<Vec<Profile>, StoreError> {
        let all = self.list_profiles(Role::Shopkeeper).await?;
        Ok(all.into_iter().filter(|p| p.is_active()).collect())
    }

    async fn delete_profile(&self, role: Role, identity: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .profiles
            .remove(&(role, identity.to_string()))
            .is_some())
    }

    async fn increment_order_count(&self, identity: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let key = (Role::Customer, identity.to_string());
        let profile = inner.profiles.get_mut(&key).ok_or(StoreError::NotFound {
            collection: Role::Customer.collection().to_string(),
            key: identity.to_string(),
        })?;
        profile.total_orders += 1;
        profile.last_interaction = Some(Utc::now());
        Ok(())
    }

    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.orders.get(&id).cloned())
    }

    async fn set_notified(&self, id: Uuid, recipients: &[String]) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let order = inner.orders.get_mut(&id).ok_or(StoreError::NotFound {
            collection: "orders".to_string(),
            key: id.to_string(),
        })?;
        order.notified = recipients.to_vec();
        Ok(())
    }

    async fn list_orders(&self, limit: usize) -> Result<Vec<Order>, StoreError> {
        let inner = self.inner.read().await;
        let mut orders = newest_first(inner.orders.values().cloned().collect());
        orders.truncate(limit);
        Ok(orders)
    }

    async fn orders_for_customer(&self, identity: &str) -> Result<Vec<Order>, StoreError> {
        let inner = self.inner.read().await;
        Ok(newest_first(
            inner
                .orders
                .values()
                .filter(|o| o.customer == identity)
                .cloned()
                .collect(),
        ))
    }

    async fn orders_for_recipient(&self, identity: &str) -> Result<Vec<Order>, StoreError> {
        let inner = self.inner.read().await;
        Ok(newest_first(
            inner
                .orders
                .values()
                .filter(|o| o.notified.iter().any(|r| r == identity))
                .cloned()
                .collect(),
        ))
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.orders.get_mut(&id) {
            Some(order) => {
                order.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_order(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.orders.remove(&id).is_some())
    }
}
