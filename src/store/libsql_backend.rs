//! libSQL backend — async `Store` implementation over a local database.
//!
//! Profiles and orders are stored as JSON documents with a few denormalized
//! columns (role, status, customer, timestamps) for querying. Supports local
//! file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::info;
use uuid::Uuid;

use crate::error::StoreError;
use crate::order::{Order, OrderStatus};
use crate::store::migrations;
use crate::store::traits::{ActivityStatus, Profile, Role, Store};

/// libSQL store backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Connection(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to open database: {e}")))?;
        let conn = db
            .connect()
            .map_err(|e| StoreError::Connection(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(&backend.conn).await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                StoreError::Connection(format!("Failed to create in-memory database: {e}"))
            })?;
        let conn = db
            .connect()
            .map_err(|e| StoreError::Connection(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(&backend.conn).await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    async fn query_profiles(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Profile>, StoreError> {
        let mut rows = self
            .conn()
            .query(sql, params)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let mut profiles = Vec::new();
        while let Some(row) = rows.next().await.map_err(|e| StoreError::Query(e.to_string()))? {
            let doc: String = row.get(0).map_err(|e| StoreError::Query(e.to_string()))?;
            profiles.push(serde_json::from_str(&doc)?);
        }
        Ok(profiles)
    }

    async fn query_orders(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Order>, StoreError> {
        let mut rows = self
            .conn()
            .query(sql, params)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let mut orders = Vec::new();
        while let Some(row) = rows.next().await.map_err(|e| StoreError::Query(e.to_string()))? {
            let doc: String = row.get(0).map_err(|e| StoreError::Query(e.to_string()))?;
            orders.push(serde_json::from_str(&doc)?);
        }
        Ok(orders)
    }
}

fn status_to_str(status: ActivityStatus) -> &'static str {
    match status {
        ActivityStatus::Active => "active",
        ActivityStatus::Inactive => "inactive",
    }
}

#[async_trait]
impl Store for LibSqlBackend {
    async fn find_profile(
        &self,
        role: Role,
        identity: &str,
    ) -> Result<Option<Profile>, StoreError> {
        let profiles = self
            .query_profiles(
                "SELECT doc FROM profiles WHERE role = ?1 AND identity = ?2",
                params![role.to_string(), identity],
            )
            .await?;
        Ok(profiles.into_iter().next())
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        // Preserve the original creation timestamp on re-onboarding.
        let mut doc = profile.clone();
        if let Some(existing) = self.find_profile(profile.role, &profile.identity).await? {
            doc.created_at = existing.created_at;
        }

        let json = serde_json::to_string(&doc)?;
        self.conn()
            .execute(
                "INSERT INTO profiles (role, identity, status, doc, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (role, identity) DO UPDATE SET
                     status = excluded.status,
                     doc = excluded.doc,
                     updated_at = excluded.updated_at",
                params![
                    doc.role.to_string(),
                    doc.identity.as_str(),
                    status_to_str(doc.status),
                    json,
                    doc.created_at.to_rfc3339(),
                    doc.updated_at.to_rfc3339()
                ],
            )
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    async fn list_profiles(&self, role: Role) -> Result<Vec<Profile>, StoreError> {
        self.query_profiles(
            "SELECT doc FROM profiles WHERE role = ?1 ORDER BY identity",
            params![role.to_string()],
        )
        .await
    }

    async fn active_shopkeepers(&self) -> Result<Vec<Profile>, StoreError> {
        self.query_profiles(
            "SELECT doc FROM profiles
             WHERE role = 'shopkeeper' AND status = 'active'
             ORDER BY identity",
            (),
        )
        .await
    }

    async fn delete_profile(&self, role: Role, identity: &str) -> Result<bool, StoreError> {
        let affected = self
            .conn()
            .execute(
                "DELETE FROM profiles WHERE role = ?1 AND identity = ?2",
                params![role.to_string(), identity],
            )
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(affected > 0)
    }

    async fn increment_order_count(&self, identity: &str) -> Result<(), StoreError> {
        let mut profile = self
            .find_profile(Role::Customer, identity)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                collection: Role::Customer.collection().to_string(),
                key: identity.to_string(),
            })?;
        profile.total_orders += 1;
        profile.last_interaction = Some(chrono::Utc::now());
        self.upsert_profile(&profile).await
    }

    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        let json = serde_json::to_string(order)?;
        self.conn()
            .execute(
                "INSERT INTO orders (id, customer, status, doc, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    order.id.to_string(),
                    order.customer.as_str(),
                    order.status.as_str(),
                    json,
                    order.created_at.to_rfc3339()
                ],
            )
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let orders = self
            .query_orders(
                "SELECT doc FROM orders WHERE id = ?1",
                params![id.to_string()],
            )
            .await?;
        Ok(orders.into_iter().next())
    }

    async fn set_notified(&self, id: Uuid, recipients: &[String]) -> Result<(), StoreError> {
        let mut order = self.get_order(id).await?.ok_or_else(|| StoreError::NotFound {
            collection: "orders".to_string(),
            key: id.to_string(),
        })?;
        order.notified = recipients.to_vec();

        let json = serde_json::to_string(&order)?;
        self.conn()
            .execute(
                "UPDATE orders SET doc = ?1 WHERE id = ?2",
                params![json, id.to_string()],
            )
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        for recipient in recipients {
            self.conn()
                .execute(
                    "INSERT OR IGNORE INTO order_recipients (order_id, recipient)
                     VALUES (?1, ?2)",
                    params![id.to_string(), recipient.as_str()],
                )
                .await
                .map_err(|e| StoreError::Query(e.to_string()))?;
        }
        Ok(())
    }

    async fn list_orders(&self, limit: usize) -> Result<Vec<Order>, StoreError> {
        self.query_orders(
            "SELECT doc FROM orders ORDER BY created_at DESC LIMIT ?1",
            params![limit as i64],
        )
        .await
    }

    async fn orders_for_customer(&self, identity: &str) -> Result<Vec<Order>, StoreError> {
        self.query_orders(
            "SELECT doc FROM orders WHERE customer = ?1 ORDER BY created_at DESC",
            params![identity],
        )
        .await
    }

    async fn orders_for_recipient(&self, identity: &str) -> Result<Vec<Order>, StoreError> {
        self.query_orders(
            "SELECT o.doc FROM orders o
             JOIN order_recipients r ON r.order_id = o.id
             WHERE r.recipient = ?1
             ORDER BY o.created_at DESC",
            params![identity],
        )
        .await
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<bool, StoreError> {
        let Some(mut order) = self.get_order(id).await? else {
            return Ok(false);
        };
        order.status = status;
        let json = serde_json::to_string(&order)?;
        self.conn()
            .execute(
                "UPDATE orders SET status = ?1, doc = ?2 WHERE id = ?3",
                params![status.as_str(), json, id.to_string()],
            )
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(true)
    }

    async fn delete_order(&self, id: Uuid) -> Result<bool, StoreError> {
        self.conn()
            .execute(
                "DELETE FROM order_recipients WHERE order_id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let affected = self
            .conn()
            .execute("DELETE FROM orders WHERE id = ?1", params![id.to_string()])
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ClassifiedItem;
    use crate::order::TEXT_INPUT_REF;

    fn item(name: &str, category: &str) -> ClassifiedItem {
        ClassifiedItem {
            name: name.into(),
            quantity: "1".into(),
            category_name: category.into(),
            category_number: 1,
        }
    }

    #[tokio::test]
    async fn profile_roundtrip() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        let mut profile = Profile::new("whatsapp:+911234", Role::Shopkeeper, "Ravi");
        profile.shop_name = Some("Ravi Stores".into());
        profile.location = Some("Lat: 12.97, Lon: 77.59".into());
        store.upsert_profile(&profile).await.unwrap();

        let found = store
            .find_profile(Role::Shopkeeper, "whatsapp:+911234")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.name, "Ravi");
        assert_eq!(found.shop_name.as_deref(), Some("Ravi Stores"));
        assert!(store
            .find_profile(Role::Customer, "whatsapp:+911234")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn upsert_preserves_created_at() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        let mut profile = Profile::new("whatsapp:+911234", Role::Customer, "Asha");
        store.upsert_profile(&profile).await.unwrap();
        let original = store
            .find_profile(Role::Customer, "whatsapp:+911234")
            .await
            .unwrap()
            .unwrap();

        profile.name = "Asha D".into();
        profile.created_at = chrono::Utc::now() + chrono::Duration::days(7);
        store.upsert_profile(&profile).await.unwrap();

        let updated = store
            .find_profile(Role::Customer, "whatsapp:+911234")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Asha D");
        assert_eq!(updated.created_at, original.created_at);
    }

    #[tokio::test]
    async fn order_roundtrip_and_recipient_query() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        let order = Order::new(
            "whatsapp:+c",
            "Asha",
            "2kg rice",
            vec![item("rice", "Consumables / Perishables")],
            TEXT_INPUT_REF,
        );
        store.insert_order(&order).await.unwrap();

        store
            .set_notified(
                order.id,
                &["whatsapp:+s1".to_string(), "whatsapp:+s2".to_string()],
            )
            .await
            .unwrap();

        let found = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(found.notified.len(), 2);
        assert_eq!(found.total_items(), 1);

        let for_s1 = store.orders_for_recipient("whatsapp:+s1").await.unwrap();
        assert_eq!(for_s1.len(), 1);
        assert_eq!(for_s1[0].id, order.id);
        assert!(store
            .orders_for_recipient("whatsapp:+s9")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn status_update_and_delete() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        let order = Order::new(
            "whatsapp:+c",
            "Asha",
            "rice",
            vec![item("rice", "Consumables / Perishables")],
            TEXT_INPUT_REF,
        );
        store.insert_order(&order).await.unwrap();

        assert!(store
            .update_order_status(order.id, OrderStatus::Confirmed)
            .await
            .unwrap());
        assert_eq!(
            store.get_order(order.id).await.unwrap().unwrap().status,
            OrderStatus::Confirmed
        );

        assert!(store.delete_order(order.id).await.unwrap());
        assert!(!store.delete_order(order.id).await.unwrap());
        assert!(store.get_order(order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_orders_newest_first() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        for name in ["first", "second", "third"] {
            let mut order = Order::new(
                "whatsapp:+c",
                "Asha",
                name,
                vec![item(name, "Consumables / Perishables")],
                TEXT_INPUT_REF,
            );
            // Space creation times out so ordering is unambiguous.
            order.created_at = chrono::Utc::now()
                + chrono::Duration::seconds(match name {
                    "first" => 0,
                    "second" => 1,
                    _ => 2,
                });
            store.insert_order(&order).await.unwrap();
        }
        let orders = store.list_orders(2).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].utterance, "third");
        assert_eq!(orders[1].utterance, "second");
    }

    #[tokio::test]
    async fn opens_database_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kirana.db");
        let store = LibSqlBackend::new_local(&path).await.unwrap();
        store
            .upsert_profile(&Profile::new("whatsapp:+1", Role::Customer, "A"))
            .await
            .unwrap();
        assert!(path.exists());
    }
}
