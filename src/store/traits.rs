//! Backend-agnostic `Store` trait — document persistence for profiles and
//! orders.
//!
//! Two logical profile collections (one per role) plus orders. Sessions are
//! never persisted; they live in [`crate::session::SessionStore`] only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::order::Order;

/// Participant role, fixed at onboarding completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Shopkeeper,
}

impl Role {
    /// Collection name for this role.
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Customer => "customers",
            Self::Shopkeeper => "shopkeepers",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Shopkeeper => write!(f, "shopkeeper"),
        }
    }
}

/// Whether a profile participates in matching and notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Active,
    Inactive,
}

/// Persisted record for a completed identity.
///
/// At most one profile per identity per role collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Stable participant key (phone-like string).
    pub identity: String,
    pub role: Role,
    pub name: String,
    /// Shop name; shopkeepers only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_name: Option<String>,
    /// What the shop sells; shopkeepers only, optional.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Display location, e.g. "Lat: 12.97, Lon: 77.59".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub status: ActivityStatus,
    /// Running order count; customers only.
    #[serde(default)]
    pub total_orders: u64,
    /// Channel of the first contact: "voice" or "text". Customers only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_interaction: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_interaction: Option<DateTime<Utc>>,
}

impl Profile {
    /// New active profile with both timestamps set to now.
    pub fn new(identity: impl Into<String>, role: Role, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            identity: identity.into(),
            role,
            name: name.into(),
            shop_name: None,
            description: None,
            location: None,
            latitude: None,
            longitude: None,
            status: ActivityStatus::Active,
            total_orders: 0,
            first_interaction: None,
            created_at: now,
            updated_at: now,
            last_interaction: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ActivityStatus::Active
    }
}

/// Document store over profiles-by-role and orders.
///
/// Upserts are atomic per document; there are no cross-document
/// transactions.
#[async_trait]
pub trait Store: Send + Sync {
    // ── Profiles ────────────────────────────────────────────────────

    /// Find a profile in one role collection.
    async fn find_profile(
        &self,
        role: Role,
        identity: &str,
    ) -> Result<Option<Profile>, StoreError>;

    /// Insert or overwrite a profile, keyed by (role, identity).
    ///
    /// On overwrite the existing document's creation timestamp is
    /// preserved; every other field comes from `profile`.
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StoreError>;

    /// All profiles in one role collection.
    async fn list_profiles(&self, role: Role) -> Result<Vec<Profile>, StoreError>;

    /// Active shopkeeper profiles — the notification recipient pool.
    async fn active_shopkeepers(&self) -> Result<Vec<Profile>, StoreError>;

    /// Delete a profile. Returns whether a document existed.
    async fn delete_profile(&self, role: Role, identity: &str) -> Result<bool, StoreError>;

    /// Bump a customer's running order count and last-interaction time.
    async fn increment_order_count(&self, identity: &str) -> Result<(), StoreError>;

    // ── Orders ──────────────────────────────────────────────────────

    /// Insert a new order.
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError>;

    /// Get an order by id.
    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError>;

    /// Replace an order's notified-recipient list.
    ///
    /// The list only ever grows during dispatch; callers pass the full
    /// resolved recipient set.
    async fn set_notified(&self, id: Uuid, recipients: &[String]) -> Result<(), StoreError>;

    /// Most recent orders, newest first, up to `limit`.
    async fn list_orders(&self, limit: usize) -> Result<Vec<Order>, StoreError>;

    /// Orders placed by one customer identity, newest first.
    async fn orders_for_customer(&self, identity: &str) -> Result<Vec<Order>, StoreError>;

    /// Orders whose notified list contains `identity`, newest first.
    async fn orders_for_recipient(&self, identity: &str) -> Result<Vec<Order>, StoreError>;

    /// Set an order's lifecycle status. Returns whether the order existed.
    async fn update_order_status(
        &self,
        id: Uuid,
        status: crate::order::OrderStatus,
    ) -> Result<bool, StoreError>;

    /// Delete an order. Returns whether it existed.
    async fn delete_order(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_collections() {
        assert_eq!(Role::Customer.collection(), "customers");
        assert_eq!(Role::Shopkeeper.collection(), "shopkeepers");
    }

    #[test]
    fn role_serde_matches_display() {
        for role in [Role::Customer, Role::Shopkeeper] {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{role}\""));
        }
    }

    #[test]
    fn new_profile_is_active_with_zero_orders() {
        let p = Profile::new("whatsapp:+911234", Role::Customer, "Asha");
        assert!(p.is_active());
        assert_eq!(p.total_orders, 0);
        assert_eq!(p.created_at, p.updated_at);
    }

    #[test]
    fn profile_serde_omits_absent_shop_fields() {
        let p = Profile::new("whatsapp:+911234", Role::Customer, "Asha");
        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("shop_name").is_none());
        assert!(json.get("description").is_none());
        assert_eq!(json["status"], "active");
    }
}
