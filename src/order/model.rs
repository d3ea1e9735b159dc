//! Order domain model — a persisted, grouped set of classified items tied
//! to one inbound utterance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classify::ClassifiedItem;

/// Audio reference recorded for orders that arrived as plain text.
pub const TEXT_INPUT_REF: &str = "text_input";

/// Order lifecycle status. Only `Pending` is set by the pipeline; the
/// terminal states come from admin action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "delivered" => Some(Self::Delivered),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One category bucket within an order, in first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub category: String,
    pub items: Vec<ClassifiedItem>,
}

/// A grocery order built from one inbound utterance.
///
/// Item and category counts are always derived from `groups`, never
/// hand-set. The notified list only grows, and only during dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    /// Originating customer identity.
    pub customer: String,
    pub customer_name: String,
    /// Raw utterance text (transcribed for voice input).
    pub utterance: String,
    /// Items grouped by category, preserving first-seen category order.
    pub groups: Vec<CategoryGroup>,
    /// Cached audio path, or [`TEXT_INPUT_REF`] for text orders.
    pub audio_ref: String,
    pub status: OrderStatus,
    /// Recipient identities the dispatcher attempted to notify.
    pub notified: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Build a pending order from classified items.
    pub fn new(
        customer: impl Into<String>,
        customer_name: impl Into<String>,
        utterance: impl Into<String>,
        items: Vec<ClassifiedItem>,
        audio_ref: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer: customer.into(),
            customer_name: customer_name.into(),
            utterance: utterance.into(),
            groups: group_by_category(items),
            audio_ref: audio_ref.into(),
            status: OrderStatus::Pending,
            notified: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Total item count across all category groups.
    pub fn total_items(&self) -> usize {
        self.groups.iter().map(|g| g.items.len()).sum()
    }

    /// Number of distinct categories.
    pub fn total_categories(&self) -> usize {
        self.groups.len()
    }

    /// Per-category item counts, in group order.
    pub fn category_breakdown(&self) -> Vec<(&str, usize)> {
        self.groups
            .iter()
            .map(|g| (g.category.as_str(), g.items.len()))
            .collect()
    }
}

/// Group items by category name, preserving the first-seen order of
/// categories. Deterministic for a given item sequence.
pub fn group_by_category(items: Vec<ClassifiedItem>) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    for item in items {
        if let Some(idx) = groups
            .iter()
            .position(|g| g.category == item.category_name)
        {
            groups[idx].items.push(item);
        } else {
            groups.push(CategoryGroup {
                category: item.category_name.clone(),
                items: vec![item],
            });
        }
    }
    groups
}
