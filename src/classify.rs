//! Text classification collaborator — extracts grocery lines from free text.
//!
//! The classifier is an external engine reached over HTTP. This module owns
//! the wire types, the fixed category table, and the `Classifier` seam the
//! order builder is written against.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClassificationError;

/// One extracted grocery line. Immutable once produced by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedItem {
    /// Item name, e.g. "rice".
    pub name: String,
    /// Free-form quantity, e.g. "2kg" or "1 dozen".
    pub quantity: String,
    /// Category name. Usually one of [`CATEGORIES`], but anything the
    /// classifier emits is accepted.
    pub category_name: String,
    /// Category number as assigned by the classifier.
    pub category_number: u32,
}

/// The closed category set the classifier is trained on, with display emojis.
///
/// Categories outside this set still flow through the pipeline and render
/// with the generic fallback marker.
pub const CATEGORIES: &[(&str, &str)] = &[
    ("Consumables / Perishables", "🛒"),
    ("Tools & Equipment", "🔧"),
    ("Hardware / Components", "⚙️"),
    ("Documentation / Media", "📚"),
    ("Apparel / Textiles", "👕"),
    ("Office & Stationery", "📝"),
    ("Safety & Emergency", "🆘"),
    ("Seasonal / Occasional", "🎉"),
    ("Chemicals / Hazardous", "☠️"),
    ("Electronics / Gadgets", "🔌"),
];

/// Fallback marker for categories outside the fixed set.
pub const FALLBACK_EMOJI: &str = "📦";

/// Emoji for a category name, falling back to the generic marker.
pub fn category_emoji(category: &str) -> &'static str {
    CATEGORIES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, emoji)| *emoji)
        .unwrap_or(FALLBACK_EMOJI)
}

/// Classification seam — pure request/response, no business logic.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Extract grocery lines from raw utterance text.
    async fn classify(&self, text: &str) -> Result<Vec<ClassifiedItem>, ClassificationError>;
}

// ── HTTP implementation ─────────────────────────────────────────────

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct ClassifyResponse {
    items: Vec<ClassifiedItem>,
}

/// Classifier backed by an HTTP classification service.
///
/// POSTs `{"text": …}` to `{base_url}/classify` and decodes
/// `{"items": [{name, quantity, category_name, category_number}]}`.
pub struct HttpClassifier {
    base_url: String,
    client: reqwest::Client,
}

impl HttpClassifier {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, text: &str) -> Result<Vec<ClassifiedItem>, ClassificationError> {
        let resp = self
            .client
            .post(format!("{}/classify", self.base_url))
            .json(&ClassifyRequest { text })
            .send()
            .await
            .map_err(|e| ClassificationError::RequestFailed(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClassificationError::RequestFailed(format!(
                "classifier returned {status}: {body}"
            )));
        }

        let parsed: ClassifyResponse = resp
            .json()
            .await
            .map_err(|e| ClassificationError::InvalidResponse(e.to_string()))?;

        if parsed.items.is_empty() {
            return Err(ClassificationError::NoItems);
        }
        Ok(parsed.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_categories_have_emojis() {
        for (name, emoji) in CATEGORIES {
            assert_eq!(category_emoji(name), *emoji);
        }
    }

    #[test]
    fn unknown_category_gets_fallback() {
        assert_eq!(category_emoji("Livestock / Feed"), FALLBACK_EMOJI);
        assert_eq!(category_emoji(""), FALLBACK_EMOJI);
    }

    #[test]
    fn category_set_is_closed_at_ten() {
        assert_eq!(CATEGORIES.len(), 10);
    }

    #[test]
    fn item_deserializes_from_classifier_wire_format() {
        let raw = r#"{"name": "rice", "quantity": "2kg", "category_name": "Consumables / Perishables", "category_number": 1}"#;
        let item: ClassifiedItem = serde_json::from_str(raw).unwrap();
        assert_eq!(item.name, "rice");
        assert_eq!(item.quantity, "2kg");
        assert_eq!(item.category_name, "Consumables / Perishables");
        assert_eq!(item.category_number, 1);
    }
}
