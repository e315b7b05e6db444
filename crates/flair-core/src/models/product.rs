use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::profile::ProfileId;

/// Snapshot of a product as it looked when the profile saved it.
///
/// Fields the client sends beyond the modeled ones are kept in `extra` and
/// written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Product {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price: None,
            currency: None,
            brand: None,
            image: None,
            link: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// A saved-item row: one per (profile, product).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedItem {
    pub profile_id: ProfileId,
    pub product: Product,
    pub saved_at: DateTime<Utc>,
}

impl SavedItem {
    pub fn new(profile_id: ProfileId, product: Product) -> Self {
        Self {
            profile_id,
            product,
            saved_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_fields_survive() {
        let json = serde_json::json!({
            "id": "sku-1",
            "title": "Linen shirt",
            "price": 49.5,
            "originalPrice": 80,
            "sizes": ["S", "M"]
        });
        let product: Product = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(product.price, Some(49.5));
        assert_eq!(product.extra.len(), 2);
        assert_eq!(serde_json::to_value(&product).unwrap(), json);
    }

    #[test]
    fn test_title_defaults_to_empty() {
        let product: Product = serde_json::from_str(r#"{"id":"sku-2"}"#).unwrap();
        assert_eq!(product.title, "");
        assert!(product.brand.is_none());
    }
}
