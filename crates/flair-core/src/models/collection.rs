use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::profile::ProfileId;

/// Unique identifier for a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionId(pub Uuid);

impl CollectionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl Default for CollectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CollectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CollectionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| format!("invalid collection id: {s}"))
    }
}

pub const DEFAULT_COLOR: &str = "#6B7280";

/// Starter collections created the first time a profile lists none.
pub const DEFAULT_COLLECTIONS: &[(&str, &str)] = &[
    ("Favorites", "#F59E0B"),
    ("Wishlist", "#EC4899"),
    ("Outfit Ideas", "#8B5CF6"),
    ("Gift Ideas", "#10B981"),
    ("Inspiration", "#3B82F6"),
];

/// A named, ordered grouping of saved products owned by one profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: CollectionId,
    pub profile_id: ProfileId,
    pub name: String,
    pub color: String,
    pub description: Option<String>,
    pub custom_banner: Option<String>,
    /// Product ids in the order they were added.
    pub item_ids: Vec<String>,
    pub item_count: usize,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

impl Collection {
    pub fn new(profile_id: ProfileId, name: String, color: String) -> Self {
        Self {
            id: CollectionId::new(),
            profile_id,
            name,
            color,
            description: None,
            custom_banner: None,
            item_ids: Vec::new(),
            item_count: 0,
            is_public: true,
            created_at: Utc::now(),
        }
    }

    /// The five starter collections for a profile.
    pub fn defaults_for(profile_id: &ProfileId) -> Vec<Self> {
        DEFAULT_COLLECTIONS
            .iter()
            .map(|(name, color)| Self::new(profile_id.clone(), name.to_string(), color.to_string()))
            .collect()
    }

    /// A collection gets a community post while it is public and has items.
    pub fn is_postable(&self) -> bool {
        self.is_public && !self.item_ids.is_empty()
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.item_ids.iter().any(|id| id == product_id)
    }
}

/// Input for creating a collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCollection {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub custom_banner: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    /// Saved products to place in the collection right away.
    #[serde(default)]
    pub item_ids: Vec<String>,
}

impl NewCollection {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Partial update for a collection. `None` leaves the field untouched.
///
/// `description` and `custom_banner` are nullable: `Some(None)` (a JSON
/// `null`) clears the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub custom_banner: Option<Option<String>>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

/// A present field becomes `Some`, even when it is `null`.
fn nullable<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl CollectionPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.color.is_none()
            && self.description.is_none()
            && self.custom_banner.is_none()
            && self.is_public.is_none()
    }

    pub fn apply(&self, collection: &mut Collection) {
        if let Some(ref name) = self.name {
            collection.name = name.trim().to_string();
        }
        if let Some(color) = self.color.as_deref() {
            collection.color = normalize_color(Some(color));
        }
        if let Some(ref description) = self.description {
            collection.description = description.clone();
        }
        if let Some(ref banner) = self.custom_banner {
            collection.custom_banner = banner.clone();
        }
        if let Some(is_public) = self.is_public {
            collection.is_public = is_public;
        }
    }
}

/// Trimmed color tag, falling back to the neutral default.
pub fn normalize_color(color: Option<&str>) -> String {
    match color.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => DEFAULT_COLOR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_have_distinct_colors() {
        let profile = ProfileId::new();
        let defaults = Collection::defaults_for(&profile);
        assert_eq!(defaults.len(), 5);
        let mut colors: Vec<_> = defaults.iter().map(|c| c.color.clone()).collect();
        colors.sort();
        colors.dedup();
        assert_eq!(colors.len(), 5);
        assert!(defaults.iter().all(|c| c.is_public && c.item_ids.is_empty()));
    }

    #[test]
    fn test_postable_requires_public_and_items() {
        let mut col = Collection::new(ProfileId::new(), "Wishlist".into(), DEFAULT_COLOR.into());
        assert!(!col.is_postable());
        col.item_ids.push("sku-1".into());
        assert!(col.is_postable());
        col.is_public = false;
        assert!(!col.is_postable());
    }

    #[test]
    fn test_patch_trims_and_keeps_omitted() {
        let mut col = Collection::new(ProfileId::new(), "Old".into(), "#000000".into());
        col.description = Some("keep me".into());
        let patch = CollectionPatch {
            name: Some("  New  ".into()),
            color: Some("   ".into()),
            ..Default::default()
        };
        patch.apply(&mut col);
        assert_eq!(col.name, "New");
        assert_eq!(col.color, DEFAULT_COLOR);
        assert_eq!(col.description.as_deref(), Some("keep me"));
    }

    #[test]
    fn test_patch_null_clears_missing_keeps() {
        let mut col = Collection::new(ProfileId::new(), "Trips".into(), DEFAULT_COLOR.into());
        col.description = Some("summer".into());
        col.custom_banner = Some("https://img.example/b.png".into());

        let patch: CollectionPatch =
            serde_json::from_value(serde_json::json!({"description": null})).unwrap();
        assert_eq!(patch.description, Some(None));
        assert!(patch.custom_banner.is_none());
        assert!(!patch.is_empty());
        patch.apply(&mut col);
        assert!(col.description.is_none());
        assert_eq!(col.custom_banner.as_deref(), Some("https://img.example/b.png"));

        let patch: CollectionPatch =
            serde_json::from_value(serde_json::json!({"customBanner": "https://img.example/c.png"}))
                .unwrap();
        patch.apply(&mut col);
        assert_eq!(col.custom_banner.as_deref(), Some("https://img.example/c.png"));
    }

    #[test]
    fn test_wire_names() {
        let mut col = Collection::new(ProfileId::new(), "Wishlist".into(), DEFAULT_COLOR.into());
        col.custom_banner = Some("https://img.example/banner.png".into());
        let json = serde_json::to_value(&col).unwrap();
        for key in ["itemIds", "itemCount", "customBanner", "isPublic", "profileId", "createdAt"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }
}
