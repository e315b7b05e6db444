use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::collection::{Collection, CollectionId};
use super::profile::ProfileId;

/// Unique identifier for a community post.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostId(pub Uuid);

impl PostId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl Default for PostId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A public post materialized from a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPost {
    pub id: PostId,
    pub profile_id: ProfileId,
    pub collection_id: CollectionId,
    pub title: String,
    pub description: String,
    pub is_public: bool,
    pub likes_count: u32,
    pub comments_count: u32,
    pub views_count: u32,
    pub shares_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommunityPost {
    pub fn for_collection(collection: &Collection) -> Self {
        let now = Utc::now();
        Self {
            id: PostId::new(),
            profile_id: collection.profile_id.clone(),
            collection_id: collection.id.clone(),
            title: post_title(collection),
            description: post_description(collection),
            is_public: true,
            likes_count: 0,
            comments_count: 0,
            views_count: 0,
            shares_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether title or description lag behind the collection.
    pub fn is_stale(&self, collection: &Collection) -> bool {
        self.title != post_title(collection) || self.description != post_description(collection)
    }
}

pub fn post_title(collection: &Collection) -> String {
    format!("✨ {}", collection.name)
}

pub fn post_description(collection: &Collection) -> String {
    match collection.description.as_deref().map(str::trim) {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => {
            let n = collection.item_ids.len();
            let plural = if n == 1 { "" } else { "s" };
            format!("A collection of {n} saved item{plural}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::collection::DEFAULT_COLOR;

    fn wishlist() -> Collection {
        Collection::new(ProfileId::new(), "Wishlist".into(), DEFAULT_COLOR.into())
    }

    #[test]
    fn test_title_and_default_description() {
        let mut col = wishlist();
        col.item_ids = vec!["sku-1".into()];
        let post = CommunityPost::for_collection(&col);
        assert_eq!(post.title, "✨ Wishlist");
        assert_eq!(post.description, "A collection of 1 saved item");
        assert_eq!(post.likes_count + post.views_count, 0);

        col.item_ids.push("sku-2".into());
        assert_eq!(post_description(&col), "A collection of 2 saved items");
        assert!(post.is_stale(&col));
    }

    #[test]
    fn test_explicit_description_wins() {
        let mut col = wishlist();
        col.description = Some("Things I want".into());
        assert_eq!(post_description(&col), "Things I want");
    }
}
