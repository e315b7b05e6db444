//! Keeps each collection's community post in line with the collection.
//!
//! A (profile, collection) pair is either posted or not. It is posted exactly
//! while the collection is public and holds at least one item. Running the
//! projector again on an unchanged collection does nothing.

use rusqlite::Connection;

use flair_core::models::collection::{Collection, CollectionId};
use flair_core::models::community_post::{post_description, post_title, CommunityPost, PostId};
use flair_core::models::profile::ProfileId;

use crate::{ops, Result};

/// What a projector run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionOutcome {
    Created(PostId),
    /// Title or description were rewritten to match the collection.
    Refreshed(PostId),
    Unchanged(PostId),
    Retracted,
    /// Not postable and nothing to retract.
    Absent,
}

impl ProjectionOutcome {
    pub fn is_posted(&self) -> bool {
        matches!(
            self,
            Self::Created(_) | Self::Refreshed(_) | Self::Unchanged(_)
        )
    }
}

/// Bring the post for `collection` in line with its current state.
pub fn sync_post_for_collection(
    conn: &Connection,
    profile_id: &ProfileId,
    collection: &Collection,
) -> Result<ProjectionOutcome> {
    let existing = ops::get_post_for_collection(conn, profile_id, &collection.id)?;

    if !collection.is_postable() {
        if existing.is_some() {
            retract_post(conn, profile_id, &collection.id)?;
            return Ok(ProjectionOutcome::Retracted);
        }
        return Ok(ProjectionOutcome::Absent);
    }

    match existing {
        Some(post) if post.is_stale(collection) => {
            ops::update_post_content(
                conn,
                &post.id,
                &post_title(collection),
                &post_description(collection),
            )?;
            tracing::debug!(post_id = %post.id, collection_id = %collection.id, "community post refreshed");
            Ok(ProjectionOutcome::Refreshed(post.id))
        }
        Some(post) => Ok(ProjectionOutcome::Unchanged(post.id)),
        None => {
            let post = CommunityPost::for_collection(collection);
            match ops::insert_post(conn, &post) {
                Ok(()) => {
                    tracing::info!(post_id = %post.id, collection_id = %collection.id, "community post created");
                    Ok(ProjectionOutcome::Created(post.id))
                }
                // Another writer projected the same collection first.
                Err(e) if e.is_conflict() => {
                    match ops::get_post_for_collection(conn, profile_id, &collection.id)? {
                        Some(post) => Ok(ProjectionOutcome::Unchanged(post.id)),
                        None => Err(e),
                    }
                }
                Err(e) => Err(e),
            }
        }
    }
}

/// Remove the post for a collection, if any. Used directly before deleting a collection.
pub fn retract_post(
    conn: &Connection,
    profile_id: &ProfileId,
    collection_id: &CollectionId,
) -> Result<bool> {
    let removed = ops::delete_post_for_collection(conn, profile_id, collection_id)?;
    if removed {
        tracing::info!(%collection_id, "community post retracted");
    }
    Ok(removed)
}

/// Re-project a collection by id. Missing collections have no post to keep.
pub fn resync_collection(
    conn: &Connection,
    profile_id: &ProfileId,
    collection_id: &CollectionId,
) -> Result<ProjectionOutcome> {
    match ops::get_collection(conn, profile_id, collection_id)? {
        Some(collection) => sync_post_for_collection(conn, profile_id, &collection),
        None => {
            if retract_post(conn, profile_id, collection_id)? {
                Ok(ProjectionOutcome::Retracted)
            } else {
                Ok(ProjectionOutcome::Absent)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::open_memory_db;
    use flair_core::models::product::{Product, SavedItem};

    fn setup(conn: &Connection) -> (ProfileId, Collection) {
        let p = ops::resolve_profile_id(conn, "ext_projector").unwrap();
        let item = SavedItem::new(p.clone(), Product::new("sku-1", "Bag"));
        ops::insert_saved_item(conn, &item).unwrap();
        let col = Collection::new(p.clone(), "Wishlist".into(), "#EC4899".into());
        ops::insert_collection(conn, &col).unwrap();
        (p, col)
    }

    fn post_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM community_posts", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_empty_collection_not_posted() {
        let conn = open_memory_db().unwrap();
        let (p, col) = setup(&conn);
        let outcome = sync_post_for_collection(&conn, &p, &col).unwrap();
        assert_eq!(outcome, ProjectionOutcome::Absent);
        assert_eq!(post_count(&conn), 0);
    }

    #[test]
    fn test_sync_is_idempotent() {
        let conn = open_memory_db().unwrap();
        let (p, col) = setup(&conn);
        ops::add_collection_item(&conn, &p, &col.id, "sku-1").unwrap();

        let first = resync_collection(&conn, &p, &col.id).unwrap();
        assert!(matches!(first, ProjectionOutcome::Created(_)));
        let second = resync_collection(&conn, &p, &col.id).unwrap();
        assert!(matches!(second, ProjectionOutcome::Unchanged(_)));
        assert_eq!(post_count(&conn), 1);

        let post = ops::get_post_for_collection(&conn, &p, &col.id).unwrap().unwrap();
        assert_eq!(post.title, "✨ Wishlist");
        assert_eq!(post.description, "A collection of 1 saved item");
    }

    #[test]
    fn test_private_toggle_never_duplicates() {
        let conn = open_memory_db().unwrap();
        let (p, mut col) = setup(&conn);
        ops::add_collection_item(&conn, &p, &col.id, "sku-1").unwrap();
        resync_collection(&conn, &p, &col.id).unwrap();

        for _ in 0..3 {
            col.is_public = false;
            ops::update_collection(&conn, &col).unwrap();
            assert_eq!(
                resync_collection(&conn, &p, &col.id).unwrap(),
                ProjectionOutcome::Retracted
            );
            assert_eq!(post_count(&conn), 0);

            col.is_public = true;
            ops::update_collection(&conn, &col).unwrap();
            assert!(resync_collection(&conn, &p, &col.id).unwrap().is_posted());
            assert_eq!(post_count(&conn), 1);
        }
    }

    #[test]
    fn test_rename_refreshes_post() {
        let conn = open_memory_db().unwrap();
        let (p, mut col) = setup(&conn);
        ops::add_collection_item(&conn, &p, &col.id, "sku-1").unwrap();
        resync_collection(&conn, &p, &col.id).unwrap();

        col.name = "Dream Bags".into();
        ops::update_collection(&conn, &col).unwrap();
        let outcome = resync_collection(&conn, &p, &col.id).unwrap();
        assert!(matches!(outcome, ProjectionOutcome::Refreshed(_)));

        let post = ops::get_post_for_collection(&conn, &p, &col.id).unwrap().unwrap();
        assert_eq!(post.title, "✨ Dream Bags");
        assert_eq!(post_count(&conn), 1);
    }

    #[test]
    fn test_emptied_collection_retracts() {
        let conn = open_memory_db().unwrap();
        let (p, col) = setup(&conn);
        ops::add_collection_item(&conn, &p, &col.id, "sku-1").unwrap();
        resync_collection(&conn, &p, &col.id).unwrap();

        ops::remove_collection_item(&conn, &p, &col.id, "sku-1").unwrap();
        assert_eq!(
            resync_collection(&conn, &p, &col.id).unwrap(),
            ProjectionOutcome::Retracted
        );
        assert_eq!(post_count(&conn), 0);
    }
}
