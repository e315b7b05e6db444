use rusqlite::Transaction;
use tracing::{debug, info, instrument};

use flair_core::error::FlairError;
use flair_core::models::collection::{
    normalize_color, Collection, CollectionId, CollectionPatch, NewCollection,
};
use flair_core::models::profile::ProfileId;
use flair_db::{ops, projector};

use crate::service::{require_non_empty, FlairService};

impl FlairService {
    /// Collections in creation order. A profile with none gets the starter set.
    #[instrument(name = "flair.collections.list", skip_all, fields(profile_id = %profile_id))]
    pub async fn list_collections(&self, profile_id: &ProfileId) -> Result<Vec<Collection>, FlairError> {
        let id = profile_id.clone();
        let seed = self.seed_defaults;
        let collections = self
            .run_tx("list_collections", move |tx| {
                if seed && ops::count_collections(tx, &id)? == 0 {
                    for collection in Collection::defaults_for(&id) {
                        ops::insert_collection(tx, &collection)?;
                    }
                    info!("seeded default collections");
                }
                Ok(ops::list_collections(tx, &id)?)
            })
            .await?;
        debug!(count = collections.len(), "listed collections");
        Ok(collections)
    }

    pub async fn get_collection(
        &self,
        profile_id: &ProfileId,
        collection_id: &CollectionId,
    ) -> Result<Collection, FlairError> {
        let (id, cid) = (profile_id.clone(), collection_id.clone());
        self.run("get_collection", move |conn| load_owned(conn, &id, &cid))
            .await
    }

    /// Create a collection, optionally filled with already saved products.
    #[instrument(name = "flair.collections.create", skip_all, fields(profile_id = %profile_id))]
    pub async fn create_collection(
        &self,
        profile_id: &ProfileId,
        new: NewCollection,
    ) -> Result<Collection, FlairError> {
        let name = require_non_empty(&new.name, "collection name")?;
        let mut collection = Collection::new(
            profile_id.clone(),
            name,
            normalize_color(new.color.as_deref()),
        );
        collection.description = new.description;
        collection.custom_banner = new.custom_banner;
        collection.is_public = new.is_public.unwrap_or(true);

        let id = profile_id.clone();
        let item_ids = new.item_ids;
        let collection = self
            .run_tx("create_collection", move |tx| {
                ops::insert_collection(tx, &collection)?;
                for item_id in &item_ids {
                    add_saved_member(tx, &id, &collection.id, item_id)?;
                }
                let collection = load_owned(tx, &id, &collection.id)?;
                projector::sync_post_for_collection(tx, &id, &collection)?;
                Ok(collection)
            })
            .await?;
        info!(collection_id = %collection.id, items = collection.item_count, "created collection");
        Ok(collection)
    }

    /// Apply a partial update and re-project the collection's post.
    #[instrument(name = "flair.collections.update", skip_all, fields(profile_id = %profile_id, collection_id = %collection_id))]
    pub async fn update_collection(
        &self,
        profile_id: &ProfileId,
        collection_id: &CollectionId,
        patch: CollectionPatch,
    ) -> Result<Collection, FlairError> {
        if let Some(ref name) = patch.name {
            require_non_empty(name, "collection name")?;
        }
        let (id, cid) = (profile_id.clone(), collection_id.clone());
        let collection = self
            .run_tx("update_collection", move |tx| {
                let mut collection = load_owned(tx, &id, &cid)?;
                if !patch.is_empty() {
                    patch.apply(&mut collection);
                    ops::update_collection(tx, &collection)?;
                }
                projector::sync_post_for_collection(tx, &id, &collection)?;
                Ok(collection)
            })
            .await?;
        info!("updated collection");
        Ok(collection)
    }

    /// Place a saved product in a collection. Adding a member twice changes nothing.
    #[instrument(name = "flair.collections.add_item", skip_all, fields(profile_id = %profile_id, collection_id = %collection_id, item_id = %item_id))]
    pub async fn add_item_to_collection(
        &self,
        profile_id: &ProfileId,
        item_id: &str,
        collection_id: &CollectionId,
    ) -> Result<Collection, FlairError> {
        let item_id = require_non_empty(item_id, "item id")?;
        let (id, cid) = (profile_id.clone(), collection_id.clone());
        let (collection, added) = self
            .run_tx("add_item_to_collection", move |tx| {
                load_owned(tx, &id, &cid)?;
                let added = add_saved_member(tx, &id, &cid, &item_id)?;
                let collection = load_owned(tx, &id, &cid)?;
                projector::sync_post_for_collection(tx, &id, &collection)?;
                Ok((collection, added))
            })
            .await?;
        if added {
            info!(items = collection.item_count, "added item to collection");
        }
        Ok(collection)
    }

    /// Take a product out of a collection. The product stays saved.
    #[instrument(name = "flair.collections.remove_item", skip_all, fields(profile_id = %profile_id, collection_id = %collection_id, item_id = %item_id))]
    pub async fn remove_item_from_collection(
        &self,
        profile_id: &ProfileId,
        item_id: &str,
        collection_id: &CollectionId,
    ) -> Result<Collection, FlairError> {
        let item_id = require_non_empty(item_id, "item id")?;
        let (id, cid) = (profile_id.clone(), collection_id.clone());
        let (collection, removed) = self
            .run_tx("remove_item_from_collection", move |tx| {
                load_owned(tx, &id, &cid)?;
                let removed = ops::remove_collection_item(tx, &id, &cid, &item_id)?;
                let collection = load_owned(tx, &id, &cid)?;
                projector::sync_post_for_collection(tx, &id, &collection)?;
                Ok((collection, removed))
            })
            .await?;
        if removed {
            info!(items = collection.item_count, "removed item from collection");
        }
        Ok(collection)
    }

    /// Delete a collection and retract its post. The products stay saved.
    #[instrument(name = "flair.collections.delete", skip_all, fields(profile_id = %profile_id, collection_id = %collection_id))]
    pub async fn delete_collection(
        &self,
        profile_id: &ProfileId,
        collection_id: &CollectionId,
    ) -> Result<(), FlairError> {
        let (id, cid) = (profile_id.clone(), collection_id.clone());
        self.run_tx("delete_collection", move |tx| {
            load_owned(tx, &id, &cid)?;
            projector::retract_post(tx, &id, &cid)?;
            ops::delete_collection(tx, &id, &cid)?;
            Ok(())
        })
        .await?;
        info!("deleted collection");
        Ok(())
    }
}

/// Fetch a collection owned by `profile_id`, or NotFound.
fn load_owned(
    conn: &rusqlite::Connection,
    profile_id: &ProfileId,
    collection_id: &CollectionId,
) -> Result<Collection, FlairError> {
    ops::get_collection(conn, profile_id, collection_id)?
        .ok_or_else(|| FlairError::not_found("collection", collection_id))
}

fn add_saved_member(
    tx: &Transaction,
    profile_id: &ProfileId,
    collection_id: &CollectionId,
    item_id: &str,
) -> Result<bool, FlairError> {
    if !ops::is_saved(tx, profile_id, item_id)? {
        return Err(FlairError::not_found("saved item", item_id));
    }
    Ok(ops::add_collection_item(tx, profile_id, collection_id, item_id)?)
}
