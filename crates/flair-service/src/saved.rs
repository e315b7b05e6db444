use std::collections::{HashMap, HashSet};

use tracing::{debug, info, instrument};

use flair_core::error::FlairError;
use flair_core::models::product::{Product, SavedItem};
use flair_core::models::profile::ProfileId;
use flair_db::{ops, projector};

use crate::service::{require_non_empty, FlairService};

impl FlairService {
    /// Saved products, newest first.
    pub async fn list_saved_items(&self, profile_id: &ProfileId) -> Result<Vec<Product>, FlairError> {
        let id = profile_id.clone();
        let items = self
            .run("list_saved_items", move |conn| Ok(ops::list_saved_items(conn, &id)?))
            .await?;
        debug!(profile_id = %profile_id, count = items.len(), "listed saved items");
        Ok(items.into_iter().map(|item| item.product).collect())
    }

    pub async fn is_saved(&self, profile_id: &ProfileId, product_id: &str) -> Result<bool, FlairError> {
        let (id, product_id) = (profile_id.clone(), product_id.to_string());
        self.run("is_saved", move |conn| Ok(ops::is_saved(conn, &id, &product_id)?))
            .await
    }

    /// Save a product snapshot. Saving an already saved product is a no-op;
    /// returns whether a new row was written.
    #[instrument(name = "flair.saved.add", skip_all, fields(profile_id = %profile_id, product_id = %product.id))]
    pub async fn add_saved_item(&self, profile_id: &ProfileId, mut product: Product) -> Result<bool, FlairError> {
        product.id = require_non_empty(&product.id, "product id")?;
        let item = SavedItem::new(profile_id.clone(), product);
        let created = self
            .run_tx("add_saved_item", move |tx| Ok(ops::insert_saved_item(tx, &item)?))
            .await?;
        if created {
            info!("saved item");
        } else {
            debug!("item already saved");
        }
        Ok(created)
    }

    /// Unsave a product and strip it from every collection of the profile.
    /// Collections left empty lose their community post.
    #[instrument(name = "flair.saved.remove", skip_all, fields(profile_id = %profile_id, product_id = %product_id))]
    pub async fn remove_saved_item(&self, profile_id: &ProfileId, product_id: &str) -> Result<bool, FlairError> {
        let product_id = require_non_empty(product_id, "product id")?;
        let id = profile_id.clone();
        let (removed, touched) = self
            .run_tx("remove_saved_item", move |tx| {
                let affected = ops::collections_containing(tx, &id, &product_id)?;
                let removed = ops::delete_saved_item(tx, &id, &product_id)?;
                for collection_id in &affected {
                    // Memberships went with the saved row; strip any that did not.
                    ops::remove_collection_item(tx, &id, collection_id, &product_id)?;
                    projector::resync_collection(tx, &id, collection_id)?;
                }
                Ok((removed, affected.len()))
            })
            .await?;
        if removed {
            info!(collections = touched, "removed saved item");
        }
        Ok(removed)
    }

    /// Replace the whole saved set. Products that stay keep their collection
    /// memberships; products that go are stripped from collections, and every
    /// collection is re-projected afterwards.
    #[instrument(name = "flair.saved.replace_all", skip_all, fields(profile_id = %profile_id, incoming = items.len()))]
    pub async fn replace_all_saved_items(
        &self,
        profile_id: &ProfileId,
        items: Vec<Product>,
    ) -> Result<usize, FlairError> {
        let items = dedup_products(items)?;
        let id = profile_id.clone();
        let (kept, dropped) = self
            .run_tx("replace_all_saved_items", move |tx| {
                let incoming: HashSet<&str> = items.iter().map(|p| p.id.as_str()).collect();
                let mut dropped = 0;
                for existing in ops::list_saved_product_ids(tx, &id)? {
                    if !incoming.contains(existing.as_str()) {
                        ops::delete_saved_item(tx, &id, &existing)?;
                        dropped += 1;
                    }
                }
                for product in &items {
                    ops::upsert_saved_item(tx, &SavedItem::new(id.clone(), product.clone()))?;
                }
                for collection in ops::list_collections(tx, &id)? {
                    projector::sync_post_for_collection(tx, &id, &collection)?;
                }
                Ok((items.len(), dropped))
            })
            .await?;
        info!(kept, dropped, "replaced saved items");
        Ok(kept)
    }
}

/// Drop duplicate product ids, keeping the last snapshot at the position of the first.
fn dedup_products(items: Vec<Product>) -> Result<Vec<Product>, FlairError> {
    let mut out: Vec<Product> = Vec::with_capacity(items.len());
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(items.len());
    for mut product in items {
        product.id = require_non_empty(&product.id, "product id")?;
        match slots.get(&product.id) {
            Some(&slot) => out[slot] = product,
            None => {
                slots.insert(product.id.clone(), out.len());
                out.push(product);
            }
        }
    }
    Ok(out)
}
