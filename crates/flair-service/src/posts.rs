use tracing::{debug, instrument};

use flair_core::error::FlairError;
use flair_core::models::collection::CollectionId;
use flair_core::models::community_post::CommunityPost;
use flair_core::models::profile::ProfileId;
use flair_db::projector::{self, ProjectionOutcome};
use flair_db::ops;

use crate::service::FlairService;

/// Largest page the community feed hands out.
pub const MAX_FEED_LIMIT: u32 = 100;

impl FlairService {
    /// Re-project one collection. Safe to call any number of times.
    #[instrument(name = "flair.posts.sync", skip_all, fields(profile_id = %profile_id, collection_id = %collection_id))]
    pub async fn sync_post_for_collection(
        &self,
        profile_id: &ProfileId,
        collection_id: &CollectionId,
    ) -> Result<ProjectionOutcome, FlairError> {
        let (id, cid) = (profile_id.clone(), collection_id.clone());
        let outcome = self
            .run_tx("sync_post_for_collection", move |tx| {
                match ops::get_collection(tx, &id, &cid)? {
                    Some(collection) => Ok(projector::sync_post_for_collection(tx, &id, &collection)?),
                    None => Err(FlairError::not_found("collection", &cid)),
                }
            })
            .await?;
        debug!(?outcome, "projected collection");
        Ok(outcome)
    }

    /// Public posts, newest first.
    pub async fn list_community_posts(&self, limit: u32) -> Result<Vec<CommunityPost>, FlairError> {
        if limit == 0 {
            return Err(FlairError::validation("limit must be positive"));
        }
        let limit = limit.min(MAX_FEED_LIMIT);
        self.run("list_community_posts", move |conn| Ok(ops::list_public_posts(conn, limit)?))
            .await
    }

    pub async fn get_post_for_collection(
        &self,
        profile_id: &ProfileId,
        collection_id: &CollectionId,
    ) -> Result<Option<CommunityPost>, FlairError> {
        let (id, cid) = (profile_id.clone(), collection_id.clone());
        self.run("get_post_for_collection", move |conn| {
            Ok(ops::get_post_for_collection(conn, &id, &cid)?)
        })
        .await
    }

    /// Every post the profile currently has, public or not.
    pub async fn list_posts_for_profile(&self, profile_id: &ProfileId) -> Result<Vec<CommunityPost>, FlairError> {
        let id = profile_id.clone();
        self.run("list_posts_for_profile", move |conn| {
            Ok(ops::list_posts_for_profile(conn, &id)?)
        })
        .await
    }
}
