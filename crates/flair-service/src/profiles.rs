use tracing::{debug, info, instrument};

use flair_core::error::FlairError;
use flair_core::models::profile::{Profile, ProfileId, ProfilePatch};
use flair_db::ops;

use crate::service::{require_non_empty, FlairService};

impl FlairService {
    /// Map an external identity to the internal profile id, creating the profile on first use.
    #[instrument(name = "flair.profiles.resolve", skip(self))]
    pub async fn resolve_profile_id(&self, external_id: &str) -> Result<ProfileId, FlairError> {
        let external_id = require_non_empty(external_id, "external id")?;
        let id = self
            .run_tx("resolve_profile_id", move |tx| {
                Ok(ops::resolve_profile_id(tx, &external_id)?)
            })
            .await?;
        debug!(profile_id = %id, "resolved profile");
        Ok(id)
    }

    pub async fn get_profile(&self, profile_id: &ProfileId) -> Result<Profile, FlairError> {
        let id = profile_id.clone();
        self.run("get_profile", move |conn| {
            ops::get_profile(conn, &id)?.ok_or_else(|| FlairError::not_found("profile", &id))
        })
        .await
    }

    /// Apply a partial update. Omitted fields keep their stored values.
    #[instrument(name = "flair.profiles.update", skip_all, fields(profile_id = %profile_id))]
    pub async fn update_profile(
        &self,
        profile_id: &ProfileId,
        patch: ProfilePatch,
    ) -> Result<Profile, FlairError> {
        if let Some(ref username) = patch.username {
            require_non_empty(username, "username")?;
        }
        if let Some(ref display_name) = patch.display_name {
            require_non_empty(display_name, "display name")?;
        }

        let id = profile_id.clone();
        let profile = self
            .run_tx("update_profile", move |tx| {
                let mut profile = ops::get_profile(tx, &id)?
                    .ok_or_else(|| FlairError::not_found("profile", &id))?;
                if patch.is_empty() {
                    return Ok(profile);
                }
                patch.apply(&mut profile);
                ops::update_profile(tx, &profile)?;
                Ok(profile)
            })
            .await?;
        info!("updated profile");
        Ok(profile)
    }

    /// Returns false when `follower` already followed `followee`.
    #[instrument(name = "flair.profiles.follow", skip_all, fields(follower = %follower, followee = %followee))]
    pub async fn follow(&self, follower: &ProfileId, followee: &ProfileId) -> Result<bool, FlairError> {
        if follower == followee {
            return Err(FlairError::validation("a profile cannot follow itself"));
        }
        let (follower, followee) = (follower.clone(), followee.clone());
        let created = self
            .run_tx("follow", move |tx| {
                if !ops::profile_exists(tx, &followee)? {
                    return Err(FlairError::not_found("profile", &followee));
                }
                Ok(ops::insert_follow(tx, &follower, &followee)?)
            })
            .await?;
        if created {
            info!("followed profile");
        }
        Ok(created)
    }

    /// Returns false when there was no follow to remove.
    #[instrument(name = "flair.profiles.unfollow", skip_all, fields(follower = %follower, followee = %followee))]
    pub async fn unfollow(&self, follower: &ProfileId, followee: &ProfileId) -> Result<bool, FlairError> {
        let (follower, followee) = (follower.clone(), followee.clone());
        let removed = self
            .run_tx("unfollow", move |tx| {
                Ok(ops::delete_follow(tx, &follower, &followee)?)
            })
            .await?;
        if removed {
            info!("unfollowed profile");
        }
        Ok(removed)
    }
}
