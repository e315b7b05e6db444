use clap::Subcommand;
use flair_core::models::profile::{Profile, ProfilePatch};

use super::session;

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show your profile
    Show,
    /// Update profile fields; omitted flags keep their values
    Update {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        avatar_url: Option<String>,
        /// Free-form JSON stored with the profile
        #[arg(long)]
        data: Option<String>,
        #[arg(long)]
        public: Option<bool>,
    },
    /// Follow another profile by external id
    Follow { external_id: String },
    /// Stop following a profile
    Unfollow { external_id: String },
}

pub async fn run(action: ProfileAction, user: Option<String>) -> anyhow::Result<()> {
    let (service, me) = session(user).await?;

    match action {
        ProfileAction::Show => {
            let profile = service.get_profile(&me).await?;
            print_profile(&profile);
            Ok(())
        }
        ProfileAction::Update {
            username,
            display_name,
            bio,
            avatar_url,
            data,
            public,
        } => {
            let data = data
                .map(|raw| serde_json::from_str::<serde_json::Value>(&raw))
                .transpose()
                .map_err(|e| anyhow::anyhow!("--data is not valid JSON: {e}"))?;
            let patch = ProfilePatch {
                username,
                display_name,
                bio,
                avatar_url,
                data,
                is_public: public,
            };
            if patch.is_empty() {
                println!("Nothing to update.");
                return Ok(());
            }
            let profile = service.update_profile(&me, patch).await?;
            print_profile(&profile);
            Ok(())
        }
        ProfileAction::Follow { external_id } => {
            let other = service.resolve_profile_id(&external_id).await?;
            if service.follow(&me, &other).await? {
                println!("Now following {external_id}");
            } else {
                println!("Already following {external_id}");
            }
            Ok(())
        }
        ProfileAction::Unfollow { external_id } => {
            let other = service.resolve_profile_id(&external_id).await?;
            if service.unfollow(&me, &other).await? {
                println!("Unfollowed {external_id}");
            } else {
                println!("Not following {external_id}");
            }
            Ok(())
        }
    }
}

fn print_profile(profile: &Profile) {
    println!("Username:        {}", profile.username);
    println!("Display name:    {}", profile.display_name);
    if let Some(ref bio) = profile.bio {
        println!("Bio:             {}", bio);
    }
    if let Some(ref avatar) = profile.avatar_url {
        println!("Avatar:          {}", avatar);
    }
    println!("Public:          {}", profile.is_public);
    println!("Followers:       {}", profile.follower_count);
    println!("Following:       {}", profile.following_count);
    println!("Profile id:      {}", profile.id);
    println!("Joined:          {}", super::short_time(&profile.created_at));
}
