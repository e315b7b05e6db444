pub mod collection;
pub mod config;
pub mod feed;
pub mod profile;
pub mod saved;

use clap::Subcommand;
use flair_core::config::FlairConfig;
use flair_core::models::profile::ProfileId;
use flair_service::FlairService;

#[derive(Subcommand)]
pub enum Command {
    /// Initialize and manage Flair configuration
    Config {
        #[command(subcommand)]
        action: config::ConfigAction,
    },
    /// Show and edit your profile, follow others
    Profile {
        #[command(subcommand)]
        action: profile::ProfileAction,
    },
    /// Manage saved products
    Saved {
        #[command(subcommand)]
        action: saved::SavedAction,
    },
    /// Manage collections of saved products
    Collection {
        #[command(subcommand)]
        action: collection::CollectionAction,
    },
    /// Show the public community feed
    Feed(feed::FeedArgs),
}

pub async fn run(cmd: Command, user: Option<String>) -> anyhow::Result<()> {
    match cmd {
        Command::Config { action } => config::run(action),
        Command::Profile { action } => profile::run(action, user).await,
        Command::Saved { action } => saved::run(action, user).await,
        Command::Collection { action } => collection::run(action, user).await,
        Command::Feed(args) => feed::run(args).await,
    }
}

/// Open the service against the configured database.
pub(crate) fn open_service() -> anyhow::Result<FlairService> {
    let config = FlairConfig::load()?;
    Ok(FlairService::open(&config)?)
}

/// Open the service and resolve the `--user` identity to a profile.
pub(crate) async fn session(user: Option<String>) -> anyhow::Result<(FlairService, ProfileId)> {
    let user = user.ok_or_else(|| anyhow::anyhow!("pass --user <EXTERNAL_ID> to pick a profile"))?;
    let service = open_service()?;
    let profile_id = service.resolve_profile_id(&user).await?;
    Ok((service, profile_id))
}

/// Short form of a timestamp for table cells.
pub(crate) fn short_time(dt: &chrono::DateTime<chrono::Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}
