use clap::Subcommand;
use flair_core::config::FlairConfig;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Initialize ~/.flair/ directory with default config and database
    Init,
    /// Show current configuration
    Show,
}

pub fn run(action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let home = FlairConfig::init()?;
            let config = FlairConfig::load()?;
            let db_path = config.db_path()?;

            // Ensure database is created with schema
            flair_service::FlairService::open(&config)?;

            println!("Initialized flair at {}", home.display());
            println!("  config: {}", FlairConfig::config_path()?.display());
            println!("  database: {}", db_path.display());
            Ok(())
        }
        ConfigAction::Show => {
            let config = FlairConfig::load()?;
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{toml_str}");
            println!("# database: {}", config.db_path()?.display());
            Ok(())
        }
    }
}
