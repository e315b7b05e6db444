mod commands;

use clap::Parser;
use tracing::Level;

#[derive(Parser)]
#[command(name = "flair", version, about = "Saved products, collections and the community feed")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// External identity to act as
    #[arg(long, global = true, value_name = "EXTERNAL_ID")]
    user: Option<String>,

    #[command(subcommand)]
    command: commands::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    commands::run(cli.command, cli.user).await
}
