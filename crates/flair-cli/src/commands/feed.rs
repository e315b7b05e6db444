use clap::Args;
use comfy_table::{Cell, Color, Table};

use super::{open_service, short_time};

#[derive(Args)]
pub struct FeedArgs {
    /// Number of posts to show
    #[arg(long, default_value_t = 20)]
    limit: u32,
}

pub async fn run(args: FeedArgs) -> anyhow::Result<()> {
    let service = open_service()?;
    let posts = service.list_community_posts(args.limit).await?;

    if posts.is_empty() {
        println!("The community feed is empty.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["POSTED", "TITLE", "DESCRIPTION", "LIKES"]);
    for post in &posts {
        table.add_row(vec![
            Cell::new(short_time(&post.created_at)),
            Cell::new(&post.title).fg(Color::Cyan),
            Cell::new(&post.description),
            Cell::new(post.likes_count.to_string()),
        ]);
    }
    println!("{table}");
    Ok(())
}
