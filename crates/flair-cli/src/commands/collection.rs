use clap::Subcommand;
use comfy_table::{Cell, Color, Table};
use flair_core::models::collection::{Collection, CollectionId, CollectionPatch, NewCollection};

use super::session;

#[derive(Subcommand)]
pub enum CollectionAction {
    /// List your collections
    List,
    /// Show a collection and its items
    Show { id: CollectionId },
    /// Create a collection
    Create {
        name: String,
        /// Hex color tag, e.g. #EC4899
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Keep the collection out of the community feed
        #[arg(long)]
        private: bool,
        /// Saved product ids to add right away
        #[arg(long = "item")]
        items: Vec<String>,
    },
    /// Update collection fields; omitted flags keep their values
    Update {
        id: CollectionId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
        /// New description; an empty string clears it
        #[arg(long)]
        description: Option<String>,
        /// New banner URL; an empty string clears it
        #[arg(long)]
        banner: Option<String>,
        #[arg(long)]
        public: Option<bool>,
    },
    /// Add a saved product to a collection
    Add { id: CollectionId, item_id: String },
    /// Remove a product from a collection
    Remove { id: CollectionId, item_id: String },
    /// Delete a collection; its products stay saved
    Delete { id: CollectionId },
}

pub async fn run(action: CollectionAction, user: Option<String>) -> anyhow::Result<()> {
    let (service, me) = session(user).await?;

    match action {
        CollectionAction::List => {
            let collections = service.list_collections(&me).await?;
            if collections.is_empty() {
                println!("No collections. Use `flair collection create` to add one.");
                return Ok(());
            }

            let mut table = Table::new();
            table.set_header(vec!["ID", "NAME", "ITEMS", "VISIBILITY", "POSTED"]);
            for col in &collections {
                let posted = service.get_post_for_collection(&me, &col.id).await?.is_some();
                table.add_row(vec![
                    Cell::new(col.id.to_string()),
                    Cell::new(&col.name),
                    Cell::new(col.item_count.to_string()),
                    visibility_cell(col),
                    Cell::new(if posted { "yes" } else { "no" }),
                ]);
            }
            println!("{table}");
            Ok(())
        }
        CollectionAction::Show { id } => {
            let col = service.get_collection(&me, &id).await?;
            print_collection(&col);
            if let Some(post) = service.get_post_for_collection(&me, &id).await? {
                println!("Post:            {} ({})", post.title, post.description);
            }
            Ok(())
        }
        CollectionAction::Create {
            name,
            color,
            description,
            private,
            items,
        } => {
            let new = NewCollection {
                name,
                color,
                description,
                custom_banner: None,
                is_public: Some(!private),
                item_ids: items,
            };
            let col = service.create_collection(&me, new).await?;
            println!("Created collection {} ({})", col.name, col.id);
            Ok(())
        }
        CollectionAction::Update {
            id,
            name,
            color,
            description,
            banner,
            public,
        } => {
            let patch = CollectionPatch {
                name,
                color,
                description: description.map(clearable),
                custom_banner: banner.map(clearable),
                is_public: public,
            };
            let col = service.update_collection(&me, &id, patch).await?;
            print_collection(&col);
            Ok(())
        }
        CollectionAction::Add { id, item_id } => {
            let col = service.add_item_to_collection(&me, &item_id, &id).await?;
            println!("{} now holds {} items", col.name, col.item_count);
            Ok(())
        }
        CollectionAction::Remove { id, item_id } => {
            let col = service.remove_item_from_collection(&me, &item_id, &id).await?;
            println!("{} now holds {} items", col.name, col.item_count);
            Ok(())
        }
        CollectionAction::Delete { id } => {
            service.delete_collection(&me, &id).await?;
            println!("Deleted collection {id}");
            Ok(())
        }
    }
}

fn clearable(value: String) -> Option<String> {
    Some(value).filter(|v| !v.trim().is_empty())
}

fn visibility_cell(col: &Collection) -> Cell {
    if col.is_public {
        Cell::new("public").fg(Color::Green)
    } else {
        Cell::new("private").fg(Color::Yellow)
    }
}

fn print_collection(col: &Collection) {
    println!("Name:            {}", col.name);
    println!("Color:           {}", col.color);
    if let Some(ref description) = col.description {
        println!("Description:     {}", description);
    }
    if let Some(ref banner) = col.custom_banner {
        println!("Banner:          {}", banner);
    }
    println!("Public:          {}", col.is_public);
    println!("Created:         {}", super::short_time(&col.created_at));
    println!("Items ({}):", col.item_count);
    for item in &col.item_ids {
        println!("  {item}");
    }
}
