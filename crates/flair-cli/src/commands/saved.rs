use std::path::PathBuf;

use clap::Subcommand;
use comfy_table::Table;
use flair_core::models::product::Product;

use super::session;

#[derive(Subcommand)]
pub enum SavedAction {
    /// List saved products, newest first
    List,
    /// Save a product
    Add {
        /// Product id
        id: String,
        /// Product title
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        brand: Option<String>,
        #[arg(long)]
        link: Option<String>,
    },
    /// Unsave a product; it also leaves every collection
    Remove { id: String },
    /// Replace all saved products with the JSON array in a file
    Import { file: PathBuf },
}

pub async fn run(action: SavedAction, user: Option<String>) -> anyhow::Result<()> {
    let (service, me) = session(user).await?;

    match action {
        SavedAction::List => {
            let items = service.list_saved_items(&me).await?;
            if items.is_empty() {
                println!("Nothing saved yet. Use `flair saved add` to save a product.");
                return Ok(());
            }

            let mut table = Table::new();
            table.set_header(vec!["ID", "TITLE", "BRAND", "PRICE"]);
            for item in &items {
                let price = match (item.price, item.currency.as_deref()) {
                    (Some(p), Some(cur)) => format!("{p:.2} {cur}"),
                    (Some(p), None) => format!("{p:.2}"),
                    _ => "—".to_string(),
                };
                table.add_row(vec![
                    item.id.clone(),
                    item.title.clone(),
                    item.brand.clone().unwrap_or_default(),
                    price,
                ]);
            }
            println!("{table}");
            println!("{} saved items", items.len());
            Ok(())
        }
        SavedAction::Add {
            id,
            title,
            price,
            brand,
            link,
        } => {
            let mut product = Product::new(id, title);
            product.price = price;
            product.brand = brand;
            product.link = link;
            let product_id = product.id.clone();
            if service.add_saved_item(&me, product).await? {
                println!("Saved {product_id}");
            } else {
                println!("{product_id} is already saved");
            }
            Ok(())
        }
        SavedAction::Remove { id } => {
            if service.remove_saved_item(&me, &id).await? {
                println!("Removed {id}");
            } else {
                println!("{id} was not saved");
            }
            Ok(())
        }
        SavedAction::Import { file } => {
            let raw = std::fs::read_to_string(&file)?;
            let products: Vec<Product> = serde_json::from_str(&raw)?;
            let kept = service.replace_all_saved_items(&me, products).await?;
            println!("Imported {kept} saved items from {}", file.display());
            Ok(())
        }
    }
}
