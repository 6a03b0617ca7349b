use clap::Subcommand;
use std::path::Path;
use storefront_core::catalog::{Product, ProductFilter};

use crate::output::{print_json, print_table, yes_no};

#[derive(Subcommand)]
pub enum ProductSubcommand {
    /// List products on sale
    List {
        /// Include deactivated products; --search and --category still apply
        #[arg(long)]
        all: bool,
        /// Only products whose name contains this text
        #[arg(long)]
        search: Option<String>,
        /// Only products in this category id
        #[arg(long)]
        category: Option<i64>,
    },
}

pub fn run(root: &Path, subcmd: ProductSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ProductSubcommand::List {
            all,
            search,
            category,
        } => list(root, all, search, category, json),
    }
}

fn list(
    root: &Path,
    all: bool,
    search: Option<String>,
    category: Option<i64>,
    json: bool,
) -> anyhow::Result<()> {
    let (_, store) = super::open(root)?;
    let filter = ProductFilter {
        category_id: category,
        search,
        include_inactive: all,
    };
    let products = Product::list(&store, &filter)?;

    if json {
        return print_json(&products);
    }

    let rows: Vec<Vec<String>> = products
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                p.name.clone(),
                p.category.clone().unwrap_or_else(|| "-".to_string()),
                p.price.to_string(),
                p.stock.to_string(),
                yes_no(p.is_active),
            ]
        })
        .collect();
    print_table(
        &["ID", "NAME", "CATEGORY", "PRICE", "STOCK", "ACTIVE"],
        &rows,
        "No products.",
    );
    Ok(())
}
