use clap::Subcommand;
use std::path::Path;
use storefront_core::catalog::Category;

use crate::output::{print_json, print_table};

#[derive(Subcommand)]
pub enum CategorySubcommand {
    /// List categories
    List,
    /// Add a category
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
}

pub fn run(root: &Path, subcmd: CategorySubcommand, json: bool) -> anyhow::Result<()> {
    let (_, store) = super::open(root)?;
    match subcmd {
        CategorySubcommand::List => {
            let categories = Category::list(&store)?;
            if json {
                return print_json(&categories);
            }
            let rows: Vec<Vec<String>> = categories
                .iter()
                .map(|c| {
                    vec![
                        c.id.to_string(),
                        c.name.clone(),
                        c.description.clone().unwrap_or_default(),
                    ]
                })
                .collect();
            print_table(&["ID", "NAME", "DESCRIPTION"], &rows, "No categories.");
        }
        CategorySubcommand::Add { name, description } => {
            let id = Category::create(&store, &name, description.as_deref())?;
            if json {
                return print_json(&serde_json::json!({ "id": id, "name": name }));
            }
            println!("Added category '{name}' (id {id})");
        }
    }
    Ok(())
}
