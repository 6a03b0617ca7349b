use anyhow::Context;
use std::path::Path;
use storefront_core::config::Config;
use storefront_core::paths;
use storefront_core::seed::seed_defaults;

use crate::output::print_json;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    std::fs::create_dir_all(root)
        .with_context(|| format!("failed to create {}", root.display()))?;

    let created = Config::write_default(root).context("failed to write storefront.yaml")?;
    let (config, store) = super::open(root)?;
    let report = seed_defaults(&store, &config.admin, config.seed_sample_data)
        .context("failed to seed the database")?;

    if json {
        return print_json(&serde_json::json!({
            "root": root,
            "config_created": created,
            "database": config.database_path(root),
            "seed": report,
        }));
    }

    println!("Initializing storefront in: {}", root.display());
    if created {
        println!("  created: {}", paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }
    println!("  database: {}", config.database_path(root).display());
    if report.admin_created {
        println!("  admin account: {}", config.admin.username);
    }
    if report.categories > 0 || report.products > 0 {
        println!(
            "  seeded {} categories and {} products",
            report.categories, report.products
        );
    }
    Ok(())
}
