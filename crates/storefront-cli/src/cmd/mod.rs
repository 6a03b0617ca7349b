pub mod category;
pub mod init;
pub mod order;
pub mod product;
pub mod serve;
pub mod user;

use anyhow::Context;
use std::path::Path;
use storefront_core::config::Config;
use storefront_core::store::Store;

/// Load the config under `root` and open its database.
pub(crate) fn open(root: &Path) -> anyhow::Result<(Config, Store)> {
    let config = Config::load(root).context("failed to load storefront.yaml")?;
    let db_path = config.database_path(root);
    let store = Store::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;
    Ok((config, store))
}
