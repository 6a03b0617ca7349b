use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "storefront.yaml";
pub const DEFAULT_DATABASE: &str = "shop.db";

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Resolve the database location; relative paths are taken from `root`.
pub fn database_path(root: &Path, database: &Path) -> PathBuf {
    if database.is_absolute() {
        database.to_path_buf()
    } else {
        root.join(database)
    }
}
