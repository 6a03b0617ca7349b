use std::path::{Path, PathBuf};

use storefront_core::config::Config;
use storefront_core::money::TaxRate;
use storefront_core::store::Store;

use crate::session::SessionStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub db_path: PathBuf,
    pub tax_rate: TaxRate,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(root: PathBuf, config: &Config) -> Self {
        Self {
            db_path: config.database_path(&root),
            tax_rate: config.tax_rate_bps,
            sessions: SessionStore::with_ttl(config.session_ttl()),
            root,
        }
    }

    /// Connect to the shop database, which must already have been created
    /// with [`Store::open`]. Call from blocking context.
    pub fn open_store(db_path: &Path) -> storefront_core::Result<Store> {
        Store::connect(db_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_resolves_database_under_root() {
        let state = AppState::new(PathBuf::from("/tmp/shop"), &Config::default());
        assert_eq!(state.root, PathBuf::from("/tmp/shop"));
        assert_eq!(state.db_path, PathBuf::from("/tmp/shop/shop.db"));
        assert_eq!(state.tax_rate, TaxRate::GST);
        assert_eq!(state.sessions.ttl(), std::time::Duration::from_secs(24 * 60 * 60));
    }

    #[test]
    fn open_store_does_not_create_a_database() {
        let dir = tempfile::TempDir::new().unwrap();
        let db_path = dir.path().join("data/shop.db");
        assert!(AppState::open_store(&db_path).is_err());
        assert!(!db_path.exists());

        Store::open(&db_path).unwrap();
        assert!(AppState::open_store(&db_path).is_ok());
    }
}
