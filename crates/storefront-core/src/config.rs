use crate::error::Result;
use crate::money::TaxRate;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// AdminConfig
// ---------------------------------------------------------------------------

/// Bootstrap administrator created on `init` / first `serve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,
    #[serde(default = "default_admin_email")]
    pub email: String,
    #[serde(default = "default_admin_password")]
    pub password: String,
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_email() -> String {
    "admin@shop.com".to_string()
}

fn default_admin_password() -> String {
    "admin123".to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            email: default_admin_email(),
            password: default_admin_password(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Contents of `storefront.yaml`. Every field has a default, so a missing or
/// partial file is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_database")]
    pub database: PathBuf,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub tax_rate_bps: TaxRate,
    #[serde(default = "default_seed")]
    pub seed_sample_data: bool,
    /// Idle minutes before a login session is dropped.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_minutes: u64,
    #[serde(default)]
    pub admin: AdminConfig,
}

fn default_name() -> String {
    "storefront".to_string()
}

fn default_database() -> PathBuf {
    PathBuf::from(paths::DEFAULT_DATABASE)
}

fn default_port() -> u16 {
    5000
}

fn default_seed() -> bool {
    true
}

fn default_session_ttl() -> u64 {
    24 * 60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: default_name(),
            database: default_database(),
            port: default_port(),
            tax_rate_bps: TaxRate::default(),
            seed_sample_data: default_seed(),
            session_ttl_minutes: default_session_ttl(),
            admin: AdminConfig::default(),
        }
    }
}

impl Config {
    /// Load `storefront.yaml` from `root`, falling back to defaults when the
    /// file does not exist.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Write the default config unless one already exists. Returns true if written.
    pub fn write_default(root: &Path) -> Result<bool> {
        let data = serde_yaml::to_string(&Self::default())?;
        crate::io::write_if_missing(&paths::config_path(root), data.as_bytes())
    }

    pub fn database_path(&self, root: &Path) -> PathBuf {
        paths::database_path(root, &self.database)
    }

    pub fn session_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.session_ttl_minutes.saturating_mul(60))
    }
}
