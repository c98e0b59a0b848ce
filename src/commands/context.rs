//! Shared setup for commands: config, database and platform client.

use anyhow::{Context as _, Result};

use crate::cli::GlobalArgs;
use crate::config::AppConfig;
use crate::db::TierDb;
use crate::platform::{normalize_shop, ShopifyAdmin};
use crate::tiering::{AssignmentEngine, AssignmentStore, SyncProjector, TierCatalog};

/// Stored config with command-line overrides applied.
pub fn resolve_config(global: &GlobalArgs) -> Result<AppConfig> {
    let mut config = AppConfig::load()?;
    if let Some(shop) = &global.shop {
        config.shop = Some(shop.clone());
    }
    if let Some(token) = &global.token {
        config.access_token = Some(token.clone());
    }
    if let Some(database) = &global.database {
        config.database_path = Some(database.clone());
    }
    Ok(config)
}

/// Everything a local command needs.
pub struct LocalContext {
    pub config: AppConfig,
    pub shop: String,
    pub db: TierDb,
}

impl LocalContext {
    pub async fn open(global: &GlobalArgs) -> Result<Self> {
        let config = resolve_config(global)?;
        let shop = normalize_shop(config.require_shop()?)?;
        let db_path = config.database_path()?;
        let db = TierDb::open(&db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

        Ok(Self { config, shop, db })
    }

    pub fn catalog(&self) -> TierCatalog {
        TierCatalog::new(self.db.clone())
    }

    pub fn store(&self) -> AssignmentStore {
        AssignmentStore::new(self.db.clone())
    }
}

/// A local context plus a connected platform client.
pub struct PlatformContext {
    pub local: LocalContext,
    pub admin: ShopifyAdmin,
}

impl PlatformContext {
    pub async fn open(global: &GlobalArgs) -> Result<Self> {
        let local = LocalContext::open(global).await?;
        let token = local.config.require_access_token()?;
        let admin = ShopifyAdmin::new(&local.shop, token, &local.config.api_version)?;

        Ok(Self { local, admin })
    }

    pub fn shop(&self) -> &str {
        self.admin.shop()
    }

    pub fn engine(&self) -> AssignmentEngine<ShopifyAdmin> {
        AssignmentEngine::new(self.local.catalog(), self.local.store(), self.admin.clone())
    }

    pub fn projector(&self) -> SyncProjector<ShopifyAdmin> {
        SyncProjector::new(self.local.store(), self.admin.clone())
    }
}
