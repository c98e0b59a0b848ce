//! Config command - manage stored configuration.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::AppConfig;
use crate::platform::normalize_shop;

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub command: ConfigSubCmd,
}

#[derive(Subcommand)]
pub enum ConfigSubCmd {
    /// Set the shop domain (e.g. acme.myshopify.com)
    SetShop(SetShopCmd),

    /// Set the Admin API access token
    SetToken(SetTokenCmd),

    /// Set the Admin API version (default: 2025-01)
    SetApiVersion(SetApiVersionCmd),

    /// Set the SQLite database path
    SetDatabase(SetDatabaseCmd),

    /// Show current configuration
    Show,
}

#[derive(Args)]
pub struct SetShopCmd {
    /// Shop domain
    pub shop: String,
}

#[derive(Args)]
pub struct SetTokenCmd {
    /// Admin API access token (shpat_...)
    pub token: String,
}

#[derive(Args)]
pub struct SetApiVersionCmd {
    /// API version (e.g. 2025-01)
    pub version: String,
}

#[derive(Args)]
pub struct SetDatabaseCmd {
    /// Database file path
    pub path: PathBuf,
}

impl ConfigCmd {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            ConfigSubCmd::SetShop(cmd) => {
                let shop = normalize_shop(&cmd.shop)?;
                let mut config = AppConfig::load()?;
                config.shop = Some(shop.clone());
                config.save()?;
                println!("Shop set to: {}", shop);
            }
            ConfigSubCmd::SetToken(cmd) => {
                let mut config = AppConfig::load()?;
                config.access_token = Some(cmd.token.trim().to_string());
                config.save()?;
                println!("Access token saved.");
            }
            ConfigSubCmd::SetApiVersion(cmd) => {
                let mut config = AppConfig::load()?;
                config.api_version = cmd.version.trim().to_string();
                config.save()?;
                println!("API version set to: {}", config.api_version);
            }
            ConfigSubCmd::SetDatabase(cmd) => {
                let mut config = AppConfig::load()?;
                config.database_path = Some(cmd.path.clone());
                config.save()?;
                println!("Database set to: {}", cmd.path.display());
            }
            ConfigSubCmd::Show => {
                let config = AppConfig::load()?;
                println!("Config: {}", AppConfig::config_path()?.display());
                println!();
                println!("shop:         {}", config.shop.as_deref().unwrap_or("(not set)"));
                println!(
                    "access_token: {}",
                    if config.has_access_token() {
                        "(set)"
                    } else {
                        "(not set)"
                    }
                );
                println!("api_version:  {}", config.api_version);
                println!("database:     {}", config.database_path()?.display());
                println!("page_size:    {}", config.page_size);
                println!("concurrency:  {}", config.concurrency);
            }
        }
        Ok(())
    }
}
