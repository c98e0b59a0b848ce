//! Tiers command - list, create and toggle tier definitions.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use super::context::LocalContext;
use crate::cli::GlobalArgs;
use crate::db::CreateTier;
use crate::types::Money;

#[derive(Args)]
pub struct TiersCmd {
    #[command(subcommand)]
    pub command: TiersSubCmd,
}

#[derive(Subcommand)]
pub enum TiersSubCmd {
    /// List all tiers, highest priority first
    List,

    /// Create a tier
    Add(AddTierCmd),

    /// Make a tier eligible for matching again
    Enable(TierIdArg),

    /// Stop matching a tier; existing assignments stay until recalculated
    Disable(TierIdArg),
}

#[derive(Args)]
pub struct TierIdArg {
    /// Tier id as shown by `tiers list`
    pub id: String,
}

#[derive(Args)]
pub struct AddTierCmd {
    /// Display name; the customer label is derived from it
    pub name: String,

    /// Minimum total spent (e.g. 500 or 499.99)
    #[arg(long, default_value = "0")]
    pub min_spent: Money,

    /// Minimum number of qualifying orders
    #[arg(long, default_value = "0")]
    pub min_orders: u32,

    /// Discount percentage (0-100)
    #[arg(long, default_value = "0")]
    pub discount: u8,

    /// Higher wins when several tiers match
    #[arg(long, default_value = "0")]
    pub priority: u32,

    /// Optional description
    #[arg(long)]
    pub description: Option<String>,

    /// Create the tier inactive
    #[arg(long)]
    pub inactive: bool,
}

impl AddTierCmd {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("Tier name must not be empty");
        }
        if self.discount > 100 {
            bail!("Discount must be between 0 and 100, got {}", self.discount);
        }
        Ok(())
    }

    fn to_create(&self, shop: &str) -> CreateTier {
        CreateTier {
            shop: shop.to_string(),
            name: self.name.trim().to_string(),
            description: self.description.clone().filter(|d| !d.trim().is_empty()),
            min_spent: self.min_spent,
            min_orders: self.min_orders,
            discount_percentage: self.discount,
            priority: self.priority,
            active: !self.inactive,
        }
    }
}

impl TiersCmd {
    pub async fn run(&self, global: &GlobalArgs) -> Result<()> {
        match &self.command {
            TiersSubCmd::List => {
                let ctx = LocalContext::open(global).await?;
                let tiers = ctx.catalog().all_tiers(&ctx.shop).await?;

                if tiers.is_empty() {
                    println!("No tiers defined. Add one with: tiers tiers add <name>");
                    return Ok(());
                }

                println!(
                    "{:<36}  {:<16} {:>8} {:>12} {:>7} {:>9}  {}",
                    "ID", "NAME", "PRIORITY", "MIN SPENT", "ORDERS", "DISCOUNT", "STATUS"
                );
                for tier in &tiers {
                    println!(
                        "{:<36}  {:<16} {:>8} {:>12} {:>7} {:>8}%  {}",
                        tier.id,
                        tier.name,
                        tier.priority,
                        tier.min_spent.to_string(),
                        tier.min_orders,
                        tier.discount_percentage,
                        if tier.active { "active" } else { "inactive" }
                    );
                }
            }
            TiersSubCmd::Add(cmd) => {
                cmd.validate()?;
                let ctx = LocalContext::open(global).await?;
                let id = ctx.db.insert_tier(&cmd.to_create(&ctx.shop)).await?;
                println!("Created tier {} ({})", cmd.name.trim(), id);
            }
            TiersSubCmd::Enable(arg) => set_active(global, &arg.id, true).await?,
            TiersSubCmd::Disable(arg) => set_active(global, &arg.id, false).await?,
        }
        Ok(())
    }
}

async fn set_active(global: &GlobalArgs, id: &str, active: bool) -> Result<()> {
    let ctx = LocalContext::open(global).await?;
    if !ctx.db.set_tier_active(&ctx.shop, id, active).await? {
        bail!("No tier {} in {}", id, ctx.shop);
    }
    println!("Tier {} {}", id, if active { "enabled" } else { "disabled" });
    Ok(())
}
