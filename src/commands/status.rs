//! Status command - show tier and assignment counts for the shop.

use std::collections::BTreeMap;

use anyhow::Result;
use clap::Args;

use super::context::LocalContext;
use crate::cli::GlobalArgs;

#[derive(Args)]
pub struct StatusCmd {}

impl StatusCmd {
    pub async fn run(&self, global: &GlobalArgs) -> Result<()> {
        let ctx = LocalContext::open(global).await?;

        let active = ctx.db.count_active_tiers(&ctx.shop).await?;
        let total = ctx.catalog().all_tiers(&ctx.shop).await?.len();
        let assigned = ctx.store().list(&ctx.shop).await?;

        println!("Shop:        {}", ctx.shop);
        println!("Database:    {}", ctx.config.database_path()?.display());
        println!("Tiers:       {} active, {} total", active, total);
        println!("Assignments: {}", ctx.db.count_assignments(&ctx.shop).await?);

        let mut per_tier: BTreeMap<&str, usize> = BTreeMap::new();
        for entry in &assigned {
            *per_tier
                .entry(entry.tier_name.as_deref().unwrap_or("(deleted tier)"))
                .or_default() += 1;
        }
        for (name, count) in per_tier {
            println!("  {:<16} {}", name, count);
        }

        if !ctx.config.has_access_token() {
            println!();
            println!("No access token configured. Run: tiers config set-token <token>");
        }

        Ok(())
    }
}
