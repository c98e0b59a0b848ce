//! Sync command - push stored assignments to customer labels.

use anyhow::Result;
use clap::Args;

use super::context::PlatformContext;
use crate::cli::GlobalArgs;

#[derive(Args)]
pub struct SyncCmd {}

impl SyncCmd {
    pub async fn run(&self, global: &GlobalArgs) -> Result<()> {
        let ctx = PlatformContext::open(global).await?;
        let report = ctx.projector().sync_all(ctx.shop()).await?;

        println!("Synced:  {} ({} rewritten)", report.synced, report.written);
        println!("Errors:  {}", report.errors);
        Ok(())
    }
}
