//! Order-created command - handle a notification body from a file or stdin.
//!
//! Exits successfully whatever happens to the customer, so a delivery
//! pipeline never retries; failures are printed and logged.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::AsyncReadExt;
use tracing::error;

use super::context::PlatformContext;
use crate::cli::GlobalArgs;
use crate::tiering::{OrderTrigger, TriggerReport};

#[derive(Args)]
pub struct OrderCreatedCmd {
    /// JSON body file, or `-` for stdin
    #[arg(default_value = "-")]
    pub input: PathBuf,
}

impl OrderCreatedCmd {
    pub async fn run(&self, global: &GlobalArgs) -> Result<()> {
        match self.handle(global).await {
            Ok(report) => println!("{}", report),
            Err(e) => {
                error!(error = %format!("{:#}", e), "order notification not processed");
                println!("not processed: {:#}", e);
            }
        }
        Ok(())
    }

    async fn handle(&self, global: &GlobalArgs) -> Result<TriggerReport> {
        let body = self.read_body().await?;
        let ctx = PlatformContext::open(global).await?;
        let engine = ctx.engine();
        let projector = ctx.projector();

        Ok(OrderTrigger::new(&engine, &projector)
            .handle(ctx.shop(), &body)
            .await)
    }

    async fn read_body(&self) -> Result<Vec<u8>> {
        if self.input.as_os_str() == "-" {
            let mut body = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut body)
                .await
                .context("Failed to read stdin")?;
            return Ok(body);
        }

        tokio::fs::read(&self.input)
            .await
            .with_context(|| format!("Failed to read {}", self.input.display()))
    }
}
