//! Process command - assign and sync one customer.

use anyhow::{bail, Result};
use clap::Args;

use super::context::PlatformContext;
use crate::cli::GlobalArgs;
use crate::platform::customer_gid;
use crate::tiering::OrderTrigger;

#[derive(Args)]
pub struct ProcessCmd {
    /// Customer id, numeric or gid://shopify/Customer/<n>
    pub customer: String,
}

impl ProcessCmd {
    pub async fn run(&self, global: &GlobalArgs) -> Result<()> {
        let ctx = PlatformContext::open(global).await?;
        let engine = ctx.engine();
        let projector = ctx.projector();

        let trigger = OrderTrigger::new(&engine, &projector);
        let report = trigger
            .process_customer(ctx.shop(), None, customer_gid(&self.customer))
            .await;

        println!("{}", report);
        if !report.is_clean() {
            bail!("Customer {} was not fully processed", self.customer);
        }
        Ok(())
    }
}
