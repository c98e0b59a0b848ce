//! Assignments command - show stored customer assignments.

use anyhow::Result;
use clap::Args;

use super::context::LocalContext;
use crate::cli::GlobalArgs;
use crate::platform::customer_gid;
use crate::tiering::AssignedTier;

#[derive(Args)]
pub struct AssignmentsCmd {
    /// Show only this customer (numeric id or gid)
    #[arg(long)]
    pub customer: Option<String>,
}

impl AssignmentsCmd {
    pub async fn run(&self, global: &GlobalArgs) -> Result<()> {
        let ctx = LocalContext::open(global).await?;
        let store = ctx.store();

        if let Some(customer) = &self.customer {
            let customer_id = customer_gid(customer);
            match store.find_with_tier(&ctx.shop, &customer_id).await? {
                Some(assigned) => print_row(&assigned),
                None => println!("{} has no tier", customer_id),
            }
            return Ok(());
        }

        let assigned = store.list(&ctx.shop).await?;
        if assigned.is_empty() {
            println!("No assignments. Run: tiers recalculate");
            return Ok(());
        }

        for entry in &assigned {
            print_row(entry);
        }
        println!();
        println!("{} customers assigned", assigned.len());
        Ok(())
    }
}

fn print_row(entry: &AssignedTier) {
    println!(
        "{:<40} {:<16} {}",
        entry.assignment.customer_id,
        entry.tier_name.as_deref().unwrap_or("(deleted tier)"),
        entry.assignment.assigned_at.format("%Y-%m-%d %H:%M:%S")
    );
}
