//! Recalculate command - recompute every customer's tier.

use anyhow::Result;
use clap::Args;

use super::context::PlatformContext;
use crate::cli::GlobalArgs;
use crate::tiering::{RecalculationSweep, SweepControl, SweepOptions, SweepReport};

#[derive(Args)]
pub struct RecalculateCmd {
    /// Also push tier labels after each customer
    #[arg(long)]
    pub sync: bool,

    /// Customers fetched per page, at most 250 (default: from config)
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Customers processed concurrently (default: from config)
    #[arg(long, short = 'j')]
    pub concurrency: Option<usize>,
}

impl RecalculateCmd {
    pub async fn run(&self, global: &GlobalArgs) -> Result<()> {
        let ctx = PlatformContext::open(global).await?;
        let engine = ctx.engine();
        let projector = ctx.projector();

        let options = SweepOptions {
            page_size: self.page_size.unwrap_or(ctx.local.config.page_size),
            concurrency: self.concurrency.unwrap_or(ctx.local.config.concurrency),
            sync_labels: self.sync,
        };

        let control = SweepControl::default();
        let stopper = control.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nStopping after the current page...");
                stopper.stop();
            }
        });

        println!("Recalculating tiers for {}", ctx.shop());

        let sweep = RecalculationSweep::new(&engine, &ctx.admin, Some(&projector), options)
            .with_control(control);

        match sweep.run(ctx.shop()).await {
            Ok(report) => {
                print_report(&report);
                Ok(())
            }
            Err(aborted) => {
                print_report(&aborted.report);
                Err(aborted.into())
            }
        }
    }
}

fn print_report(report: &SweepReport) {
    println!();
    if report.stopped {
        println!("Stopped early.");
    }
    println!("Processed: {}", report.processed);
    println!("Updated:   {}", report.updated);
    println!("Errors:    {}", report.errors);
}
