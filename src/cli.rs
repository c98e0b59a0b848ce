//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::{
    AssignmentsCmd, ConfigCmd, OrderCreatedCmd, ProcessCmd, RecalculateCmd, StatusCmd, SyncCmd,
    TiersCmd,
};

#[derive(Parser)]
#[command(name = "tiers")]
#[command(about = "Tiers - customer loyalty tier assignment and label sync")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Overrides for the stored configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Shop domain (e.g. acme.myshopify.com)
    #[arg(long, global = true, env = "TIERS_SHOP")]
    pub shop: Option<String>,

    /// Admin API access token
    #[arg(long, global = true, env = "TIERS_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// SQLite database path
    #[arg(long, global = true, env = "TIERS_DATABASE")]
    pub database: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Recompute the tier of every customer in the shop
    Recalculate(RecalculateCmd),

    /// Push stored assignments to customer tier labels
    Sync(SyncCmd),

    /// Assign and sync a single customer
    Process(ProcessCmd),

    /// Handle an order-created notification body
    OrderCreated(OrderCreatedCmd),

    /// List or create tier definitions
    Tiers(TiersCmd),

    /// Show stored customer assignments
    Assignments(AssignmentsCmd),

    /// Show tier and assignment counts
    Status(StatusCmd),

    /// Manage configuration (shop, token, etc.)
    Config(ConfigCmd),
}

impl Command {
    pub async fn execute(&self, global: &GlobalArgs) -> anyhow::Result<()> {
        match self {
            Command::Recalculate(cmd) => cmd.run(global).await,
            Command::Sync(cmd) => cmd.run(global).await,
            Command::Process(cmd) => cmd.run(global).await,
            Command::OrderCreated(cmd) => cmd.run(global).await,
            Command::Tiers(cmd) => cmd.run(global).await,
            Command::Assignments(cmd) => cmd.run(global).await,
            Command::Status(cmd) => cmd.run(global).await,
            Command::Config(cmd) => cmd.run().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tiers",
            "status",
            "--shop",
            "acme.myshopify.com",
            "--database",
            "/tmp/t.sqlite",
        ])
        .unwrap();
        assert_eq!(cli.global.shop.as_deref(), Some("acme.myshopify.com"));
        assert_eq!(cli.global.database, Some(PathBuf::from("/tmp/t.sqlite")));
        assert!(matches!(cli.command, Command::Status(_)));
    }

    #[test]
    fn test_recalculate_flags() {
        let cli = Cli::try_parse_from(["tiers", "recalculate", "--sync", "-j", "4"]).unwrap();
        match cli.command {
            Command::Recalculate(cmd) => {
                assert!(cmd.sync);
                assert_eq!(cmd.concurrency, Some(4));
                assert_eq!(cmd.page_size, None);
            }
            _ => panic!("expected recalculate"),
        }
    }
}
