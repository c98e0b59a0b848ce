//! CLI command implementations.

mod assignments;
mod config;
mod context;
mod order_created;
mod process;
mod recalculate;
mod status;
mod sync;
mod tiers;

pub use assignments::AssignmentsCmd;
pub use config::ConfigCmd;
pub use order_created::OrderCreatedCmd;
pub use process::ProcessCmd;
pub use recalculate::RecalculateCmd;
pub use status::StatusCmd;
pub use sync::SyncCmd;
pub use tiers::TiersCmd;
