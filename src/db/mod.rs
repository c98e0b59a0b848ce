//! SQLite persistence for tier definitions and customer assignments.
//!
//! Two tables:
//! - `tiers` - eligibility rules per shop
//! - `assignments` - current tier per (shop, customer), unique on that pair

mod models;
mod tier_db;

pub use models::{
    AssignmentRow, AssignmentWithTier, ClearOutcome, CreateTier, TierRow, UpsertOutcome,
};
pub use tier_db::TierDb;
