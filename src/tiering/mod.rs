//! Tier assignment and synchronization.
//!
//! Flow for one customer:
//! 1. [`AssignmentEngine`] fetches stats, matches them against the
//!    [`TierCatalog`] and upserts or clears the assignment
//! 2. [`SyncProjector`] rewrites the customer's `tier:` label from the
//!    stored assignment
//!
//! [`RecalculationSweep`] runs step 1 (optionally 2) for every customer of
//! a store; [`OrderTrigger`] runs both for the customer of a new order.

mod assignments;
mod catalog;
mod engine;
mod error;
pub mod labels;
mod matcher;
mod projector;
mod sweep;
mod trigger;

#[cfg(test)]
pub(crate) mod testing;

pub use assignments::{AssignedTier, AssignmentStore};
pub use catalog::TierCatalog;
pub use engine::AssignmentEngine;
pub use projector::SyncProjector;
pub use sweep::{RecalculationSweep, SweepControl, SweepOptions, SweepReport, DEFAULT_PAGE_SIZE};
pub use trigger::{OrderTrigger, TriggerReport};
