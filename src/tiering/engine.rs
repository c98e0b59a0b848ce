//! Per-customer tier transition: fetch stats, match, persist.

use std::fmt;

use tracing::{debug, info};

use super::assignments::AssignmentStore;
use super::catalog::TierCatalog;
use super::error::TierError;
use super::matcher::match_tier;
use crate::db::{ClearOutcome, UpsertOutcome};
use crate::platform::CustomerStatsSource;
use crate::types::CustomerStats;

/// Result of one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The customer qualifies for `tier_id`; `change` says what was written.
    Assigned { tier_id: String, change: UpsertOutcome },
    /// The customer qualifies for nothing and an assignment was dropped.
    Removed,
    /// The customer qualifies for nothing and had no assignment.
    StillUnassigned,
}

impl Transition {
    pub fn is_assigned(&self) -> bool {
        matches!(self, Transition::Assigned { .. })
    }

    pub fn tier_id(&self) -> Option<&str> {
        match self {
            Transition::Assigned { tier_id, .. } => Some(tier_id.as_str()),
            _ => None,
        }
    }

    /// Whether the stored assignment changed.
    pub fn changed(&self) -> bool {
        match self {
            Transition::Assigned { change, .. } => *change != UpsertOutcome::Unchanged,
            Transition::Removed => true,
            Transition::StillUnassigned => false,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Assigned {
                tier_id,
                change: UpsertOutcome::Unchanged,
            } => write!(f, "unchanged (tier {})", tier_id),
            Transition::Assigned { tier_id, .. } => write!(f, "assigned tier {}", tier_id),
            Transition::Removed => write!(f, "removed from all tiers"),
            Transition::StillUnassigned => write!(f, "still unassigned"),
        }
    }
}

/// Orchestrates one customer's tier. Does not touch external labels.
pub struct AssignmentEngine<S> {
    catalog: TierCatalog,
    store: AssignmentStore,
    stats: S,
}

impl<S: CustomerStatsSource> AssignmentEngine<S> {
    pub fn new(catalog: TierCatalog, store: AssignmentStore, stats: S) -> Self {
        Self {
            catalog,
            store,
            stats,
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &AssignmentStore {
        &self.store
    }

    /// Recompute the customer's tier from freshly fetched stats.
    ///
    /// Nothing is written unless stats and catalog were both loaded.
    pub async fn evaluate(&self, shop: &str, customer_id: &str) -> Result<Transition, TierError> {
        let stats = self.stats.fetch_stats(customer_id).await?;
        debug!(
            shop,
            customer = customer_id,
            total_spent = %stats.total_spent,
            total_orders = stats.total_orders,
            "fetched customer stats"
        );
        self.apply(shop, customer_id, &stats).await
    }

    /// Transition with already computed stats.
    pub async fn apply(&self, shop: &str, customer_id: &str, stats: &CustomerStats) -> Result<Transition, TierError> {
        let tiers = self.catalog.load_active_tiers(shop).await?;
        let matched = match_tier(stats, &tiers).map(|tier| tier.id.clone());

        let transition = match matched {
            Some(tier_id) => {
                let change = self.store.upsert(shop, customer_id, &tier_id).await?;
                Transition::Assigned { tier_id, change }
            }
            None => match self.store.clear(shop, customer_id).await? {
                ClearOutcome::Removed => Transition::Removed,
                ClearOutcome::Absent => Transition::StillUnassigned,
            },
        };

        let tier = transition.tier_id().unwrap_or("none");
        if transition.changed() {
            info!(shop, customer = customer_id, tier, outcome = %transition, "tier evaluated");
        } else {
            debug!(shop, customer = customer_id, tier, outcome = %transition, "tier evaluated");
        }
        Ok(transition)
    }
}
