//! Durable (shop, customer) -> tier assignments.
//!
//! All mutations are idempotent: repeating a call with the same arguments
//! leaves the table as the first call did.

use tracing::{debug, info};

use super::catalog::{ensure_store, parse_timestamp};
use super::error::TierError;
use crate::db::{AssignmentRow, AssignmentWithTier, ClearOutcome, TierDb, UpsertOutcome};
use crate::types::CustomerAssignment;

/// An assignment together with the current name of its tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedTier {
    pub assignment: CustomerAssignment,
    /// `None` if the tier was deleted after assignment.
    pub tier_name: Option<String>,
}

#[derive(Clone)]
pub struct AssignmentStore {
    db: TierDb,
}

impl AssignmentStore {
    pub fn new(db: TierDb) -> Self {
        Self { db }
    }

    /// Set the customer's tier; a no-op if it already holds `tier_id`.
    pub async fn upsert(&self, shop: &str, customer_id: &str, tier_id: &str) -> Result<UpsertOutcome, TierError> {
        ensure_store(shop)?;

        let outcome = self.db.upsert_assignment(shop, customer_id, tier_id).await?;
        match outcome {
            UpsertOutcome::Inserted => info!(shop, customer = customer_id, tier = tier_id, "assigned tier"),
            UpsertOutcome::Replaced => info!(shop, customer = customer_id, tier = tier_id, "changed tier"),
            UpsertOutcome::Unchanged => debug!(shop, customer = customer_id, tier = tier_id, "tier unchanged"),
        }
        Ok(outcome)
    }

    /// Drop the customer's assignment, if any.
    pub async fn clear(&self, shop: &str, customer_id: &str) -> Result<ClearOutcome, TierError> {
        ensure_store(shop)?;

        let outcome = self.db.clear_assignment(shop, customer_id).await?;
        match outcome {
            ClearOutcome::Removed => info!(shop, customer = customer_id, "removed tier"),
            ClearOutcome::Absent => debug!(shop, customer = customer_id, "no tier to remove"),
        }
        Ok(outcome)
    }

    #[allow(dead_code)]
    pub async fn find(&self, shop: &str, customer_id: &str) -> Result<Option<CustomerAssignment>, TierError> {
        Ok(self
            .find_with_tier(shop, customer_id)
            .await?
            .map(|assigned| assigned.assignment))
    }

    /// Look up the assignment and its tier name.
    ///
    /// Fails with [`TierError::Consistency`] if more than one row exists.
    pub async fn find_with_tier(&self, shop: &str, customer_id: &str) -> Result<Option<AssignedTier>, TierError> {
        ensure_store(shop)?;

        let rows = self.db.find_assignments(shop, customer_id).await?;
        at_most_one(shop, customer_id, rows)?
            .map(AssignedTier::try_from)
            .transpose()
    }

    /// Every assignment of `shop`, oldest first.
    pub async fn list(&self, shop: &str) -> Result<Vec<AssignedTier>, TierError> {
        ensure_store(shop)?;

        self.db
            .list_assignments(shop)
            .await?
            .into_iter()
            .map(AssignedTier::try_from)
            .collect()
    }
}

fn at_most_one<T>(shop: &str, customer_id: &str, mut rows: Vec<T>) -> Result<Option<T>, TierError> {
    if rows.len() > 1 {
        return Err(TierError::Consistency {
            shop: shop.to_string(),
            customer: customer_id.to_string(),
            rows: rows.len(),
        });
    }
    Ok(rows.pop())
}

impl TryFrom<AssignmentRow> for CustomerAssignment {
    type Error = TierError;

    fn try_from(row: AssignmentRow) -> Result<Self, Self::Error> {
        Ok(CustomerAssignment {
            assigned_at: parse_timestamp(&row.assigned_at)?,
            id: row.id,
            shop: row.shop,
            customer_id: row.customer_id,
            tier_id: row.tier_id,
        })
    }
}

impl TryFrom<AssignmentWithTier> for AssignedTier {
    type Error = TierError;

    fn try_from(row: AssignmentWithTier) -> Result<Self, Self::Error> {
        let (row, tier_name) = row.into_parts();
        Ok(AssignedTier {
            assignment: CustomerAssignment::try_from(row)?,
            tier_name,
        })
    }
}
