//! Row models for the tier database.

use sqlx::FromRow;

use crate::types::Money;

// ============================================================================
// Tier Models
// ============================================================================

/// A tier row as stored.
#[derive(Debug, Clone, FromRow)]
pub struct TierRow {
    pub id: String,
    pub shop: String,
    pub name: String,
    pub description: Option<String>,
    pub min_spent_units: i64,
    pub min_orders: i64,
    pub discount_percentage: i64,
    pub priority: i64,
    pub active: bool,
    pub created_at: String,
}

/// Input for creating a tier.
#[derive(Debug, Clone)]
pub struct CreateTier {
    pub shop: String,
    pub name: String,
    pub description: Option<String>,
    pub min_spent: Money,
    pub min_orders: u32,
    pub discount_percentage: u8,
    pub priority: u32,
    pub active: bool,
}

// ============================================================================
// Assignment Models
// ============================================================================

/// An assignment row as stored.
#[derive(Debug, Clone, FromRow)]
pub struct AssignmentRow {
    pub id: String,
    pub shop: String,
    pub customer_id: String,
    pub tier_id: String,
    pub assigned_at: String,
}

/// Assignment joined with the name of its tier.
///
/// `tier_name` is `None` when the tier row no longer exists.
#[derive(Debug, Clone, FromRow)]
pub struct AssignmentWithTier {
    pub id: String,
    pub shop: String,
    pub customer_id: String,
    pub tier_id: String,
    pub assigned_at: String,
    pub tier_name: Option<String>,
}

impl AssignmentWithTier {
    pub fn into_parts(self) -> (AssignmentRow, Option<String>) {
        let row = AssignmentRow {
            id: self.id,
            shop: self.shop,
            customer_id: self.customer_id,
            tier_id: self.tier_id,
            assigned_at: self.assigned_at,
        };
        (row, self.tier_name)
    }
}

/// What a conditional upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No row existed; one was created.
    Inserted,
    /// A row with a different tier existed; tier and timestamp replaced.
    Replaced,
    /// The row already held this tier; nothing was written.
    Unchanged,
}

/// What a clear did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    Removed,
    Absent,
}
