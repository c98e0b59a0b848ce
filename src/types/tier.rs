use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Money;

/// One eligibility rule for a store.
///
/// Tiers are evaluated highest `priority` first; the first tier whose
/// thresholds are both met wins. Thresholds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDefinition {
    pub id: String,

    /// Store (shop domain) the tier belongs to.
    pub shop: String,

    /// Display name, also the source of the customer label (`tier:<name>`).
    pub name: String,

    pub description: Option<String>,

    /// Minimum qualifying spend.
    pub min_spent: Money,

    /// Minimum number of qualifying orders.
    pub min_orders: u32,

    /// Discount granted to members, 0-100.
    pub discount_percentage: u8,

    /// Higher is evaluated first.
    pub priority: u32,

    pub active: bool,

    /// Secondary ordering key for tiers that share a priority.
    pub created_at: DateTime<Utc>,
}

impl TierDefinition {
    /// Whether `stats` reaches both thresholds of this tier.
    pub fn is_met_by(&self, stats: &CustomerStats) -> bool {
        stats.total_spent >= self.min_spent && stats.total_orders >= self.min_orders
    }
}

/// The tier currently held by one customer of one store.
///
/// At most one exists per (shop, customer_id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerAssignment {
    pub id: String,
    pub shop: String,
    /// Platform customer id (opaque, e.g. `gid://shopify/Customer/42`).
    pub customer_id: String,
    pub tier_id: String,
    pub assigned_at: DateTime<Utc>,
}

/// Aggregate purchase history over qualifying orders only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerStats {
    pub total_spent: Money,
    pub total_orders: u32,
}

#[cfg(test)]
impl CustomerStats {
    pub fn new(total_spent: Money, total_orders: u32) -> Self {
        Self {
            total_spent,
            total_orders,
        }
    }
}
