//! Active tier definitions of a store, in evaluation order.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::error::TierError;
use crate::db::{TierDb, TierRow};
use crate::types::{Money, TierDefinition};

/// Read-only view over the tier table.
#[derive(Clone)]
pub struct TierCatalog {
    db: TierDb,
}

impl TierCatalog {
    pub fn new(db: TierDb) -> Self {
        Self { db }
    }

    /// Active tiers of `shop`, highest priority first.
    ///
    /// Tiers with equal priority keep creation order. A store without active
    /// tiers yields an empty list; only a blank store id is an error.
    pub async fn load_active_tiers(&self, shop: &str) -> Result<Vec<TierDefinition>, TierError> {
        ensure_store(shop)?;

        let rows = self.db.active_tiers(shop).await?;
        let mut tiers = rows
            .into_iter()
            .map(TierDefinition::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        order_by_priority(&mut tiers);

        debug!(shop, tiers = tiers.len(), "loaded active tiers");
        Ok(tiers)
    }

    /// Every tier of `shop`, including inactive ones, in evaluation order.
    pub async fn all_tiers(&self, shop: &str) -> Result<Vec<TierDefinition>, TierError> {
        ensure_store(shop)?;

        let rows = self.db.list_tiers(shop).await?;
        let mut tiers = rows
            .into_iter()
            .map(TierDefinition::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        order_by_priority(&mut tiers);
        Ok(tiers)
    }
}

pub(crate) fn ensure_store(shop: &str) -> Result<(), TierError> {
    if shop.trim().is_empty() {
        return Err(TierError::StoreNotFound(shop.to_string()));
    }
    Ok(())
}

/// Sort descending by priority. The sort is stable, so ties keep the
/// incoming (creation) order.
pub fn order_by_priority(tiers: &mut [TierDefinition]) {
    tiers.sort_by(|a, b| b.priority.cmp(&a.priority));
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, TierError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| TierError::Validation(format!("bad timestamp {:?}: {}", raw, e)))
}

fn non_negative<T: TryFrom<i64>>(value: i64, field: &str, id: &str) -> Result<T, TierError> {
    T::try_from(value)
        .map_err(|_| TierError::Validation(format!("tier {}: {} out of range ({})", id, field, value)))
}

impl TryFrom<TierRow> for TierDefinition {
    type Error = TierError;

    fn try_from(row: TierRow) -> Result<Self, Self::Error> {
        let min_spent = Money::from_units(row.min_spent_units)
            .map_err(|e| TierError::Validation(format!("tier {}: {}", row.id, e)))?;
        let min_orders = non_negative(row.min_orders, "min_orders", &row.id)?;
        let discount_percentage: u8 = non_negative(row.discount_percentage, "discount_percentage", &row.id)?;
        if discount_percentage > 100 {
            return Err(TierError::Validation(format!(
                "tier {}: discount_percentage {} exceeds 100",
                row.id, discount_percentage
            )));
        }
        let priority = non_negative(row.priority, "priority", &row.id)?;
        let created_at = parse_timestamp(&row.created_at)?;

        Ok(TierDefinition {
            id: row.id,
            shop: row.shop,
            name: row.name,
            description: row.description,
            min_spent,
            min_orders,
            discount_percentage,
            priority,
            active: row.active,
            created_at,
        })
    }
}
