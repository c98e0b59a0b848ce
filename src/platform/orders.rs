//! Qualifying-order rule.
//!
//! Customer totals are recomputed from raw orders instead of the platform's
//! pre-aggregated lifetime fields, which skip test orders. An order counts
//! when it is not cancelled and its financial status is paid, partially
//! paid or partially refunded.

use crate::types::{CustomerStats, InvalidAmount, Money};

/// Financial statuses that make an order count toward tier thresholds.
pub const QUALIFYING_STATUSES: &[&str] = &["PAID", "PARTIALLY_PAID", "PARTIALLY_REFUNDED"];

/// The fields of an order that the rule looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderRecord {
    /// Decimal total in shop currency, e.g. `"129.90"`.
    pub total_price: Option<String>,
    /// Platform financial status, e.g. `PAID`.
    pub financial_status: Option<String>,
    pub cancelled: bool,
}

impl OrderRecord {
    pub fn is_qualifying(&self) -> bool {
        if self.cancelled {
            return false;
        }
        self.financial_status.as_deref().is_some_and(|status| {
            QUALIFYING_STATUSES
                .iter()
                .any(|q| q.eq_ignore_ascii_case(status.trim()))
        })
    }
}

/// Sum qualifying orders into [`CustomerStats`].
///
/// A qualifying order with no total counts as zero spend.
pub fn summarize<'a>(orders: impl IntoIterator<Item = &'a OrderRecord>) -> Result<CustomerStats, InvalidAmount> {
    let mut stats = CustomerStats::default();

    for order in orders.into_iter().filter(|o| o.is_qualifying()) {
        let amount = match order.total_price.as_deref() {
            Some(raw) => raw.parse::<Money>()?,
            None => Money::ZERO,
        };
        stats.total_spent = stats
            .total_spent
            .checked_add(amount)
            .ok_or_else(|| InvalidAmount(amount.to_string()))?;
        stats.total_orders += 1;
    }

    Ok(stats)
}
