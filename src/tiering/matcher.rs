//! Pure tier selection.

use crate::types::{CustomerStats, TierDefinition};

/// First tier in `ordered` whose thresholds `stats` meets.
///
/// `ordered` must already be in evaluation order (see
/// [`super::catalog::order_by_priority`]), so the first hit is the
/// highest-priority qualifying tier.
pub fn match_tier<'a>(stats: &CustomerStats, ordered: &'a [TierDefinition]) -> Option<&'a TierDefinition> {
    ordered.iter().find(|tier| tier.is_met_by(stats))
}
