//! Tier labels on customers, e.g. `tier:vip-gold`.
//!
//! The label set on the platform is a projection of the assignment table.
//! [`reconcile_labels`] computes the desired set from the observed one
//! without doing any I/O.

use std::collections::HashSet;

/// Prefix that marks a label as owned by the tier engine.
pub const TIER_LABEL_PREFIX: &str = "tier:";

/// Label for a tier name: lower-cased, whitespace runs collapsed to `-`.
///
/// Leading and trailing whitespace is dropped. `None` when the name has no
/// other characters, so a bare `tier:` is never produced.
pub fn tier_label(tier_name: &str) -> Option<String> {
    let slug = tier_name
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        return None;
    }
    Some(format!("{}{}", TIER_LABEL_PREFIX, slug))
}

/// The tier slug carried by a tier label, `None` for other labels.
pub fn parse_tier_label(label: &str) -> Option<&str> {
    label.strip_prefix(TIER_LABEL_PREFIX)
}

/// Desired label set for one customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPlan {
    /// Full label set to write.
    pub desired: Vec<String>,
    /// The tier label in `desired`, if any.
    pub tier_label: Option<String>,
    /// Whether `desired` differs from the observed set.
    pub needs_write: bool,
}

/// Strip every tier label from `current` and append the one for `tier_name`.
///
/// Non-tier labels keep their order. The comparison is set-based, so a
/// label set that only differs in order does not need a write.
pub fn reconcile_labels(current: &[String], tier_name: Option<&str>) -> LabelPlan {
    let mut desired: Vec<String> = current
        .iter()
        .filter(|label| parse_tier_label(label).is_none())
        .cloned()
        .collect();

    let tier_label = tier_name.and_then(tier_label);
    if let Some(label) = &tier_label {
        desired.push(label.clone());
    }

    let observed: HashSet<&str> = current.iter().map(String::as_str).collect();
    let wanted: HashSet<&str> = desired.iter().map(String::as_str).collect();

    LabelPlan {
        needs_write: observed != wanted,
        desired,
        tier_label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_tier_label_slug() {
        assert_eq!(tier_label("Gold").as_deref(), Some("tier:gold"));
        assert_eq!(tier_label("VIP  Gold\tMember").as_deref(), Some("tier:vip-gold-member"));
        assert_eq!(tier_label("Gold ").as_deref(), Some("tier:gold"));
        assert_eq!(tier_label("  Spaced  ").as_deref(), Some("tier:spaced"));
    }

    #[test]
    fn test_blank_name_has_no_label() {
        assert_eq!(tier_label(""), None);
        assert_eq!(tier_label(" \t "), None);

        let plan = reconcile_labels(&labels(&["tier:gold", "vip"]), Some("   "));
        assert_eq!(plan.desired, labels(&["vip"]));
        assert_eq!(plan.tier_label, None);
        assert!(plan.needs_write);
    }

    #[test]
    fn test_parse_tier_label() {
        assert_eq!(parse_tier_label("tier:gold"), Some("gold"));
        assert_eq!(parse_tier_label("wholesale"), None);
        assert_eq!(parse_tier_label("Tier:gold"), None);
    }

    #[test]
    fn test_adds_label_when_missing() {
        let plan = reconcile_labels(&labels(&["newsletter"]), Some("Gold"));
        assert_eq!(plan.desired, labels(&["newsletter", "tier:gold"]));
        assert_eq!(plan.tier_label.as_deref(), Some("tier:gold"));
        assert!(plan.needs_write);
    }

    #[test]
    fn test_replaces_old_tier_label() {
        let plan = reconcile_labels(&labels(&["tier:bronze", "newsletter"]), Some("Gold"));
        assert_eq!(plan.desired, labels(&["newsletter", "tier:gold"]));
        assert!(plan.needs_write);
    }

    #[test]
    fn test_strips_when_no_tier() {
        let plan = reconcile_labels(&labels(&["tier:gold", "tier:stale", "vip"]), None);
        assert_eq!(plan.desired, labels(&["vip"]));
        assert_eq!(plan.tier_label, None);
        assert!(plan.needs_write);
    }

    #[test]
    fn test_already_in_sync() {
        let plan = reconcile_labels(&labels(&["tier:gold", "newsletter"]), Some("Gold"));
        assert!(!plan.needs_write);

        let plan = reconcile_labels(&labels(&["newsletter"]), None);
        assert!(!plan.needs_write);
        assert_eq!(plan.desired, labels(&["newsletter"]));

        let plan = reconcile_labels(&[], None);
        assert!(!plan.needs_write);
    }
}
