//! Push assignment state out to platform customer labels.

use std::fmt;

use tracing::{debug, info, warn};

use super::assignments::AssignmentStore;
use super::error::TierError;
use super::labels::reconcile_labels;
use crate::platform::ExternalLabelStore;

/// Result of projecting one customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Labels were rewritten; `label` is the tier label now present.
    Written { label: Option<String> },
    /// Labels already matched.
    InSync { label: Option<String> },
}

impl Projection {
    pub fn label(&self) -> Option<&str> {
        match self {
            Projection::Written { label } | Projection::InSync { label } => label.as_deref(),
        }
    }

    pub fn wrote(&self) -> bool {
        matches!(self, Projection::Written { .. })
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self.label().unwrap_or("no tier");
        match self {
            Projection::Written { .. } => write!(f, "labels updated ({})", label),
            Projection::InSync { .. } => write!(f, "labels in sync ({})", label),
        }
    }
}

/// Counts from [`SyncProjector::sync_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Customers whose labels now match their assignment.
    pub synced: usize,
    /// Of those, customers whose labels had to be rewritten.
    pub written: usize,
    pub errors: usize,
}

/// Derives each customer's tier label from the assignment table.
pub struct SyncProjector<L> {
    store: AssignmentStore,
    labels: L,
}

impl<L: ExternalLabelStore> SyncProjector<L> {
    pub fn new(store: AssignmentStore, labels: L) -> Self {
        Self { store, labels }
    }

    /// Make the customer's labels reflect their current assignment.
    ///
    /// Writes only when the label set would change. Errors are returned,
    /// never retried here.
    pub async fn project(&self, shop: &str, customer_id: &str) -> Result<Projection, TierError> {
        let assigned = self.store.find_with_tier(shop, customer_id).await?;
        let tier_name = assigned.as_ref().and_then(|a| a.tier_name.as_deref());

        let current = self.labels.read_labels(customer_id).await?;
        let plan = reconcile_labels(&current, tier_name);
        if let (Some(name), None) = (tier_name, &plan.tier_label) {
            warn!(shop, customer = customer_id, tier = name, "tier name yields no label, leaving none");
        }

        if !plan.needs_write {
            debug!(shop, customer = customer_id, "labels already in sync");
            return Ok(Projection::InSync {
                label: plan.tier_label,
            });
        }

        self.labels.write_labels(customer_id, &plan.desired).await?;
        info!(
            shop,
            customer = customer_id,
            tier = tier_name.unwrap_or("none"),
            "synced tier label"
        );

        Ok(Projection::Written {
            label: plan.tier_label,
        })
    }

    /// Project every customer that currently holds an assignment.
    ///
    /// A failure for one customer is counted and the rest continue.
    pub async fn sync_all(&self, shop: &str) -> Result<SyncReport, TierError> {
        let assigned = self.store.list(shop).await?;
        info!(shop, customers = assigned.len(), "starting label sync");

        let mut report = SyncReport::default();
        for entry in &assigned {
            let customer = entry.assignment.customer_id.as_str();
            match self.project(shop, customer).await {
                Ok(projection) => {
                    report.synced += 1;
                    if projection.wrote() {
                        report.written += 1;
                    }
                }
                Err(e) => {
                    warn!(shop, customer, error = %e, "label sync failed");
                    report.errors += 1;
                }
            }
        }

        info!(
            shop,
            synced = report.synced,
            written = report.written,
            errors = report.errors,
            "label sync complete"
        );
        Ok(report)
    }
}
