//! Bulk recalculation over every customer of a store.
//!
//! Pages through the platform's customer list and runs the assignment
//! engine once per customer. A failing customer is counted and skipped;
//! only a failed page fetch ends the sweep early.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{info, warn};

use super::engine::AssignmentEngine;
use super::error::TierError;
use super::projector::SyncProjector;
use crate::platform::{CustomerEnumerator, CustomerStatsSource, ExternalLabelStore};

pub const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Copy)]
pub struct SweepOptions {
    /// Customers requested per page.
    pub page_size: usize,
    /// Customers processed at once within a page. 1 is fully sequential.
    pub concurrency: usize,
    /// Also project labels after each successful transition.
    pub sync_labels: bool,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            concurrency: 1,
            sync_labels: false,
        }
    }
}

/// Stop handle for a running sweep. The current page finishes first.
#[derive(Debug, Clone, Default)]
pub struct SweepControl {
    stopped: Arc<AtomicBool>,
}

impl SweepControl {
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Customers attempted.
    pub processed: usize,
    /// Customers that ended up holding a tier.
    pub updated: usize,
    /// Customers whose transition (or label sync) failed.
    pub errors: usize,
    pub pages: usize,
    /// True if the sweep was stopped before the last page.
    pub stopped: bool,
}

/// A page fetch failed; `report` has the counts up to that point.
#[derive(Debug, Error)]
#[error("customer enumeration failed after {} customers: {source}", .report.processed)]
pub struct SweepAborted {
    pub report: SweepReport,
    #[source]
    pub source: TierError,
}

enum CustomerResult {
    Assigned,
    Unassigned,
    Failed,
}

pub struct RecalculationSweep<'a, S, E, L> {
    engine: &'a AssignmentEngine<S>,
    enumerator: &'a E,
    projector: Option<&'a SyncProjector<L>>,
    options: SweepOptions,
    control: SweepControl,
}

impl<'a, S, E, L> RecalculationSweep<'a, S, E, L>
where
    S: CustomerStatsSource,
    E: CustomerEnumerator,
    L: ExternalLabelStore,
{
    pub fn new(
        engine: &'a AssignmentEngine<S>,
        enumerator: &'a E,
        projector: Option<&'a SyncProjector<L>>,
        options: SweepOptions,
    ) -> Self {
        Self {
            engine,
            enumerator,
            projector,
            options,
            control: SweepControl::default(),
        }
    }

    pub fn with_control(mut self, control: SweepControl) -> Self {
        self.control = control;
        self
    }

    /// Recompute the tier of every customer in `shop`.
    pub async fn run(&self, shop: &str) -> Result<SweepReport, SweepAborted> {
        let page_size = self.options.page_size.max(1);
        let concurrency = self.options.concurrency.max(1);
        let mut report = SweepReport::default();
        let mut cursor: Option<String> = None;

        info!(shop, page_size, concurrency, "starting recalculation");

        loop {
            if self.control.is_stopped() {
                info!(shop, processed = report.processed, "recalculation stopped");
                report.stopped = true;
                break;
            }

            let page = match self.enumerator.page(cursor.as_deref(), page_size).await {
                Ok(page) => page,
                Err(e) => {
                    let source = TierError::from(e);
                    warn!(shop, processed = report.processed, error = %source, "customer page fetch failed");
                    return Err(SweepAborted { report, source });
                }
            };
            report.pages += 1;

            let results: Vec<CustomerResult> = stream::iter(page.customer_ids.iter())
                .map(|customer| self.process_customer(shop, customer))
                .buffer_unordered(concurrency)
                .collect()
                .await;

            for result in results {
                report.processed += 1;
                match result {
                    CustomerResult::Assigned => report.updated += 1,
                    CustomerResult::Unassigned => {}
                    CustomerResult::Failed => report.errors += 1,
                }
            }

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        info!(
            shop,
            processed = report.processed,
            updated = report.updated,
            errors = report.errors,
            "recalculation complete"
        );
        Ok(report)
    }

    async fn process_customer(&self, shop: &str, customer: &str) -> CustomerResult {
        let transition = match self.engine.evaluate(shop, customer).await {
            Ok(transition) => transition,
            Err(e) => {
                warn!(shop, customer, transient = e.is_transient(), error = %e, "tier evaluation failed");
                return CustomerResult::Failed;
            }
        };

        if let Some(projector) = self.projector.filter(|_| self.options.sync_labels) {
            if let Err(e) = projector.project(shop, customer).await {
                warn!(shop, customer, error = %e, "label sync failed");
                return CustomerResult::Failed;
            }
        }

        if transition.is_assigned() {
            CustomerResult::Assigned
        } else {
            CustomerResult::Unassigned
        }
    }
}
