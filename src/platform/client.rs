//! Collaborator traits the tier engine consumes.
//!
//! A client is scoped to a single store, so none of these take a shop.

use std::future::Future;

use super::error::PlatformError;
use crate::types::CustomerStats;

/// One page of customer ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerPage {
    pub customer_ids: Vec<String>,
    /// Cursor for the following page, `None` on the last page.
    pub next_cursor: Option<String>,
}

/// Supplies purchase aggregates for one customer.
pub trait CustomerStatsSource: Send + Sync {
    /// Totals over qualifying orders only (see [`super::orders::summarize`]).
    ///
    /// Fails with [`PlatformError::NotFound`] for unknown customers.
    fn fetch_stats(&self, customer_id: &str) -> impl Future<Output = Result<CustomerStats, PlatformError>> + Send;
}

/// Cursor-paginated enumeration of every customer of the store.
pub trait CustomerEnumerator: Send + Sync {
    /// Fetch the page after `cursor` (`None` for the first page).
    fn page(&self, cursor: Option<&str>, page_size: usize) -> impl Future<Output = Result<CustomerPage, PlatformError>> + Send;
}

/// Tag-like labels attached to customers on the platform.
pub trait ExternalLabelStore: Send + Sync {
    fn read_labels(&self, customer_id: &str) -> impl Future<Output = Result<Vec<String>, PlatformError>> + Send;

    /// Replace the customer's full label set.
    fn write_labels(&self, customer_id: &str, labels: &[String]) -> impl Future<Output = Result<(), PlatformError>> + Send;
}
