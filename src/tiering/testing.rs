//! In-memory platform and tier fixtures for tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::db::{CreateTier, TierDb};
use crate::platform::client::CustomerPage;
use crate::platform::{CustomerEnumerator, CustomerStatsSource, ExternalLabelStore, PlatformError};
use crate::types::{CustomerStats, Money, TierDefinition};

/// Tier definition with whole-unit thresholds.
pub fn tier(id: &str, priority: u32, min_spent: u32, min_orders: u32) -> TierDefinition {
    TierDefinition {
        id: id.to_string(),
        shop: "shop".to_string(),
        name: id.to_string(),
        description: None,
        min_spent: Money::whole(min_spent),
        min_orders,
        discount_percentage: 10,
        priority,
        active: true,
        created_at: Utc::now(),
    }
}

/// Insert an active tier, returning its id.
pub async fn create_tier(
    db: &TierDb,
    shop: &str,
    name: &str,
    min_spent: u32,
    min_orders: u32,
    priority: u32,
) -> String {
    db.insert_tier(&CreateTier {
        shop: shop.to_string(),
        name: name.to_string(),
        description: None,
        min_spent: Money::whole(min_spent),
        min_orders,
        discount_percentage: 5,
        priority,
        active: true,
    })
    .await
    .unwrap()
}

#[derive(Default)]
struct State {
    stats: HashMap<String, CustomerStats>,
    failing_stats: HashSet<String>,
    labels: HashMap<String, Vec<String>>,
    failing_writes: HashSet<String>,
    writes: usize,
    customers: Vec<String>,
    failing_pages: HashSet<usize>,
    pages_requested: usize,
}

/// Stats source, customer enumerator and label store in one.
///
/// Clones share state. Page cursors are page indexes.
#[derive(Clone, Default)]
pub struct FakePlatform {
    state: Arc<Mutex<State>>,
}

impl FakePlatform {
    pub fn set_stats(&self, customer: &str, spent: &str, orders: u32) {
        let stats = CustomerStats::new(spent.parse().unwrap(), orders);
        let mut state = self.state.lock().unwrap();
        state.failing_stats.remove(customer);
        state.stats.insert(customer.to_string(), stats);
    }

    /// Make stats fetches for `customer` fail with a transient error.
    pub fn fail_stats(&self, customer: &str) {
        self.state.lock().unwrap().failing_stats.insert(customer.to_string());
    }

    pub fn set_labels(&self, customer: &str, labels: &[&str]) {
        self.state
            .lock()
            .unwrap()
            .labels
            .insert(customer.to_string(), labels.iter().map(|l| l.to_string()).collect());
    }

    pub fn labels(&self, customer: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .labels
            .get(customer)
            .cloned()
            .unwrap_or_default()
    }

    /// Make label writes for `customer` fail with a rejection.
    pub fn fail_writes(&self, customer: &str) {
        self.state.lock().unwrap().failing_writes.insert(customer.to_string());
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().unwrap().writes
    }

    pub fn set_customers(&self, customers: &[String]) {
        self.state.lock().unwrap().customers = customers.to_vec();
    }

    /// Make the page with this index fail.
    pub fn fail_page(&self, index: usize) {
        self.state.lock().unwrap().failing_pages.insert(index);
    }

    pub fn pages_requested(&self) -> usize {
        self.state.lock().unwrap().pages_requested
    }
}

fn unavailable() -> PlatformError {
    PlatformError::Status {
        status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
        body: "unavailable".to_string(),
    }
}

impl CustomerStatsSource for FakePlatform {
    async fn fetch_stats(&self, customer_id: &str) -> Result<CustomerStats, PlatformError> {
        let state = self.state.lock().unwrap();
        if state.failing_stats.contains(customer_id) {
            return Err(unavailable());
        }
        state
            .stats
            .get(customer_id)
            .copied()
            .ok_or_else(|| PlatformError::NotFound(customer_id.to_string()))
    }
}

impl CustomerEnumerator for FakePlatform {
    async fn page(&self, cursor: Option<&str>, page_size: usize) -> Result<CustomerPage, PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.pages_requested += 1;

        let index: usize = cursor.map(|c| c.parse().unwrap()).unwrap_or(0);
        if state.failing_pages.contains(&index) {
            return Err(unavailable());
        }

        let start = index * page_size;
        let end = (start + page_size).min(state.customers.len());
        let customer_ids = state.customers.get(start..end).unwrap_or_default().to_vec();
        let next_cursor = (end < state.customers.len()).then(|| (index + 1).to_string());

        Ok(CustomerPage {
            customer_ids,
            next_cursor,
        })
    }
}

impl ExternalLabelStore for FakePlatform {
    async fn read_labels(&self, customer_id: &str) -> Result<Vec<String>, PlatformError> {
        self.state
            .lock()
            .unwrap()
            .labels
            .get(customer_id)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(customer_id.to_string()))
    }

    async fn write_labels(&self, customer_id: &str, labels: &[String]) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_writes.contains(customer_id) {
            return Err(PlatformError::UserErrors(vec!["rejected".to_string()]));
        }
        state.writes += 1;
        state.labels.insert(customer_id.to_string(), labels.to_vec());
        Ok(())
    }
}
