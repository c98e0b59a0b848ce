//! Order-created notifications.
//!
//! Every notification is acknowledged, including ones that fail
//! internally: a rejected delivery would be redelivered, multiplying load.
//! Failures are logged and reported in [`TriggerReport`] instead.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

use super::engine::{AssignmentEngine, Transition};
use super::projector::{Projection, SyncProjector};
use crate::platform::{customer_gid, CustomerStatsSource, ExternalLabelStore};

/// The parts of an order notification the trigger reads.
#[derive(Debug, Deserialize)]
struct OrderPayload {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    customer: Option<OrderCustomer>,
}

#[derive(Debug, Deserialize)]
struct OrderCustomer {
    #[serde(default)]
    id: Value,
}

/// Ids arrive as JSON numbers or strings.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentStage {
    Succeeded(Transition),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStage {
    Succeeded(Projection),
    Failed(String),
    /// Not attempted because the assignment stage failed.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerReport {
    /// Nothing to do (no customer, unreadable payload).
    Ignored { reason: String },
    Processed {
        order_id: Option<String>,
        customer_id: String,
        assignment: AssignmentStage,
        sync: SyncStage,
    },
}

impl TriggerReport {
    /// True when every attempted stage succeeded.
    pub fn is_clean(&self) -> bool {
        match self {
            TriggerReport::Ignored { .. } => true,
            TriggerReport::Processed { assignment, sync, .. } => {
                matches!(assignment, AssignmentStage::Succeeded(_))
                    && matches!(sync, SyncStage::Succeeded(_))
            }
        }
    }
}

impl fmt::Display for TriggerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerReport::Ignored { reason } => write!(f, "ignored: {}", reason),
            TriggerReport::Processed {
                customer_id,
                assignment,
                sync,
                ..
            } => {
                write!(f, "{}: ", customer_id)?;
                match assignment {
                    AssignmentStage::Succeeded(t) => write!(f, "assignment succeeded ({})", t)?,
                    AssignmentStage::Failed(e) => write!(f, "assignment failed: {}", e)?,
                }
                match sync {
                    SyncStage::Succeeded(p) => write!(f, ", sync succeeded ({})", p),
                    SyncStage::Failed(e) => write!(f, ", sync failed: {}", e),
                    SyncStage::Skipped => write!(f, ", sync skipped"),
                }
            }
        }
    }
}

/// Runs the engine and then the projector for the customer of an order.
pub struct OrderTrigger<'a, S, L> {
    engine: &'a AssignmentEngine<S>,
    projector: &'a SyncProjector<L>,
}

impl<'a, S, L> OrderTrigger<'a, S, L>
where
    S: CustomerStatsSource,
    L: ExternalLabelStore,
{
    pub fn new(engine: &'a AssignmentEngine<S>, projector: &'a SyncProjector<L>) -> Self {
        Self { engine, projector }
    }

    /// Handle a raw order-created body. Never fails.
    pub async fn handle(&self, shop: &str, body: &[u8]) -> TriggerReport {
        let payload: OrderPayload = match serde_json::from_slice(body) {
            Ok(payload) => payload,
            Err(e) => {
                error!(shop, error = %e, "unreadable order notification");
                return TriggerReport::Ignored {
                    reason: format!("unreadable payload: {}", e),
                };
            }
        };

        let order_id = payload.id.as_ref().and_then(id_string);
        let Some(raw_customer) = payload.customer.as_ref().and_then(|c| id_string(&c.id)) else {
            info!(shop, order = order_id.as_deref().unwrap_or("?"), "order has no customer, skipping");
            return TriggerReport::Ignored {
                reason: "order has no customer".to_string(),
            };
        };

        let customer_id = customer_gid(&raw_customer);
        info!(shop, order = order_id.as_deref().unwrap_or("?"), customer = %customer_id, "processing order");

        self.process_customer(shop, order_id, customer_id).await
    }

    /// Engine then projector for one customer. Never fails.
    pub async fn process_customer(&self, shop: &str, order_id: Option<String>, customer_id: String) -> TriggerReport {
        let assignment = match self.engine.evaluate(shop, &customer_id).await {
            Ok(transition) => AssignmentStage::Succeeded(transition),
            Err(e) => {
                error!(
                    shop,
                    customer = %customer_id,
                    transient = e.is_transient(),
                    error = %e,
                    "tier assignment failed"
                );
                AssignmentStage::Failed(e.to_string())
            }
        };

        let sync = match assignment {
            AssignmentStage::Failed(_) => SyncStage::Skipped,
            AssignmentStage::Succeeded(_) => match self.projector.project(shop, &customer_id).await {
                Ok(projection) => SyncStage::Succeeded(projection),
                Err(e) => {
                    warn!(shop, customer = %customer_id, error = %e, "tier assigned but label sync failed");
                    SyncStage::Failed(e.to_string())
                }
            },
        };

        TriggerReport::Processed {
            order_id,
            customer_id,
            assignment,
            sync,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::TierDb;
    use crate::tiering::assignments::AssignmentStore;
    use crate::tiering::catalog::TierCatalog;
    use crate::tiering::testing::{create_tier, FakePlatform};

    struct Fixture {
        db: TierDb,
        platform: FakePlatform,
        engine: AssignmentEngine<FakePlatform>,
        projector: SyncProjector<FakePlatform>,
    }

    async fn fixture() -> Fixture {
        let db = TierDb::in_memory().await.unwrap();
        let platform = FakePlatform::default();
        let engine = AssignmentEngine::new(
            TierCatalog::new(db.clone()),
            AssignmentStore::new(db.clone()),
            platform.clone(),
        );
        let projector = SyncProjector::new(AssignmentStore::new(db.clone()), platform.clone());
        Fixture {
            db,
            platform,
            engine,
            projector,
        }
    }

    const GID: &str = "gid://shopify/Customer/42";

    #[tokio::test]
    async fn test_numeric_customer_id_assigned_and_synced() {
        let f = fixture().await;
        create_tier(&f.db, "shop", "Gold", 500, 5, 10).await;
        f.platform.set_stats(GID, "750", 6);
        f.platform.set_labels(GID, &["newsletter"]);

        let trigger = OrderTrigger::new(&f.engine, &f.projector);
        let report = trigger
            .handle("shop", br#"{"id": 1001, "customer": {"id": 42}}"#)
            .await;

        assert!(report.is_clean());
        match &report {
            TriggerReport::Processed { order_id, customer_id, .. } => {
                assert_eq!(order_id.as_deref(), Some("1001"));
                assert_eq!(customer_id, GID);
            }
            other => panic!("unexpected report {:?}", other),
        }
        assert_eq!(f.platform.labels(GID), vec!["newsletter", "tier:gold"]);
    }

    #[tokio::test]
    async fn test_order_without_customer_is_ignored() {
        let f = fixture().await;
        let trigger = OrderTrigger::new(&f.engine, &f.projector);

        let report = trigger.handle("shop", br#"{"id": 1, "customer": null}"#).await;
        assert!(matches!(report, TriggerReport::Ignored { .. }));

        let report = trigger.handle("shop", br#"{"id": 1}"#).await;
        assert!(matches!(report, TriggerReport::Ignored { .. }));
    }

    #[tokio::test]
    async fn test_garbage_payload_is_acknowledged() {
        let f = fixture().await;
        let trigger = OrderTrigger::new(&f.engine, &f.projector);
        let report = trigger.handle("shop", b"not json").await;
        assert!(matches!(report, TriggerReport::Ignored { .. }));
    }

    #[tokio::test]
    async fn test_assignment_failure_skips_sync() {
        let f = fixture().await;
        f.platform.fail_stats(GID);
        f.platform.set_labels(GID, &["tier:gold"]);

        let trigger = OrderTrigger::new(&f.engine, &f.projector);
        let report = trigger
            .handle("shop", br#"{"customer": {"id": "gid://shopify/Customer/42"}}"#)
            .await;

        assert!(!report.is_clean());
        assert!(matches!(
            report,
            TriggerReport::Processed {
                assignment: AssignmentStage::Failed(_),
                sync: SyncStage::Skipped,
                ..
            }
        ));
        assert_eq!(f.platform.write_count(), 0);
        assert!(report.to_string().contains("assignment failed"));
    }

    #[tokio::test]
    async fn test_sync_failure_reported_separately() {
        let f = fixture().await;
        create_tier(&f.db, "shop", "Gold", 500, 5, 10).await;
        f.platform.set_stats(GID, "750", 6);
        f.platform.set_labels(GID, &[]);
        f.platform.fail_writes(GID);

        let trigger = OrderTrigger::new(&f.engine, &f.projector);
        let report = trigger.handle("shop", br#"{"customer": {"id": 42}}"#).await;

        assert!(matches!(
            report,
            TriggerReport::Processed {
                assignment: AssignmentStage::Succeeded(_),
                sync: SyncStage::Failed(_),
                ..
            }
        ));
        let text = report.to_string();
        assert!(text.contains("assignment succeeded"));
        assert!(text.contains("sync failed"));
        assert!(f.engine.store().find("shop", GID).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_redelivery_is_idempotent() {
        let f = fixture().await;
        create_tier(&f.db, "shop", "Gold", 500, 5, 10).await;
        f.platform.set_stats(GID, "750", 6);
        f.platform.set_labels(GID, &[]);

        let trigger = OrderTrigger::new(&f.engine, &f.projector);
        let body = br#"{"id": 7, "customer": {"id": 42}}"#;
        trigger.handle("shop", body).await;
        let first = f.engine.store().find("shop", GID).await.unwrap();
        trigger.handle("shop", body).await;

        assert_eq!(f.engine.store().find("shop", GID).await.unwrap(), first);
        assert_eq!(f.platform.write_count(), 1);
    }

    #[test]
    fn test_id_string() {
        assert_eq!(id_string(&serde_json::json!(42)), Some("42".to_string()));
        assert_eq!(id_string(&serde_json::json!(" 42 ")), Some("42".to_string()));
        assert_eq!(id_string(&serde_json::json!("")), None);
        assert_eq!(id_string(&serde_json::json!(null)), None);
    }
}
