use thiserror::Error;

use crate::platform::PlatformError;

/// Errors surfaced by the tier engine.
///
/// Every variant is per-customer from a sweep's point of view: the sweep
/// counts it and moves on.
#[derive(Debug, Error)]
pub enum TierError {
    #[error("store not found: {0:?}")]
    StoreNotFound(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid data: {0}")]
    Validation(String),

    #[error("transient failure: {0}")]
    Transient(#[source] PlatformError),

    /// More than one assignment row for one (shop, customer) pair.
    #[error("{rows} assignment rows for customer {customer} in {shop}")]
    Consistency {
        shop: String,
        customer: String,
        rows: usize,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("platform error: {0}")]
    Platform(#[source] PlatformError),
}

impl TierError {
    pub fn is_transient(&self) -> bool {
        matches!(self, TierError::Transient(_))
    }
}

impl From<PlatformError> for TierError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::NotFound(what) => TierError::NotFound(what),
            err if err.is_transient() => TierError::Transient(err),
            err => TierError::Platform(err),
        }
    }
}
