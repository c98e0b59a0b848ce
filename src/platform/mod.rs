//! Commerce platform collaborators.
//!
//! The tier engine only depends on the traits in [`client`]; [`ShopifyAdmin`]
//! implements all of them against the Admin GraphQL API.

pub mod client;
mod error;
pub mod orders;
mod shopify;

pub use client::{CustomerEnumerator, CustomerStatsSource, ExternalLabelStore};
pub use error::PlatformError;
pub use shopify::{normalize_shop, ShopifyAdmin};

/// Prefix of Shopify global customer ids.
pub const CUSTOMER_GID_PREFIX: &str = "gid://shopify/Customer/";

/// Normalize a customer id to its global form.
///
/// Webhook payloads carry numeric ids while the GraphQL API expects
/// `gid://shopify/Customer/<n>`.
pub fn customer_gid(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with("gid://") {
        raw.to_string()
    } else {
        format!("{}{}", CUSTOMER_GID_PREFIX, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_gid() {
        assert_eq!(customer_gid("42"), "gid://shopify/Customer/42");
        assert_eq!(customer_gid(" 42 "), "gid://shopify/Customer/42");
        assert_eq!(
            customer_gid("gid://shopify/Customer/42"),
            "gid://shopify/Customer/42"
        );
    }
}
