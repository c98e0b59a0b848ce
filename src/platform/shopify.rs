//! Shopify Admin GraphQL client.

use std::sync::Arc;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use super::client::{CustomerEnumerator, CustomerPage, CustomerStatsSource, ExternalLabelStore};
use super::error::PlatformError;
use super::orders::{summarize, OrderRecord};
use crate::types::CustomerStats;

/// Largest `first:` a connection query accepts.
const MAX_PAGE_SIZE: usize = 250;

/// Orders fetched per request while summing a customer's history.
const ORDERS_PAGE_SIZE: usize = MAX_PAGE_SIZE;

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

const CUSTOMER_ORDERS_QUERY: &str = r#"
query customerOrders($id: ID!, $first: Int!, $cursor: String) {
  customer(id: $id) {
    id
    orders(first: $first, after: $cursor) {
      edges {
        node {
          id
          totalPriceSet { shopMoney { amount } }
          displayFinancialStatus
          cancelledAt
        }
      }
      pageInfo { hasNextPage endCursor }
    }
  }
}
"#;

const CUSTOMERS_QUERY: &str = r#"
query customers($first: Int!, $cursor: String) {
  customers(first: $first, after: $cursor) {
    edges { node { id } }
    pageInfo { hasNextPage endCursor }
  }
}
"#;

const CUSTOMER_TAGS_QUERY: &str = r#"
query customerTags($id: ID!) {
  customer(id: $id) {
    id
    tags
  }
}
"#;

const UPDATE_TAGS_MUTATION: &str = r#"
mutation updateCustomerTags($input: CustomerInput!) {
  customerUpdate(input: $input) {
    customer { id tags }
    userErrors { field message }
  }
}
"#;

/// Admin API client scoped to one shop.
#[derive(Clone)]
pub struct ShopifyAdmin {
    inner: Arc<Inner>,
}

struct Inner {
    client: Client,
    endpoint: Url,
    shop: String,
    token: SecretString,
}

impl ShopifyAdmin {
    /// Build a client for `shop` (e.g. `acme.myshopify.com`).
    pub fn new(shop: &str, token: SecretString, api_version: &str) -> Result<Self, PlatformError> {
        let shop = normalize_shop(shop)?;
        let endpoint = Url::parse(&format!(
            "https://{}/admin/api/{}/graphql.json",
            shop, api_version
        ))
        .map_err(|_| PlatformError::InvalidShop(shop.clone()))?;

        let client = Client::builder()
            .user_agent(concat!("tiersync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                endpoint,
                shop,
                token,
            }),
        })
    }

    pub fn shop(&self) -> &str {
        &self.inner.shop
    }

    #[cfg(test)]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    async fn graphql<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T, PlatformError> {
        debug!(endpoint = %self.inner.endpoint, "graphql request");

        let response = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            .header(ACCESS_TOKEN_HEADER, self.inner.token.expose_secret())
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(PlatformError::Status { status, body });
        }

        parse_envelope(&body)
    }
}

/// Requested page size limited to what a connection query accepts.
fn connection_page_size(requested: usize) -> usize {
    let first = requested.clamp(1, MAX_PAGE_SIZE);
    if first != requested {
        debug!(requested, first, "page size out of range, clamped");
    }
    first
}

/// Accept `acme.myshopify.com`, with or without scheme and trailing slash.
pub fn normalize_shop(shop: &str) -> Result<String, PlatformError> {
    let trimmed = shop.trim();
    let host = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed)
        .trim_end_matches('/');

    if host.is_empty() || host.contains('/') || host.contains(char::is_whitespace) {
        return Err(PlatformError::InvalidShop(shop.to_string()));
    }

    Ok(host.to_lowercase())
}

// GraphQL response types

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(default)]
    extensions: Option<ErrorExtensions>,
}

#[derive(Debug, Deserialize)]
struct ErrorExtensions {
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection<N> {
    edges: Vec<Edge<N>>,
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
struct Edge<N> {
    node: N,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

impl PageInfo {
    fn next_cursor(self) -> Result<Option<String>, PlatformError> {
        if !self.has_next_page {
            return Ok(None);
        }
        self.end_cursor
            .map(Some)
            .ok_or(PlatformError::MissingData("pageInfo.endCursor"))
    }
}

#[derive(Debug, Deserialize)]
struct CustomerOrdersData {
    customer: Option<CustomerOrders>,
}

#[derive(Debug, Deserialize)]
struct CustomerOrders {
    orders: Connection<OrderNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderNode {
    total_price_set: Option<MoneyBag>,
    display_financial_status: Option<String>,
    cancelled_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoneyBag {
    shop_money: Option<MoneyAmount>,
}

#[derive(Debug, Deserialize)]
struct MoneyAmount {
    amount: Option<String>,
}

impl From<OrderNode> for OrderRecord {
    fn from(node: OrderNode) -> Self {
        OrderRecord {
            total_price: node
                .total_price_set
                .and_then(|set| set.shop_money)
                .and_then(|money| money.amount),
            financial_status: node.display_financial_status,
            cancelled: node.cancelled_at.is_some(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CustomersData {
    customers: Connection<IdNode>,
}

#[derive(Debug, Deserialize)]
struct IdNode {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CustomerTagsData {
    customer: Option<TaggedCustomer>,
}

#[derive(Debug, Deserialize)]
struct TaggedCustomer {
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerUpdateData {
    customer_update: Option<CustomerUpdatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerUpdatePayload {
    #[serde(default)]
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
struct UserError {
    message: String,
}

/// Unwrap a GraphQL response body into its `data`.
fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<T, PlatformError> {
    let envelope: Envelope<T> = serde_json::from_str(body)?;

    if !envelope.errors.is_empty() {
        let throttled = envelope.errors.iter().any(|e| {
            e.extensions
                .as_ref()
                .and_then(|ext| ext.code.as_deref())
                .is_some_and(|code| code == "THROTTLED")
        });
        let message = envelope
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(PlatformError::GraphQl { message, throttled });
    }

    envelope.data.ok_or(PlatformError::MissingData("data"))
}

impl CustomerStatsSource for ShopifyAdmin {
    async fn fetch_stats(&self, customer_id: &str) -> Result<CustomerStats, PlatformError> {
        let mut orders: Vec<OrderRecord> = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let data: CustomerOrdersData = self
                .graphql(
                    CUSTOMER_ORDERS_QUERY,
                    json!({ "id": customer_id, "first": ORDERS_PAGE_SIZE, "cursor": cursor }),
                )
                .await?;

            let customer = data
                .customer
                .ok_or_else(|| PlatformError::NotFound(customer_id.to_string()))?;

            let connection = customer.orders;
            orders.extend(connection.edges.into_iter().map(|e| OrderRecord::from(e.node)));

            cursor = connection.page_info.next_cursor()?;
            if cursor.is_none() {
                break;
            }
        }

        let stats = summarize(&orders)?;
        debug!(
            customer = customer_id,
            orders = orders.len(),
            qualifying = stats.total_orders,
            total_spent = %stats.total_spent,
            "summarized customer orders"
        );

        Ok(stats)
    }
}

impl CustomerEnumerator for ShopifyAdmin {
    async fn page(&self, cursor: Option<&str>, page_size: usize) -> Result<CustomerPage, PlatformError> {
        let first = connection_page_size(page_size);
        let data: CustomersData = self
            .graphql(CUSTOMERS_QUERY, json!({ "first": first, "cursor": cursor }))
            .await?;

        let customer_ids = data.customers.edges.into_iter().map(|e| e.node.id).collect();
        let next_cursor = data.customers.page_info.next_cursor()?;

        Ok(CustomerPage {
            customer_ids,
            next_cursor,
        })
    }
}

impl ExternalLabelStore for ShopifyAdmin {
    async fn read_labels(&self, customer_id: &str) -> Result<Vec<String>, PlatformError> {
        let data: CustomerTagsData = self
            .graphql(CUSTOMER_TAGS_QUERY, json!({ "id": customer_id }))
            .await?;

        data.customer
            .map(|c| c.tags)
            .ok_or_else(|| PlatformError::NotFound(customer_id.to_string()))
    }

    async fn write_labels(&self, customer_id: &str, labels: &[String]) -> Result<(), PlatformError> {
        let data: CustomerUpdateData = self
            .graphql(
                UPDATE_TAGS_MUTATION,
                json!({ "input": { "id": customer_id, "tags": labels } }),
            )
            .await?;

        let payload = data
            .customer_update
            .ok_or(PlatformError::MissingData("customerUpdate"))?;

        if !payload.user_errors.is_empty() {
            return Err(PlatformError::UserErrors(
                payload.user_errors.into_iter().map(|e| e.message).collect(),
            ));
        }

        Ok(())
    }
}
