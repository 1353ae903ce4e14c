//! Paginated access to the Seaport subgraph.

use std::{future::Future, time::Duration};

use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::{error::FetchError, types::RawSale};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of a single page request.
#[derive(Debug)]
pub enum PageOutcome {
    /// Non-empty page, in descending block timestamp order.
    Records(Vec<RawSale>),

    /// The source answered but the page holds no records.
    Empty,

    /// The request failed before producing a page.
    Failed(FetchError),
}

impl From<Result<Vec<RawSale>, FetchError>> for PageOutcome {
    fn from(value: Result<Vec<RawSale>, FetchError>) -> Self {
        match value {
            Ok(records) if records.is_empty() => PageOutcome::Empty,
            Ok(records) => PageOutcome::Records(records),
            Err(err) => PageOutcome::Failed(err),
        }
    }
}

/// Source of fixed-size, timestamp-descending pages of fulfilled orders.
///
/// Implementations do not retry, recovery is up to the caller.
pub trait PageSource {
    fn fetch_page(&self, first: usize, skip: usize) -> impl Future<Output = PageOutcome>;
}

impl<T: PageSource> PageSource for &T {
    fn fetch_page(&self, first: usize, skip: usize) -> impl Future<Output = PageOutcome> {
        (**self).fetch_page(first, skip)
    }
}

/// GraphQL client of the Seaport subgraph.
#[derive(Clone, Debug)]
pub struct SubgraphClient {
    endpoint: Url,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<OrderFulfilledsData>,
    errors: Option<Vec<serde_json::Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderFulfilledsData {
    #[serde(default)]
    order_fulfilleds: Vec<RawSale>,
}

impl SubgraphClient {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn request(&self, first: usize, skip: usize) -> Result<Vec<RawSale>, FetchError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&serde_json::json!({ "query": page_query(first, skip) }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        parse_response(&body)
    }
}

impl PageSource for SubgraphClient {
    async fn fetch_page(&self, first: usize, skip: usize) -> PageOutcome {
        let outcome = PageOutcome::from(self.request(first, skip).await);
        match &outcome {
            PageOutcome::Records(records) => debug!(first, skip, len = records.len(), "Fetched page"),
            PageOutcome::Empty => debug!(first, skip, "Empty page"),
            PageOutcome::Failed(err) => warn!(first, skip, %err, "Page request failed"),
        }
        outcome
    }
}

/// Query for one page of fulfilled orders, most recent first.
pub fn page_query(first: usize, skip: usize) -> String {
    format!(
        "{{
  orderFulfilleds(first: {first}, skip: {skip}, orderBy: blockTimestamp, orderDirection: desc) {{
    id
    offerer
    recipient
    zone
    orderHash
    offer
    consideration
    blockNumber
    transactionHash
    blockTimestamp
  }}
}}"
    )
}

/// Extract page records from a GraphQL response body.
pub fn parse_response(body: &str) -> Result<Vec<RawSale>, FetchError> {
    let response: GraphQlResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    if let Some(errors) = response.errors.filter(|e| !e.is_empty()) {
        return Err(FetchError::Query(
            serde_json::to_string(&errors).unwrap_or_else(|_| format!("{errors:?}")),
        ));
    }

    Ok(response
        .data
        .map(|data| data.order_fulfilleds)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query() {
        let query = page_query(100, 300);
        assert!(query.contains(
            "orderFulfilleds(first: 100, skip: 300, orderBy: blockTimestamp, orderDirection: desc)"
        ));
        assert!(query.contains("transactionHash"));
        assert!(query.contains("blockTimestamp"));
    }

    #[test]
    fn test_parse_response_records() {
        let body = r#"{"data":{"orderFulfilleds":[
            {"id":"1","transactionHash":"0x1","blockTimestamp":"1700000000","blockNumber":"10"},
            {"id":"2","transactionHash":"0x2","blockTimestamp":"1699999990","blockNumber":"9"}
        ]}}"#;
        let records = parse_response(body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].transaction_hash.as_deref(), Some("0x2"));
    }

    #[test]
    fn test_parse_response_empty_and_errors() {
        let empty = parse_response(r#"{"data":{"orderFulfilleds":[]}}"#).unwrap();
        assert!(empty.is_empty());
        assert!(matches!(PageOutcome::from(Ok(empty)), PageOutcome::Empty));

        let errors = parse_response(r#"{"errors":[{"message":"indexing error"}]}"#);
        assert!(matches!(errors, Err(FetchError::Query(msg)) if msg.contains("indexing error")));

        let garbage = parse_response("<html>bad gateway</html>");
        assert!(matches!(garbage, Err(FetchError::Decode(_))));
    }
}
