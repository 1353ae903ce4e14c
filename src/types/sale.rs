use serde::Deserialize;

/// GraphQL `BigInt` scalar, serialized as a string by the subgraph but
/// accepted as a JSON number as well.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum BigInt {
    Number(i64),
    Text(String),
}

impl BigInt {
    /// Integer value, `None` if the text is not an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            BigInt::Number(n) => Some(*n),
            BigInt::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            BigInt::Number(n) => n.to_string(),
            BigInt::Text(s) => s.clone(),
        }
    }
}

/// `OrderFulfilled` entity as returned by the subgraph.
///
/// Every field is optional on the wire; validation happens in
/// [`crate::normalize::Normalizer`].
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSale {
    pub id: Option<String>,
    pub offerer: Option<String>,
    pub recipient: Option<String>,
    pub zone: Option<String>,
    pub order_hash: Option<String>,
    pub offer: Option<serde_json::Value>,
    pub consideration: Option<serde_json::Value>,
    pub block_number: Option<BigInt>,
    pub transaction_hash: Option<String>,
    pub block_timestamp: Option<BigInt>,
}
