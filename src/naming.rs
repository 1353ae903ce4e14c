//! Best-effort NFT collection names.

use std::{collections::HashMap, future::Future, sync::Mutex, time::Duration};

use alloy::primitives::{Address, address};
use serde::Deserialize;
use tracing::debug;
use url::Url;

/// Well-known collections, resolved without network access.
pub const KNOWN_COLLECTIONS: [(Address, &str); 5] = [
    (
        address!("0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d"),
        "Bored Ape Yacht Club",
    ),
    (
        address!("0xb47e3cd837ddf8e4c57f05d70ab865de6e193bbb"),
        "CryptoPunks",
    ),
    (
        address!("0x60e4d786628fea6478f785a6d7e704777c86a7c6"),
        "Mutant Ape Yacht Club",
    ),
    (
        address!("0x34d85c9cdeb23fa97cb08333b511ac86e1c4e258"),
        "Otherdeed for Otherside",
    ),
    (
        address!("0x23581767a106ae21c074b2276d25e5c3e136a68b"),
        "Moonbirds",
    ),
];

/// Address to display name lookup.
///
/// `None` means the name is unknown; callers display the address instead.
pub trait NameLookup {
    fn name(&self, address: Address) -> impl Future<Output = Option<String>>;
}

/// Lookup that knows no names.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoNames;

impl NameLookup for NoNames {
    async fn name(&self, _address: Address) -> Option<String> {
        None
    }
}

/// Contract names from the Etherscan V2 `getsourcecode` endpoint.
#[derive(Clone, Debug)]
pub struct Etherscan {
    base_url: Url,
    api_key: String,
    chain_id: u64,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct SourceCodeResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SourceCodeEntry {
    #[serde(default)]
    contract_name: String,
}

impl Etherscan {
    /// Multichain API, the chain is selected by the `chainid` parameter.
    pub const API_URL: &'static str = "https://api.etherscan.io/v2/api";

    pub fn new(
        base_url: Url,
        api_key: String,
        chain_id: u64,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url,
            api_key,
            chain_id,
            client,
        })
    }

    pub(crate) fn request_url(&self, address: Address) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("chainid", &self.chain_id.to_string())
            .append_pair("module", "contract")
            .append_pair("action", "getsourcecode")
            .append_pair("address", &address.to_string())
            .append_pair("apikey", &self.api_key);
        url
    }

    async fn contract_name(&self, address: Address) -> Result<Option<String>, reqwest::Error> {
        let body = self
            .client
            .get(self.request_url(address))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(parse_contract_name(&body))
    }
}

impl NameLookup for Etherscan {
    async fn name(&self, address: Address) -> Option<String> {
        match self.contract_name(address).await {
            Ok(name) => name,
            Err(err) => {
                debug!(%address, %err, "Contract name lookup failed");
                None
            }
        }
    }
}

/// Extract the contract name from a `getsourcecode` response body.
///
/// Unverified contracts and error responses (status other than `"1"`, with
/// a message string as `result`) yield `None`.
pub fn parse_contract_name(body: &str) -> Option<String> {
    let response: SourceCodeResponse = serde_json::from_str(body).ok()?;
    if response.status != "1" {
        debug!(
            status = %response.status,
            message = %response.message,
            result = %response.result,
            "Etherscan request rejected"
        );
        return None;
    }
    let entries: Vec<SourceCodeEntry> = serde_json::from_value(response.result).ok()?;
    entries
        .into_iter()
        .map(|e| e.contract_name)
        .find(|name| !name.trim().is_empty())
}

/// Known collections first, then an optional fallback lookup. Answers are
/// cached per address, misses included.
#[derive(Debug)]
pub struct CollectionNames<L> {
    known: HashMap<Address, String>,
    fallback: Option<L>,
    cache: Mutex<HashMap<Address, Option<String>>>,
}

impl<L: NameLookup> CollectionNames<L> {
    pub fn new(fallback: Option<L>) -> Self {
        Self {
            known: KNOWN_COLLECTIONS
                .iter()
                .map(|(address, name)| (*address, name.to_string()))
                .collect(),
            fallback,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Register an additional known collection.
    pub fn with_known(mut self, address: Address, name: impl Into<String>) -> Self {
        self.known.insert(address, name.into());
        self
    }

    fn cached(&self, address: Address) -> Option<Option<String>> {
        self.cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(&address).cloned())
    }

    fn remember(&self, address: Address, name: Option<String>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(address, name);
        }
    }
}

impl<L: NameLookup> NameLookup for CollectionNames<L> {
    async fn name(&self, address: Address) -> Option<String> {
        if let Some(name) = self.known.get(&address) {
            return Some(name.clone());
        }
        if let Some(cached) = self.cached(address) {
            return cached;
        }
        let name = match &self.fallback {
            Some(lookup) => lookup.name(address).await,
            None => None,
        };
        self.remember(address, name.clone());
        name
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    struct CountingLookup {
        calls: Cell<usize>,
    }

    impl NameLookup for CountingLookup {
        async fn name(&self, address: Address) -> Option<String> {
            self.calls.set(self.calls.get() + 1);
            (address == Address::repeat_byte(1)).then(|| "Azuki".to_string())
        }
    }

    #[tokio::test]
    async fn test_known_collections() {
        let names = CollectionNames::<NoNames>::new(None);
        assert_eq!(
            names
                .name(address!("0xBC4CA0EdA7647A8aB7C2061c2E118A18a936f13D"))
                .await
                .as_deref(),
            Some("Bored Ape Yacht Club")
        );
        assert_eq!(names.name(Address::repeat_byte(9)).await, None);
    }

    #[tokio::test]
    async fn test_fallback_cached() {
        let names = CollectionNames::new(Some(CountingLookup {
            calls: Cell::new(0),
        }))
        .with_known(Address::repeat_byte(2), "Doodles");

        assert_eq!(names.name(Address::repeat_byte(2)).await.as_deref(), Some("Doodles"));
        assert_eq!(names.name(Address::repeat_byte(1)).await.as_deref(), Some("Azuki"));
        assert_eq!(names.name(Address::repeat_byte(1)).await.as_deref(), Some("Azuki"));
        assert_eq!(names.name(Address::repeat_byte(3)).await, None);
        assert_eq!(names.name(Address::repeat_byte(3)).await, None);

        let calls = names.fallback.as_ref().unwrap().calls.get();
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_parse_contract_name() {
        let verified = r#"{"status":"1","message":"OK","result":[{"SourceCode":"...","ContractName":"Azuki"}]}"#;
        assert_eq!(parse_contract_name(verified).as_deref(), Some("Azuki"));

        let unverified = r#"{"status":"1","message":"OK","result":[{"SourceCode":"","ContractName":""}]}"#;
        assert_eq!(parse_contract_name(unverified), None);

        let invalid_key = r#"{"status":"0","message":"NOTOK","result":"Invalid API Key"}"#;
        assert_eq!(parse_contract_name(invalid_key), None);

        assert_eq!(parse_contract_name("not json"), None);

        let missing_status = r#"{"result":[{"ContractName":"Azuki"}]}"#;
        assert_eq!(parse_contract_name(missing_status), None);
    }

    #[test]
    fn test_request_url() {
        let etherscan = Etherscan::new(
            Url::parse(Etherscan::API_URL).unwrap(),
            "KEY".to_string(),
            crate::Seaport::mainnet().chain_id(),
            Duration::from_secs(5),
        )
        .unwrap();

        let url = etherscan.request_url(Address::repeat_byte(0xab));
        assert_eq!(url.host_str(), Some("api.etherscan.io"));
        assert_eq!(url.path(), "/v2/api");

        let query: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(query["chainid"], "1");
        assert_eq!(query["module"], "contract");
        assert_eq!(query["action"], "getsourcecode");
        assert_eq!(query["address"], Address::repeat_byte(0xab).to_string());
        assert_eq!(query["apikey"], "KEY");
    }
}
