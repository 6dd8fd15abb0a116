// Published IP-range metadata client
//
// `GET {base}/meta` returns an object keyed by service name. Most values
// are CIDR lists (mixed v4/v6); a few are booleans or nested objects,
// so the body is kept as a raw map and narrowed per requested key.

use std::time::Duration;

use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::{self, TransportConfig};

/// Default meta-IP endpoint.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Snapshot of the meta-IP document.
#[derive(Debug, Clone, Default)]
pub struct MetaRanges {
    entries: Map<String, Value>,
}

impl MetaRanges {
    pub fn from_map(entries: Map<String, Value>) -> Self {
        Self { entries }
    }

    /// CIDR strings published under `key`, or `None` if the key is
    /// absent or does not hold a list of strings.
    pub fn ranges(&self, key: &str) -> Option<Vec<String>> {
        let items = self.entries.get(key)?.as_array()?;
        Some(
            items
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
        )
    }

    /// Names of every list-valued key in the document.
    pub fn keys(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, v)| v.is_array())
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

/// Client for the cloud provider's meta-IP API.
pub struct MetaClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl MetaClient {
    /// Build against the given base URL. TLS always uses system roots.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let public = transport.for_public_endpoint();
        let http = public.build_client()?;
        Ok(Self::with_client(http, base_url, public.timeout))
    }

    pub fn with_client(http: reqwest::Client, base_url: Url, timeout: Duration) -> Self {
        Self {
            http,
            base_url,
            timeout,
        }
    }

    /// Fetch the current meta document.
    pub async fn fetch(&self) -> Result<MetaRanges, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let url = Url::parse(&format!("{base}/meta"))?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| transport::send_error(e, self.timeout))?;

        let entries: Map<String, Value> = transport::read_json(resp, self.timeout).await?;
        Ok(MetaRanges::from_map(entries))
    }
}
