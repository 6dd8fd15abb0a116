// Controller HTTP client
//
// Wraps `reqwest::Client` with controller URL construction and CID
// header injection. Endpoint groups (auth, app-domains, policy-list)
// are implemented as inherent methods in sibling files to keep this
// module focused on transport mechanics.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::{self, TransportConfig};

/// Raw HTTP client for the controller's REST API.
///
/// One instance corresponds to one session: [`login`](Self::login)
/// stores the CID, and every later call sends it as
/// `Authorization: cid <token>`. The CID is never persisted.
pub struct ControllerClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    /// Session token captured at login.
    cid: RwLock<Option<SecretString>>,
}

impl ControllerClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the controller root (e.g. `https://10.0.0.5`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, transport.timeout))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, timeout: Duration) -> Self {
        Self {
            http,
            base_url,
            timeout,
            cid: RwLock::new(None),
        }
    }

    /// The controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying HTTP client (for auth flows that need direct access).
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether a CID has been stored by a successful login.
    pub fn is_logged_in(&self) -> bool {
        self.cid
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    // ── Session token management ─────────────────────────────────────

    pub(crate) fn set_cid(&self, cid: SecretString) {
        trace!("storing session CID");
        *self.cid.write().unwrap_or_else(PoisonError::into_inner) = Some(cid);
    }

    /// Apply the stored CID to a request builder.
    fn authorize(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, Error> {
        let guard = self.cid.read().unwrap_or_else(PoisonError::into_inner);
        let cid = guard.as_ref().ok_or(Error::NotLoggedIn)?;
        Ok(builder.header(
            reqwest::header::AUTHORIZATION,
            format!("cid {}", cid.expose_secret()),
        ))
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an API path such as `v2.5/api/app-domains`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let builder = self.authorize(self.http.get(url))?;
        self.send(builder).await
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {}", url);

        let builder = self.authorize(self.http.post(url).json(body))?;
        self.send(builder).await
    }

    pub(crate) async fn put<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("PUT {}", url);

        let builder = self.authorize(self.http.put(url).json(body))?;
        self.send(builder).await
    }

    async fn send<T: DeserializeOwned>(&self, builder: reqwest::RequestBuilder) -> Result<T, Error> {
        let resp = builder
            .send()
            .await
            .map_err(|e| transport::send_error(e, self.timeout))?;
        trace!(status = %resp.status(), "controller response");
        transport::read_json(resp, self.timeout).await
    }
}
