// CoPilot HTTP client
//
// Cookie-session client for the analytics appliance that stores DCF
// enforcement logs. Login sets a session cookie in the client's jar;
// subsequent requests use it automatically.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::copilot::models::{DcfLogEntry, LogCount, LogPage, LogQuery};
use crate::error::Error;
use crate::transport::{self, TransportConfig};

pub struct CopilotClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl CopilotClient {
    /// Create a new client. A cookie jar is added if the transport
    /// config doesn't already carry one (session auth requires cookies).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let http = config.build_client()?;
        Ok(Self::with_client(http, base_url, config.timeout))
    }

    /// Wrap a pre-built `reqwest::Client` (caller provides the cookie store).
    pub fn with_client(http: reqwest::Client, base_url: Url, timeout: Duration) -> Self {
        Self {
            http,
            base_url,
            timeout,
        }
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Start a session. `POST /api/login` with a JSON body.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.url("api/login")?;
        debug!("logging in to CoPilot at {}", url);

        let body = json!({
            "username": username,
            "password": password.expose_secret(),
        });

        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport::send_error(e, self.timeout))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("CoPilot login failed (HTTP {status}): {body}"),
            });
        }

        debug!("CoPilot login successful");
        Ok(())
    }

    /// End the session. `GET /api/logout`.
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.url("api/logout")?;
        debug!("logging out at {}", url);

        let _resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| transport::send_error(e, self.timeout))?;

        debug!("logout complete");
        Ok(())
    }

    /// Number of logs matching `query`.
    pub async fn count_logs(&self, query: &LogQuery) -> Result<u64, Error> {
        let url = self.url("api/microseg/policies/logs/count")?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(query)
            .send()
            .await
            .map_err(|e| transport::send_error(e, self.timeout))?;

        let count: LogCount = transport::read_json(resp, self.timeout).await?;
        Ok(count.total)
    }

    /// One page of logs matching `query`, honoring `query.search_after`.
    pub async fn fetch_logs(&self, query: &LogQuery) -> Result<Vec<DcfLogEntry>, Error> {
        let url = self.url("api/microseg/policies/logs")?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(query)
            .send()
            .await
            .map_err(|e| transport::send_error(e, self.timeout))?;

        let page: LogPage = transport::read_json(resp, self.timeout).await?;
        Ok(page.items)
    }
}
