// Controller authentication
//
// Form-encoded login against the v2 API. The response carries a CID
// that authorizes every v2.5 call for the rest of the run.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::controller::client::ControllerClient;
use crate::controller::models::LoginResponse;
use crate::error::Error;
use crate::transport;

impl ControllerClient {
    /// Authenticate with the controller using username/password.
    ///
    /// `POST /v2/api` with `action=login&username=..&password=..`. On
    /// success the CID from the response is stored on the client. A
    /// response without a CID is an authentication failure even when the
    /// HTTP status is 200.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.api_url("v2/api")?;

        debug!("logging in at {}", url);

        let form = [
            ("action", "login"),
            ("username", username),
            ("password", password.expose_secret()),
        ];

        let resp = self
            .http()
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| transport::send_error(e, self.timeout()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {body}"),
            });
        }

        let login: LoginResponse = transport::read_json(resp, self.timeout()).await?;

        match login.cid {
            Some(cid) if !cid.is_empty() => {
                self.set_cid(SecretString::from(cid));
                debug!("login successful");
                Ok(())
            }
            _ => Err(Error::Authentication {
                message: login
                    .reason
                    .unwrap_or_else(|| "login response did not include a CID".into()),
            }),
        }
    }
}
