// SmartGroup (app-domain) endpoints

use serde_json::Value;
use tracing::debug;

use crate::controller::client::ControllerClient;
use crate::controller::models::{AppDomain, AppDomainList, AppDomainSpec};
use crate::error::Error;

impl ControllerClient {
    /// List every SmartGroup on the controller.
    ///
    /// `GET /v2.5/api/app-domains`
    pub async fn list_app_domains(&self) -> Result<Vec<AppDomain>, Error> {
        let url = self.api_url("v2.5/api/app-domains")?;
        let list: AppDomainList = self.get(url).await?;
        debug!(count = list.app_domains.len(), "fetched SmartGroups");
        Ok(list.app_domains)
    }

    /// Create a SmartGroup, returning the controller's raw response.
    ///
    /// `POST /v2.5/api/app-domains`
    pub async fn create_app_domain(&self, spec: &AppDomainSpec) -> Result<Value, Error> {
        let url = self.api_url("v2.5/api/app-domains")?;
        self.post(url, spec).await
    }

    /// Replace a SmartGroup's name and selector wholesale.
    ///
    /// `PUT /v2.5/api/app-domains/{uuid}`
    pub async fn replace_app_domain(
        &self,
        uuid: &str,
        spec: &AppDomainSpec,
    ) -> Result<Value, Error> {
        let url = self.api_url(&format!("v2.5/api/app-domains/{uuid}"))?;
        self.put(url, spec).await
    }
}
