// DCF rule-list endpoints
//
// The controller only exposes the list as a whole: reads return every
// rule and writes replace every rule.

use serde_json::Value;
use tracing::debug;

use crate::controller::client::ControllerClient;
use crate::controller::models::{PolicyList, PolicyRule};
use crate::error::Error;

const POLICY_LIST_PATH: &str = "v2.5/api/microseg/policy-list";

impl ControllerClient {
    /// Fetch the ordered DCF rule list.
    ///
    /// `GET /v2.5/api/microseg/policy-list`
    pub async fn get_policy_list(&self) -> Result<Vec<PolicyRule>, Error> {
        let url = self.api_url(POLICY_LIST_PATH)?;
        let list: PolicyList = self.get(url).await?;
        debug!(count = list.policies.len(), "fetched policy list");
        Ok(list.policies)
    }

    /// Replace the entire DCF rule list.
    ///
    /// `PUT /v2.5/api/microseg/policy-list` with `{"policies": [...]}`.
    pub async fn replace_policy_list(&self, rules: &[PolicyRule]) -> Result<Value, Error> {
        let url = self.api_url(POLICY_LIST_PATH)?;
        let body = PolicyList {
            policies: rules.to_vec(),
        };
        self.put(url, &body).await
    }
}
