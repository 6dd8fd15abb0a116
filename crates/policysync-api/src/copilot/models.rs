// CoPilot log API wire types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One filter clause in a log query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterItem {
    pub field: String,
    pub operator: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterModel {
    pub items: Vec<FilterItem>,
    pub logic_operator: String,
    pub quick_filter_logic_operator: String,
    pub quick_filter_values: Vec<Value>,
}

/// Body for both `/logs/count` and `/logs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogQuery {
    pub filter_model: FilterModel,
    pub order: String,
    pub size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_after: Option<Vec<Value>>,
}

impl LogQuery {
    /// Logs hit by any of `policy_uuids` at or after `start` (ISO-8601),
    /// newest first.
    pub fn for_policies(policy_uuids: &[String], start: &str, size: u32) -> Self {
        Self {
            filter_model: FilterModel {
                items: vec![
                    FilterItem {
                        field: "policyUuid".into(),
                        operator: "include".into(),
                        value: Value::from(policy_uuids.to_vec()),
                    },
                    FilterItem {
                        field: "timestamp".into(),
                        operator: "after".into(),
                        value: Value::from(start),
                    },
                ],
                logic_operator: "and".into(),
                quick_filter_logic_operator: "and".into(),
                quick_filter_values: Vec::new(),
            },
            order: "desc".into(),
            size,
            search_after: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogCount {
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogPage {
    #[serde(default)]
    pub items: Vec<DcfLogEntry>,
}

/// A single DCF enforcement log line.
///
/// ```json
/// {"policyUuid": "e82f04ad-...", "sourceIp": "10.1.88.234",
///  "destinationIp": "13.107.42.16", "protocol": "TCP",
///  "sourcePort": 49327, "destinationPort": 443, "action": "DROP",
///  "tags": ["mitm", "microseg"], "mitmSniHostname": "config.edge.skype.com",
///  "_searchAfter": [1715197774000]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DcfLogEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub policy_uuid: Option<String>,
    #[serde(default)]
    pub source_ip: String,
    #[serde(default)]
    pub destination_ip: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub source_port: u32,
    #[serde(default)]
    pub destination_port: u32,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub mitm_sni_hostname: Option<String>,
    #[serde(default, rename = "_searchAfter")]
    pub search_after: Vec<Value>,
}

impl DcfLogEntry {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
