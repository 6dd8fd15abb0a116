// Controller wire types
//
// Shapes for the `/v2.5/api/app-domains` and `/v2.5/api/microseg/policy-list`
// endpoints. Unknown fields are kept in flattened maps so a rule list or
// group read from the controller can be written back without loss.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Login response from `POST /v2/api`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(rename = "CID")]
    pub cid: Option<String>,
    #[serde(default, rename = "return")]
    pub ok: Option<bool>,
    #[serde(default)]
    pub reason: Option<String>,
}

// ── SmartGroups (app-domains) ───────────────────────────────────────

/// Envelope for `GET /v2.5/api/app-domains`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppDomainList {
    #[serde(default)]
    pub app_domains: Vec<AppDomain>,
}

/// A SmartGroup as stored on the controller.
///
/// ```json
/// {"uuid": "60477a53-...", "name": "external_github_git",
///  "selector": {"any": [{"all": {"cidr": "1.1.1.1"}}]},
///  "system_resource": false}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppDomain {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub selector: Selector,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppDomain {
    /// CIDR match terms in selector order. Non-CIDR terms are skipped.
    pub fn cidrs(&self) -> impl Iterator<Item = &str> {
        self.selector
            .any
            .iter()
            .filter_map(|term| term.all.cidr.as_deref())
    }
}

/// The `{any: [{all: {...}}]}` selector structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    #[serde(default)]
    pub any: Vec<SelectorTerm>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorTerm {
    #[serde(default)]
    pub all: MatchAll,
}

/// One conjunctive match. Only `cidr` is written by this crate; other
/// match keys (tags, resource type, ...) round-trip through `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchAll {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SelectorTerm {
    pub fn cidr(cidr: impl Into<String>) -> Self {
        Self {
            all: MatchAll {
                cidr: Some(cidr.into()),
                extra: Map::new(),
            },
        }
    }
}

/// Body for SmartGroup create (`POST`) and full replace (`PUT`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppDomainSpec {
    pub name: String,
    pub selector: Selector,
}

// ── DCF rule list ───────────────────────────────────────────────────

/// Envelope for the policy-list endpoint, used for both read and write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyList {
    #[serde(default)]
    pub policies: Vec<PolicyRule>,
}

/// Rule verdict. Unrecognized values are carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleAction {
    #[serde(rename = "PERMIT")]
    Permit,
    #[serde(rename = "DENY")]
    Deny,
    #[serde(rename = "DEEP_PACKET_INSPECTION_PERMIT")]
    DeepPacketInspectionPermit,
    #[serde(rename = "INTRUSION_DETECTION_PERMIT")]
    IntrusionDetectionPermit,
    #[serde(untagged)]
    Other(String),
}

impl std::fmt::Display for RuleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Permit => "PERMIT",
            Self::Deny => "DENY",
            Self::DeepPacketInspectionPermit => "DEEP_PACKET_INSPECTION_PERMIT",
            Self::IntrusionDetectionPermit => "INTRUSION_DETECTION_PERMIT",
            Self::Other(raw) => raw,
        })
    }
}

/// One DCF rule. Order within [`PolicyList::policies`] is significant.
///
/// Held as the raw JSON object: a rule goes back to the controller
/// exactly as it was read or supplied, including explicit `null`s and
/// keys this crate knows nothing about. Typed views are accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyRule(Map<String, Value>);

impl PolicyRule {
    pub fn uuid(&self) -> Option<&str> {
        self.0.get("uuid").and_then(Value::as_str)
    }

    pub fn set_uuid(&mut self, uuid: impl Into<String>) {
        self.0.insert("uuid".into(), Value::String(uuid.into()));
    }

    pub fn name(&self) -> &str {
        self.0.get("name").and_then(Value::as_str).unwrap_or_default()
    }

    /// `None` when absent, `null`, or not a string.
    pub fn action(&self) -> Option<RuleAction> {
        self.0
            .get("action")
            .and_then(Value::as_str)
            .map(|raw| serde_json::from_value(Value::String(raw.to_owned())))
            .and_then(Result::ok)
    }

    pub fn priority(&self) -> Option<i64> {
        self.0.get("priority").and_then(Value::as_i64)
    }

    pub fn src_ads(&self) -> impl Iterator<Item = &str> {
        self.string_list("src_ads")
    }

    pub fn dst_ads(&self) -> impl Iterator<Item = &str> {
        self.string_list("dst_ads")
    }

    fn string_list(&self, key: &str) -> impl Iterator<Item = &str> {
        self.0
            .get(key)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }
}
