// ── Event invocation surface ──
//
// Function-style entry points: take an event document, run one
// reconciliation, and answer with `{statusCode, headers, body}`. The
// body is always a JSON string. Errors never escape as `Err`; they are
// folded into a non-200 response carrying `{"error": {kind, message}}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use policysync_api::{PolicyList, PolicyRule};

use crate::backend::{HostResolver, IpRangeSource, PolicyApi};
use crate::error::CoreError;
use crate::reconcile::{CidrAction, RuleListAction};
use crate::reconciler::Reconciler;

// ── Event payloads ───────────────────────────────────────────────────

/// Body of a SmartGroup CIDR update event.
///
/// Payload fields are optional at decode time so an unknown action is
/// reported as such even when the rest of the body is incomplete.
#[derive(Debug, Clone, Deserialize)]
pub struct SmartGroupEvent {
    pub action: String,
    #[serde(default)]
    pub smartgroup_uuid: Option<String>,
    /// CIDRs to add or remove.
    #[serde(default)]
    pub domains: Option<Vec<String>>,
}

impl SmartGroupEvent {
    /// The validated action, target UUID and CIDRs, action first.
    pub fn into_parts(self) -> Result<(CidrAction, String, Vec<String>), CoreError> {
        let action = CidrAction::parse(&self.action)?;
        let missing = |field: &str| CoreError::InvalidRequest {
            message: format!("{action} requires '{field}'"),
        };
        let uuid = self.smartgroup_uuid.ok_or_else(|| missing("smartgroup_uuid"))?;
        let domains = self.domains.ok_or_else(|| missing("domains"))?;
        Ok((action, uuid, domains))
    }
}

/// A replacement rule list, either bare or wrapped in `{"policies": [...]}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PolicyListInput {
    Bare(Vec<PolicyRule>),
    Wrapped(PolicyList),
}

impl PolicyListInput {
    pub fn into_rules(self) -> Vec<PolicyRule> {
        match self {
            Self::Bare(rules) => rules,
            Self::Wrapped(list) => list.policies,
        }
    }
}

/// Body of a DCF rule-list event.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleListEvent {
    pub action: String,
    #[serde(default)]
    pub rule: Option<PolicyRule>,
    #[serde(default)]
    pub rule_uuid: Option<String>,
    #[serde(default)]
    pub policy_list: Option<PolicyListInput>,
}

impl RuleListEvent {
    pub fn into_action(self) -> Result<RuleListAction, CoreError> {
        RuleListAction::from_parts(
            &self.action,
            self.rule,
            self.rule_uuid,
            self.policy_list.map(PolicyListInput::into_rules),
        )
    }
}

/// Extract the request document from an event.
///
/// Gateway-style events carry it as a JSON string under `body`; direct
/// invocations pass the document itself.
pub fn event_body(event: &Value) -> Result<Value, CoreError> {
    match event.get("body") {
        Some(Value::String(raw)) => serde_json::from_str(raw).map_err(|e| CoreError::InvalidRequest {
            message: format!("event body is not valid JSON: {e}"),
        }),
        Some(body @ Value::Object(_)) => Ok(body.clone()),
        Some(other) => Err(CoreError::InvalidRequest {
            message: format!("unsupported event body: {other}"),
        }),
        None if event.is_object() => Ok(event.clone()),
        None => Err(CoreError::InvalidRequest {
            message: "event must be a JSON object".into(),
        }),
    }
}

/// Decode an event's request document into `T`.
pub fn parse_event<T: serde::de::DeserializeOwned>(event: &Value) -> Result<T, CoreError> {
    let body = event_body(event)?;
    serde_json::from_value(body).map_err(|e| CoreError::InvalidRequest {
        message: e.to_string(),
    })
}

// ── Response ─────────────────────────────────────────────────────────

/// Function-style response envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    /// JSON-encoded payload.
    pub body: String,
}

fn json_headers() -> BTreeMap<String, String> {
    BTreeMap::from([("Content-Type".to_owned(), "application/json".to_owned())])
}

impl EventResponse {
    fn with_body(status_code: u16, body: &Value) -> Self {
        Self {
            status_code,
            headers: json_headers(),
            body: body.to_string(),
        }
    }

    /// 200 with `{"result": <value>}`.
    pub fn result(value: Value) -> Self {
        Self::with_body(200, &json!({ "result": value }))
    }

    /// 200 with `payload` as the body.
    pub fn ok(payload: &impl Serialize) -> Self {
        match serde_json::to_value(payload) {
            Ok(value) => Self::with_body(200, &value),
            Err(e) => Self::from_error(&CoreError::Internal(e.to_string())),
        }
    }

    pub fn from_error(err: &CoreError) -> Self {
        let status = status_for(err);
        warn!(status, kind = err.kind(), error = %err, "event failed");
        Self::with_body(
            status,
            &json!({ "error": { "kind": err.kind(), "message": err.to_string() } }),
        )
    }

    /// The decoded body, for callers that want structured output.
    pub fn body_json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or_else(|_| Value::String(self.body.clone()))
    }
}

/// HTTP-style status for an error kind.
pub fn status_for(err: &CoreError) -> u16 {
    match err {
        CoreError::InvalidAction { .. } | CoreError::InvalidRequest { .. } => 400,
        CoreError::Authentication { .. } => 401,
        CoreError::ObjectNotFound { .. } => 404,
        CoreError::Api { .. } => 502,
        CoreError::Config { .. } | CoreError::Internal(_) => 500,
    }
}

fn respond(outcome: Result<Value, CoreError>) -> EventResponse {
    match outcome {
        Ok(value) => EventResponse::result(value),
        Err(err) => EventResponse::from_error(&err),
    }
}

// ── Handlers ─────────────────────────────────────────────────────────

/// ADD/DELETE CIDRs on a SmartGroup addressed by UUID.
pub async fn handle_smartgroup_event<A: PolicyApi + Sync>(api: &A, event: &Value) -> EventResponse {
    let (action, uuid, domains) =
        match parse_event::<SmartGroupEvent>(event).and_then(SmartGroupEvent::into_parts) {
            Ok(parts) => parts,
            Err(err) => return EventResponse::from_error(&err),
        };
    debug!(%uuid, %action, "SmartGroup event");

    respond(
        Reconciler::new(api)
            .update_group_cidrs(&uuid, &domains, action.into())
            .await,
    )
}

/// ADD_RULE / DELETE_RULE / REPLACE_RULE / REPLACE_LIST on the DCF rule list.
pub async fn handle_rule_list_event<A: PolicyApi + Sync>(api: &A, event: &Value) -> EventResponse {
    let action = match parse_event::<RuleListEvent>(event).and_then(RuleListEvent::into_action) {
        Ok(action) => action,
        Err(err) => return EventResponse::from_error(&err),
    };
    debug!(action = %action.kind(), "rule-list event");

    respond(Reconciler::new(api).update_rule_list(&action).await)
}

/// Scheduled meta-IP sync. The body is the array of per-group outcomes.
pub async fn handle_github_sync<A, S>(api: &A, source: &S, endpoints: &[String]) -> EventResponse
where
    A: PolicyApi + Sync,
    S: IpRangeSource + Sync,
{
    match Reconciler::new(api).sync_meta_groups(source, endpoints).await {
        Ok(outcomes) => EventResponse::ok(&outcomes),
        Err(err) => EventResponse::from_error(&err),
    }
}

/// Scheduled FQDN sync. The body is the array of per-group outcomes.
pub async fn handle_fqdn_sync<A, R>(api: &A, resolver: &R, fqdns: &[String]) -> EventResponse
where
    A: PolicyApi + Sync,
    R: HostResolver + Sync,
{
    match Reconciler::new(api).sync_fqdn_groups(resolver, fqdns).await {
        Ok(outcomes) => EventResponse::ok(&outcomes),
        Err(err) => EventResponse::from_error(&err),
    }
}
