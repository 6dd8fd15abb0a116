// ── Reconciliation drivers ──
//
// Fetch current state, compute the next state, write it. One driver per
// source of truth. Multi-object syncs record a `SyncOutcome` per group and keep
// going when one group fails; single-object updates return their error.

use std::collections::BTreeSet;

use serde::Serialize;
use serde::ser::SerializeMap;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use policysync_api::{AppDomain, PolicyRule};

use crate::backend::{HostResolver, IpRangeSource, PolicyApi};
use crate::cidr::CidrSet;
use crate::error::CoreError;
use crate::lookup::{GroupKey, Lookup, find_by_key};
use crate::naming::{FQDN_PREFIX, fqdn_from_group_name, fqdn_group_name, github_group_name};
use crate::reconcile::{CidrAction, RuleListAction, WritePlan, current_cidrs, next_rule_list};

// ── Per-group result ─────────────────────────────────────────────────

/// Result of reconciling one SmartGroup inside a multi-group sync.
#[derive(Debug)]
pub struct SyncOutcome {
    /// Target group name.
    pub group: String,
    /// `"create"` / `"update"`, or `None` if the run failed before a
    /// write was planned.
    pub write: Option<&'static str>,
    /// Number of CIDRs in the written selector.
    pub cidrs: usize,
    /// Raw controller response, or why this group was skipped.
    pub result: Result<Value, CoreError>,
}

impl SyncOutcome {
    fn failed(group: String, err: CoreError) -> Self {
        warn!(group = %group, error = %err, "group sync failed");
        Self {
            group,
            write: None,
            cidrs: 0,
            result: Err(err),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

impl Serialize for SyncOutcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("group", &self.group)?;
        if let Some(write) = self.write {
            map.serialize_entry("write", write)?;
            map.serialize_entry("cidrs", &self.cidrs)?;
        }
        match &self.result {
            Ok(value) => map.serialize_entry("result", value)?,
            Err(err) => map.serialize_entry(
                "error",
                &json!({ "kind": err.kind(), "message": err.to_string() }),
            )?,
        }
        map.end()
    }
}

// ── Reconciler ───────────────────────────────────────────────────────

/// Drives reconciliation against one authenticated controller session.
pub struct Reconciler<'a, A> {
    api: &'a A,
}

impl<'a, A: PolicyApi + Sync> Reconciler<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    async fn execute(&self, plan: &WritePlan) -> Result<Value, CoreError> {
        match plan {
            WritePlan::Create(spec) => {
                info!(group = %spec.name, cidrs = spec.selector.any.len(), "creating SmartGroup");
                self.api.create_group(spec).await
            }
            WritePlan::Update { uuid, spec } => {
                info!(group = %spec.name, %uuid, cidrs = spec.selector.any.len(), "updating SmartGroup");
                self.api.replace_group(uuid, spec).await
            }
        }
    }

    async fn write_group(
        &self,
        target: Lookup<'_, AppDomain>,
        name: String,
        cidrs: &CidrSet,
    ) -> SyncOutcome {
        let plan = WritePlan::for_target(target, &name, cidrs);
        let result = self.execute(&plan).await;
        if let Err(err) = &result {
            warn!(group = %name, error = %err, "SmartGroup write failed");
        }
        SyncOutcome {
            group: name,
            write: Some(plan.kind()),
            cidrs: cidrs.len(),
            result,
        }
    }

    // ── Published IP ranges ──────────────────────────────────────────

    /// Mirror each requested meta-IP endpoint into `external_github_<endpoint>`.
    ///
    /// Repeated endpoint names are synced once. Failing to fetch the meta document or the group listing aborts the
    /// run; a missing endpoint key or a failed write is recorded against
    /// that endpoint only.
    pub async fn sync_meta_groups<S: IpRangeSource + Sync>(
        &self,
        source: &S,
        endpoints: &[String],
    ) -> Result<Vec<SyncOutcome>, CoreError> {
        let ranges = source.fetch_ranges().await?;
        let groups = self.api.list_groups().await?;
        debug!(groups = groups.len(), endpoints = endpoints.len(), "meta sync starting");

        let mut seen = BTreeSet::new();
        let mut outcomes = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            if !seen.insert(endpoint.as_str()) {
                continue;
            }
            let name = github_group_name(endpoint);
            let Some(published) = ranges.ranges(endpoint) else {
                warn!(%endpoint, available = ?ranges.keys(), "endpoint not in meta document");
                outcomes.push(SyncOutcome::failed(
                    name,
                    CoreError::not_found("meta-IP endpoint", endpoint),
                ));
                continue;
            };
            let cidrs: CidrSet = published.into_iter().collect();
            let target = find_by_key(&groups, GroupKey::Name(&name));
            outcomes.push(self.write_group(target, name, &cidrs).await);
        }
        Ok(outcomes)
    }

    // ── DNS A records ────────────────────────────────────────────────

    /// Refresh every `fqdn_*` group from its FQDN's A records.
    ///
    /// `extra_fqdns` names hosts that should have a group even if none
    /// exists yet; those are created. Names already covered by an
    /// existing group are not duplicated.
    pub async fn sync_fqdn_groups<R: HostResolver + Sync>(
        &self,
        resolver: &R,
        extra_fqdns: &[String],
    ) -> Result<Vec<SyncOutcome>, CoreError> {
        let groups = self.api.list_groups().await?;

        let mut names: Vec<String> = groups
            .iter()
            .filter(|g| g.name.starts_with(FQDN_PREFIX))
            .map(|g| g.name.clone())
            .collect();
        for fqdn in extra_fqdns {
            let name = fqdn_group_name(fqdn);
            if !names.contains(&name) {
                names.push(name);
            }
        }
        debug!(groups = names.len(), "fqdn sync starting");

        let mut outcomes = Vec::with_capacity(names.len());
        for name in names {
            let Some(fqdn) = fqdn_from_group_name(&name) else {
                outcomes.push(SyncOutcome::failed(
                    name.clone(),
                    CoreError::InvalidRequest {
                        message: format!("group name '{name}' does not encode an FQDN"),
                    },
                ));
                continue;
            };
            let addrs = match resolver.lookup_ipv4(&fqdn).await {
                Ok(addrs) => addrs,
                Err(err) => {
                    outcomes.push(SyncOutcome::failed(name, err));
                    continue;
                }
            };
            debug!(%fqdn, addrs = addrs.len(), "resolved");
            let cidrs: CidrSet = addrs.iter().map(ToString::to_string).collect();
            let target = find_by_key(&groups, GroupKey::Name(&name));
            outcomes.push(self.write_group(target, name, &cidrs).await);
        }
        Ok(outcomes)
    }

    // ── CIDR edits by UUID ───────────────────────────────────────────

    /// Apply `ADD` / `DELETE` of `cidrs` to the group with `uuid`.
    ///
    /// The action is validated before anything is read. A UUID miss is
    /// `ObjectNotFound`; there is no create path when addressing by UUID.
    pub async fn update_group_cidrs(
        &self,
        uuid: &str,
        cidrs: &[String],
        action: &str,
    ) -> Result<Value, CoreError> {
        let action = CidrAction::parse(action)?;
        let groups = self.api.list_groups().await?;

        let Some(group) = find_by_key(&groups, GroupKey::Uuid(uuid)).existing() else {
            debug!(%uuid, known = groups.len(), "SmartGroup UUID not found");
            return Err(CoreError::not_found("SmartGroup", uuid));
        };

        let operand: CidrSet = cidrs.iter().map(String::as_str).collect();
        let next = current_cidrs(group).apply(action, &operand);
        debug!(group = %group.name, %action, cidrs = next.len(), "computed desired CIDRs");

        let plan = WritePlan::for_target(Lookup::Existing(group), &group.name, &next);
        self.execute(&plan).await
    }

    // ── Rule list ────────────────────────────────────────────────────

    /// Compute and write the next full DCF rule list.
    pub async fn update_rule_list(&self, action: &RuleListAction) -> Result<Value, CoreError> {
        let current = self.api.list_rules().await?;
        debug!(rules = current.len(), action = %action.kind(), "current rule list");

        let next: Vec<PolicyRule> = next_rule_list(&current, action);
        info!(action = %action.kind(), before = current.len(), after = next.len(), "writing rule list");
        self.api.replace_rules(&next).await
    }

    /// Current SmartGroups, unmodified.
    pub async fn list_groups(&self) -> Result<Vec<AppDomain>, CoreError> {
        self.api.list_groups().await
    }

    /// Current DCF rule list, unmodified.
    pub async fn list_rules(&self) -> Result<Vec<PolicyRule>, CoreError> {
        self.api.list_rules().await
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testing {
    use std::collections::BTreeMap;
    use std::net::Ipv4Addr;
    use std::sync::Mutex;

    use serde_json::{Map, Value, json};

    use policysync_api::{AppDomain, AppDomainSpec, MetaRanges, PolicyRule, Selector, SelectorTerm};

    use crate::backend::{HostResolver, IpRangeSource, PolicyApi};
    use crate::error::CoreError;

    /// A write the fake controller received.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Write {
        Create(AppDomainSpec),
        Replace(String, AppDomainSpec),
        Rules(Vec<PolicyRule>),
    }

    #[derive(Default)]
    pub struct FakeController {
        pub groups: Vec<AppDomain>,
        pub rules: Vec<PolicyRule>,
        pub writes: Mutex<Vec<Write>>,
        /// Group names whose write should fail with HTTP 500.
        pub failing: Vec<String>,
    }

    impl FakeController {
        pub fn with_groups(groups: Vec<AppDomain>) -> Self {
            Self {
                groups,
                ..Self::default()
            }
        }

        pub fn writes(&self) -> Vec<Write> {
            self.writes.lock().unwrap().clone()
        }

        fn record(&self, name: &str, write: Write) -> Result<Value, CoreError> {
            if self.failing.iter().any(|n| n == name) {
                return Err(CoreError::Api {
                    status: Some(500),
                    body: "boom".into(),
                });
            }
            self.writes.lock().unwrap().push(write);
            Ok(json!({"return": true}))
        }
    }

    impl PolicyApi for FakeController {
        async fn list_groups(&self) -> Result<Vec<AppDomain>, CoreError> {
            Ok(self.groups.clone())
        }

        async fn create_group(&self, spec: &AppDomainSpec) -> Result<Value, CoreError> {
            self.record(&spec.name, Write::Create(spec.clone()))
        }

        async fn replace_group(&self, uuid: &str, spec: &AppDomainSpec) -> Result<Value, CoreError> {
            self.record(&spec.name, Write::Replace(uuid.to_owned(), spec.clone()))
        }

        async fn list_rules(&self) -> Result<Vec<PolicyRule>, CoreError> {
            Ok(self.rules.clone())
        }

        async fn replace_rules(&self, rules: &[PolicyRule]) -> Result<Value, CoreError> {
            self.record("", Write::Rules(rules.to_vec()))
        }
    }

    pub struct FakeMeta(pub Value);

    impl IpRangeSource for FakeMeta {
        async fn fetch_ranges(&self) -> Result<MetaRanges, CoreError> {
            let Value::Object(map) = self.0.clone() else {
                panic!("meta fixture must be an object");
            };
            Ok(MetaRanges::from_map(map))
        }
    }

    #[derive(Default)]
    pub struct FakeDns(pub BTreeMap<String, Vec<Ipv4Addr>>);

    impl HostResolver for FakeDns {
        async fn lookup_ipv4(&self, fqdn: &str) -> Result<Vec<Ipv4Addr>, CoreError> {
            if fqdn == "broken.example" {
                return Err(CoreError::Api {
                    status: None,
                    body: "SERVFAIL".into(),
                });
            }
            Ok(self.0.get(fqdn).cloned().unwrap_or_default())
        }
    }

    pub fn group(uuid: &str, name: &str, cidrs: &[&str]) -> AppDomain {
        AppDomain {
            uuid: uuid.into(),
            name: name.into(),
            selector: Selector {
                any: cidrs.iter().map(|c| SelectorTerm::cidr(*c)).collect(),
            },
            extra: Map::new(),
        }
    }

    pub fn rule(uuid: &str, priority: i64) -> PolicyRule {
        serde_json::from_value(json!({"uuid": uuid, "priority": priority})).unwrap()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::testing::{FakeController, FakeDns, FakeMeta, Write, group, rule};
    use super::*;
    use crate::reconcile::build_spec;

    fn set(items: &[&str]) -> CidrSet {
        items.iter().copied().collect()
    }

    #[tokio::test]
    async fn meta_sync_updates_existing_and_creates_missing() {
        let api = FakeController::with_groups(vec![group("u-git", "external_github_git", &[])]);
        let meta = FakeMeta(json!({
            "git": ["192.30.252.0/22", "2a0a:a440::/29"],
            "web": ["140.82.112.0/20"],
            "verifiable_password_authentication": false,
        }));

        let outcomes = Reconciler::new(&api)
            .sync_meta_groups(&meta, &["git".into(), "web".into()])
            .await
            .unwrap();

        assert!(outcomes.iter().all(SyncOutcome::is_ok));
        assert_eq!(
            api.writes(),
            vec![
                Write::Replace(
                    "u-git".into(),
                    build_spec("external_github_git", &set(&["192.30.252.0/22"]))
                ),
                Write::Create(build_spec("external_github_web", &set(&["140.82.112.0/20"]))),
            ]
        );
    }

    #[tokio::test]
    async fn meta_sync_reports_unknown_endpoint_and_continues() {
        let api = FakeController::default();
        let meta = FakeMeta(json!({"hooks": ["1.2.3.0/24"], "ssh_keys": false}));

        let outcomes = Reconciler::new(&api)
            .sync_meta_groups(&meta, &["ssh_keys".into(), "hooks".into()])
            .await
            .unwrap();

        assert!(matches!(
            outcomes[0].result,
            Err(CoreError::ObjectNotFound { .. })
        ));
        assert!(outcomes[1].is_ok());
        assert_eq!(api.writes().len(), 1);
    }

    #[tokio::test]
    async fn meta_sync_is_idempotent() {
        let api = FakeController::with_groups(vec![group("u1", "external_github_api", &[])]);
        let meta = FakeMeta(json!({"api": ["20.0.0.0/8", "1.0.0.0/8"]}));
        let reconciler = Reconciler::new(&api);

        reconciler.sync_meta_groups(&meta, &["api".into()]).await.unwrap();
        reconciler.sync_meta_groups(&meta, &["api".into()]).await.unwrap();

        let writes = api.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0], writes[1]);
    }

    #[tokio::test]
    async fn meta_sync_repeated_endpoint_creates_once() {
        let api = FakeController::default();
        let meta = FakeMeta(json!({"git": ["192.30.252.0/22"]}));

        let outcomes = Reconciler::new(&api)
            .sync_meta_groups(&meta, &["git".into(), "git".into()])
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(
            api.writes(),
            vec![Write::Create(build_spec("external_github_git", &set(&["192.30.252.0/22"])))]
        );
    }

    #[tokio::test]
    async fn one_failed_write_does_not_stop_others() {
        let mut api = FakeController::default();
        api.failing = vec!["external_github_git".into()];
        let meta = FakeMeta(json!({"git": ["1.1.1.0/24"], "web": ["2.2.2.0/24"]}));

        let outcomes = Reconciler::new(&api)
            .sync_meta_groups(&meta, &["git".into(), "web".into()])
            .await
            .unwrap();

        assert!(!outcomes[0].is_ok());
        assert!(outcomes[1].is_ok());
        let rendered = serde_json::to_value(&outcomes).unwrap();
        assert_eq!(rendered[0]["error"]["kind"], "api_error");
        assert_eq!(rendered[1]["write"], "create");
        assert_eq!(rendered[1]["cidrs"], 1);
    }

    #[tokio::test]
    async fn fqdn_sync_rewrites_each_group_from_dns() {
        let api = FakeController::with_groups(vec![
            group("u1", "fqdn_www_example_com", &["9.9.9.9"]),
            group("u2", "fqdn_empty_example", &["8.8.8.8"]),
            group("u3", "unrelated", &[]),
        ]);
        let dns = FakeDns(BTreeMap::from([(
            "www.example.com".to_owned(),
            vec!["93.184.216.34".parse().unwrap()],
        )]));

        let outcomes = Reconciler::new(&api).sync_fqdn_groups(&dns, &[]).await.unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(
            api.writes(),
            vec![
                Write::Replace(
                    "u1".into(),
                    build_spec("fqdn_www_example_com", &set(&["93.184.216.34"]))
                ),
                Write::Replace("u2".into(), build_spec("fqdn_empty_example", &CidrSet::new())),
            ]
        );
    }

    #[tokio::test]
    async fn fqdn_sync_creates_configured_hosts_and_isolates_dns_failures() {
        let api = FakeController::with_groups(vec![group("u1", "fqdn_broken_example", &[])]);
        let dns = FakeDns(BTreeMap::from([(
            "api.github.com".to_owned(),
            vec!["140.82.112.6".parse().unwrap()],
        )]));

        let outcomes = Reconciler::new(&api)
            .sync_fqdn_groups(&dns, &["api.github.com".into()])
            .await
            .unwrap();

        assert!(!outcomes[0].is_ok());
        assert_eq!(outcomes[1].write, Some("create"));
        assert_eq!(
            api.writes(),
            vec![Write::Create(build_spec(
                "fqdn_api_github_com",
                &set(&["140.82.112.6"])
            ))]
        );
    }

    #[tokio::test]
    async fn cidr_add_unions_with_current() {
        let api = FakeController::with_groups(vec![group("g1", "web", &["1.1.1.1/32"])]);

        Reconciler::new(&api)
            .update_group_cidrs("g1", &["10.0.0.0/8".into(), "fd00::/8".into()], "ADD")
            .await
            .unwrap();

        assert_eq!(
            api.writes(),
            vec![Write::Replace(
                "g1".into(),
                build_spec("web", &set(&["1.1.1.1/32", "10.0.0.0/8"]))
            )]
        );
    }

    #[tokio::test]
    async fn cidr_delete_can_empty_the_group() {
        let api = FakeController::with_groups(vec![group("g1", "web", &["1.1.1.1/32"])]);

        Reconciler::new(&api)
            .update_group_cidrs("g1", &["1.1.1.1/32".into()], "DELETE")
            .await
            .unwrap();

        assert_eq!(
            api.writes(),
            vec![Write::Replace("g1".into(), build_spec("web", &CidrSet::new()))]
        );
    }

    #[tokio::test]
    async fn cidr_update_of_unknown_uuid_is_not_found() {
        let api = FakeController::with_groups(vec![group("g1", "web", &[])]);

        let err = Reconciler::new(&api)
            .update_group_cidrs("nope", &["1.1.1.1/32".into()], "ADD")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "object_not_found");
        assert!(api.writes().is_empty());
    }

    #[tokio::test]
    async fn unknown_actions_never_write() {
        let api = FakeController::with_groups(vec![group("g1", "web", &[])]);
        let reconciler = Reconciler::new(&api);

        let err = reconciler
            .update_group_cidrs("g1", &["1.1.1.1/32".into()], "FROBNICATE")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_action");

        let err = RuleListAction::from_parts("FROBNICATE", None, None, None).unwrap_err();
        assert_eq!(err.kind(), "invalid_action");

        assert!(api.writes().is_empty());
    }

    #[tokio::test]
    async fn rule_list_replace_moves_rule_to_end() {
        let api = FakeController {
            rules: vec![rule("a", 1), rule("b", 2)],
            ..FakeController::default()
        };

        Reconciler::new(&api)
            .update_rule_list(&RuleListAction::ReplaceRule(rule("a", 5)))
            .await
            .unwrap();

        assert_eq!(api.writes(), vec![Write::Rules(vec![rule("b", 2), rule("a", 5)])]);
    }

    #[tokio::test]
    async fn rule_list_delete_of_absent_rule_writes_unchanged_list() {
        let api = FakeController {
            rules: vec![rule("a", 1), rule("b", 2)],
            ..FakeController::default()
        };

        Reconciler::new(&api)
            .update_rule_list(&RuleListAction::DeleteRule { uuid: "c".into() })
            .await
            .unwrap();

        assert_eq!(api.writes(), vec![Write::Rules(vec![rule("a", 1), rule("b", 2)])]);
    }
}
