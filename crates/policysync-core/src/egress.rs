// ── Egress recommendations ──
//
// Read-only analysis of DCF enforcement logs. Picks the policies that
// govern internet egress, pages their logs out of CoPilot, and groups
// the observed destinations by port/protocol so they can be turned into
// WebGroups (L7, by SNI hostname) or SmartGroups (L4, by address).

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use policysync_api::{DcfLogEntry, LogQuery, PolicyRule};

use crate::backend::{LogSource, PolicyApi};
use crate::error::CoreError;

/// The controller's built-in "Public Internet" SmartGroup.
pub const PUBLIC_INTERNET_GROUP: &str = "def000ad-0000-0000-0000-000000000001";

/// The controller's built-in default rule.
pub const DEFAULT_RULE_UUID: &str = "defa11a1-2000-0000-0000-000000000000";

/// CoPilot page size.
pub const PAGE_SIZE: u32 = 100;

const TAG_L7: &str = "mitm";
const TAG_L4: &str = "ebpf";

/// Parameters for one recommendation run.
#[derive(Debug, Clone)]
pub struct EgressParams {
    /// Analyse only rules with this priority. `None` or `0` selects every
    /// rule that sends traffic to the Public Internet group.
    pub priority: Option<i64>,
    /// Look-back window in days.
    pub days: u32,
    /// Reference "now" for the look-back window.
    pub now: DateTime<Utc>,
}

// ── Policy selection ─────────────────────────────────────────────────

/// UUIDs of the rules whose logs should be analysed.
pub fn select_policy_uuids(rules: &[PolicyRule], priority: Option<i64>) -> Vec<String> {
    let wanted = |rule: &PolicyRule| match priority {
        Some(p) if p > 0 => rule.priority() == Some(p),
        _ => {
            rule.dst_ads().any(|g| g == PUBLIC_INTERNET_GROUP)
                && rule.uuid() != Some(DEFAULT_RULE_UUID)
        }
    };
    rules
        .iter()
        .filter(|r| wanted(r))
        .filter_map(|r| r.uuid().map(str::to_owned))
        .collect()
}

/// Start of the look-back window in the timestamp form CoPilot filters on.
pub fn window_start(now: DateTime<Utc>, days: u32) -> String {
    (now - Duration::days(i64::from(days)))
        .format("%Y-%m-%dT%H:%M:%S%.3f")
        .to_string()
}

// ── Log paging ───────────────────────────────────────────────────────

/// Page through every log matching `query`.
///
/// The expected page count comes from the count endpoint; paging stops
/// early on an empty page. Each page continues after the last entry of
/// the previous one. `progress` receives `(fetched, total)` after each
/// page.
pub async fn collect_logs<L: LogSource + Sync>(
    source: &L,
    mut query: LogQuery,
    mut progress: impl FnMut(usize, u64),
) -> Result<Vec<DcfLogEntry>, CoreError> {
    let total = source.count(&query).await?;
    let pages = total.div_ceil(u64::from(query.size.max(1)));
    info!(total, pages, "fetching DCF logs");

    let mut logs = Vec::new();
    for page in 0..pages {
        let items = source.page(&query).await?;
        let Some(last) = items.last() else {
            debug!(page, "empty page, stopping");
            break;
        };
        query.search_after = (!last.search_after.is_empty()).then(|| last.search_after.clone());
        logs.extend(items);
        progress(logs.len(), total);
    }

    info!(fetched = logs.len(), "DCF logs collected");
    Ok(logs)
}

// ── Grouping ─────────────────────────────────────────────────────────

/// Destinations seen on one port/protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub port: u32,
    pub protocol: String,
    /// SNI hostnames (L7) or destination addresses (L4), sorted.
    pub destinations: Vec<String>,
}

fn group_by_port(rows: impl Iterator<Item = (u32, String, String)>) -> Vec<Recommendation> {
    let mut grouped: BTreeMap<(u32, String), BTreeSet<String>> = BTreeMap::new();
    for (port, protocol, destination) in rows {
        grouped.entry((port, protocol)).or_default().insert(destination);
    }
    grouped
        .into_iter()
        .map(|((port, protocol), dests)| Recommendation {
            port,
            protocol,
            destinations: dests.into_iter().collect(),
        })
        .collect()
}

/// L7 candidates: unique SNI hostnames from TLS-inspected logs.
pub fn recommend_webgroups(logs: &[DcfLogEntry]) -> Vec<Recommendation> {
    group_by_port(
        logs.iter()
            .filter(|l| l.has_tag(TAG_L7))
            .filter_map(|l| {
                let host = l.mitm_sni_hostname.clone()?;
                Some((l.destination_port, l.protocol.clone(), host))
            }),
    )
}

/// L4 candidates: unique destination addresses from eBPF logs.
///
/// A flow logged with a source port below its destination port is taken
/// to be a reply, so the two ends are swapped before grouping.
pub fn recommend_smartgroups(logs: &[DcfLogEntry]) -> Vec<Recommendation> {
    group_by_port(logs.iter().filter(|l| l.has_tag(TAG_L4)).map(|l| {
        if l.source_port < l.destination_port {
            (l.source_port, l.protocol.clone(), l.source_ip.clone())
        } else {
            (l.destination_port, l.protocol.clone(), l.destination_ip.clone())
        }
    }))
}

// ── Runner ───────────────────────────────────────────────────────────

/// Everything one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct EgressReport {
    pub policies: Vec<String>,
    pub window_start: String,
    pub logs: usize,
    pub webgroups: Vec<Recommendation>,
    pub smartgroups: Vec<Recommendation>,
}

/// Select policies on the controller, pull their logs, and group them.
pub async fn recommend<A, L>(
    api: &A,
    source: &L,
    params: &EgressParams,
    progress: impl FnMut(usize, u64),
) -> Result<EgressReport, CoreError>
where
    A: PolicyApi + Sync,
    L: LogSource + Sync,
{
    let rules = api.list_rules().await?;
    let policies = select_policy_uuids(&rules, params.priority);
    let start = window_start(params.now, params.days);
    debug!(policies = policies.len(), %start, "selected policies");

    if policies.is_empty() {
        warn!("no matching policies; nothing to analyse");
        return Ok(EgressReport {
            policies,
            window_start: start,
            logs: 0,
            webgroups: Vec::new(),
            smartgroups: Vec::new(),
        });
    }

    let query = LogQuery::for_policies(&policies, &start, PAGE_SIZE);
    let logs = collect_logs(source, query, progress).await?;

    Ok(EgressReport {
        webgroups: recommend_webgroups(&logs),
        smartgroups: recommend_smartgroups(&logs),
        logs: logs.len(),
        policies,
        window_start: start,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    use super::*;
    use crate::reconciler::testing::FakeController;

    fn log(value: Value) -> DcfLogEntry {
        serde_json::from_value(value).unwrap()
    }

    struct FakeLogs {
        total: u64,
        pages: Vec<Vec<DcfLogEntry>>,
        seen: Mutex<Vec<LogQuery>>,
    }

    impl LogSource for FakeLogs {
        async fn count(&self, _query: &LogQuery) -> Result<u64, CoreError> {
            Ok(self.total)
        }

        async fn page(&self, query: &LogQuery) -> Result<Vec<DcfLogEntry>, CoreError> {
            let mut seen = self.seen.lock().unwrap();
            let idx = seen.len();
            seen.push(query.clone());
            Ok(self.pages.get(idx).cloned().unwrap_or_default())
        }
    }

    fn rules() -> Vec<PolicyRule> {
        serde_json::from_value(json!([
            {"uuid": "r1", "priority": 10, "dst_ads": [PUBLIC_INTERNET_GROUP]},
            {"uuid": "r2", "priority": 20, "dst_ads": ["some-group"]},
            {"uuid": DEFAULT_RULE_UUID, "priority": 2_147_483_647, "dst_ads": [PUBLIC_INTERNET_GROUP]},
        ]))
        .unwrap()
    }

    #[test]
    fn internet_policies_exclude_default_rule() {
        assert_eq!(select_policy_uuids(&rules(), None), vec!["r1"]);
        assert_eq!(select_policy_uuids(&rules(), Some(0)), vec!["r1"]);
    }

    #[test]
    fn priority_selects_exact_match() {
        assert_eq!(select_policy_uuids(&rules(), Some(20)), vec!["r2"]);
        assert!(select_policy_uuids(&rules(), Some(99)).is_empty());
    }

    #[test]
    fn window_start_is_days_before_now() {
        let now = Utc.with_ymd_and_hms(2024, 5, 8, 19, 49, 34).unwrap();
        assert_eq!(window_start(now, 1), "2024-05-07T19:49:34.000");
    }

    #[test]
    fn l4_swaps_reply_direction() {
        let logs = vec![
            log(json!({"sourceIp": "10.0.0.5", "destinationIp": "52.1.1.1", "protocol": "TCP",
                       "sourcePort": 50000, "destinationPort": 5432, "tags": ["ebpf"]})),
            log(json!({"sourceIp": "52.1.1.2", "destinationIp": "10.0.0.5", "protocol": "TCP",
                       "sourcePort": 5432, "destinationPort": 50001, "tags": ["ebpf"]})),
            log(json!({"sourceIp": "10.0.0.5", "destinationIp": "8.8.8.8", "protocol": "UDP",
                       "sourcePort": 40000, "destinationPort": 53, "tags": ["mitm"]})),
        ];
        assert_eq!(
            recommend_smartgroups(&logs),
            vec![Recommendation {
                port: 5432,
                protocol: "TCP".into(),
                destinations: vec!["52.1.1.1".into(), "52.1.1.2".into()],
            }]
        );
    }

    #[test]
    fn l7_groups_unique_hostnames() {
        let logs = vec![
            log(json!({"protocol": "TCP", "destinationPort": 443, "tags": ["mitm", "microseg"],
                       "mitmSniHostname": "config.edge.skype.com"})),
            log(json!({"protocol": "TCP", "destinationPort": 443, "tags": ["mitm"],
                       "mitmSniHostname": "config.edge.skype.com"})),
            log(json!({"protocol": "TCP", "destinationPort": 80, "tags": ["mitm"],
                       "mitmSniHostname": "example.com"})),
            log(json!({"protocol": "TCP", "destinationPort": 443, "tags": ["ebpf"]})),
        ];
        let recs = recommend_webgroups(&logs);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].port, 80);
        assert_eq!(recs[1].destinations, vec!["config.edge.skype.com"]);
    }

    #[tokio::test]
    async fn paging_follows_search_after_and_stops_on_empty_page() {
        let page = |n: i64| {
            vec![log(json!({"tags": ["ebpf"], "_searchAfter": [n]}))]
        };
        let source = FakeLogs {
            total: 250,
            pages: vec![page(3), page(2)],
            seen: Mutex::new(Vec::new()),
        };
        let mut ticks = Vec::new();

        let logs = collect_logs(
            &source,
            LogQuery::for_policies(&["r1".into()], "2024-05-07T00:00:00.000", PAGE_SIZE),
            |fetched, total| ticks.push((fetched, total)),
        )
        .await
        .unwrap();

        assert_eq!(logs.len(), 2);
        assert_eq!(ticks, vec![(1, 250), (2, 250)]);
        let seen = source.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].search_after, None);
        assert_eq!(seen[1].search_after, Some(vec![json!(3)]));
        assert_eq!(seen[2].search_after, Some(vec![json!(2)]));
    }

    #[tokio::test]
    async fn no_matching_policies_skips_log_queries() {
        let api = FakeController::default();
        let source = FakeLogs {
            total: 10,
            pages: Vec::new(),
            seen: Mutex::new(Vec::new()),
        };
        let params = EgressParams {
            priority: None,
            days: 1,
            now: Utc::now(),
        };

        let report = recommend(&api, &source, &params, |_, _| {}).await.unwrap();

        assert_eq!(report.logs, 0);
        assert!(source.seen.lock().unwrap().is_empty());
    }
}
