// ── Collaborator seams ──
//
// The reconciler talks to the controller, the meta-IP source, DNS and
// CoPilot only through these traits. Production impls delegate to the
// `policysync-api` clients; tests substitute in-memory fakes.

use std::future::Future;
use std::net::Ipv4Addr;

use serde_json::Value;

use policysync_api::{
    AppDomain, AppDomainSpec, ControllerClient, CopilotClient, DcfLogEntry, DnsResolver,
    LogQuery, MetaClient, MetaRanges, PolicyRule,
};

use crate::error::CoreError;

/// Controller policy objects: SmartGroups and the DCF rule list.
pub trait PolicyApi {
    fn list_groups(&self) -> impl Future<Output = Result<Vec<AppDomain>, CoreError>> + Send;

    fn create_group(
        &self,
        spec: &AppDomainSpec,
    ) -> impl Future<Output = Result<Value, CoreError>> + Send;

    fn replace_group(
        &self,
        uuid: &str,
        spec: &AppDomainSpec,
    ) -> impl Future<Output = Result<Value, CoreError>> + Send;

    fn list_rules(&self) -> impl Future<Output = Result<Vec<PolicyRule>, CoreError>> + Send;

    fn replace_rules(
        &self,
        rules: &[PolicyRule],
    ) -> impl Future<Output = Result<Value, CoreError>> + Send;
}

/// Published IP-range metadata.
pub trait IpRangeSource {
    fn fetch_ranges(&self) -> impl Future<Output = Result<MetaRanges, CoreError>> + Send;
}

/// A-record resolution for `fqdn_*` groups.
pub trait HostResolver {
    fn lookup_ipv4(
        &self,
        fqdn: &str,
    ) -> impl Future<Output = Result<Vec<Ipv4Addr>, CoreError>> + Send;
}

/// DCF traffic logs (egress recommendations).
pub trait LogSource {
    fn count(&self, query: &LogQuery) -> impl Future<Output = Result<u64, CoreError>> + Send;

    fn page(
        &self,
        query: &LogQuery,
    ) -> impl Future<Output = Result<Vec<DcfLogEntry>, CoreError>> + Send;
}

// ── Production impls ─────────────────────────────────────────────────

impl PolicyApi for ControllerClient {
    async fn list_groups(&self) -> Result<Vec<AppDomain>, CoreError> {
        Ok(self.list_app_domains().await?)
    }

    async fn create_group(&self, spec: &AppDomainSpec) -> Result<Value, CoreError> {
        Ok(self.create_app_domain(spec).await?)
    }

    async fn replace_group(&self, uuid: &str, spec: &AppDomainSpec) -> Result<Value, CoreError> {
        Ok(self.replace_app_domain(uuid, spec).await?)
    }

    async fn list_rules(&self) -> Result<Vec<PolicyRule>, CoreError> {
        Ok(self.get_policy_list().await?)
    }

    async fn replace_rules(&self, rules: &[PolicyRule]) -> Result<Value, CoreError> {
        Ok(self.replace_policy_list(rules).await?)
    }
}

impl IpRangeSource for MetaClient {
    async fn fetch_ranges(&self) -> Result<MetaRanges, CoreError> {
        Ok(self.fetch().await?)
    }
}

impl HostResolver for DnsResolver {
    async fn lookup_ipv4(&self, fqdn: &str) -> Result<Vec<Ipv4Addr>, CoreError> {
        Ok(self.resolve_ipv4(fqdn).await?)
    }
}

impl LogSource for CopilotClient {
    async fn count(&self, query: &LogQuery) -> Result<u64, CoreError> {
        Ok(self.count_logs(query).await?)
    }

    async fn page(&self, query: &LogQuery) -> Result<Vec<DcfLogEntry>, CoreError> {
        Ok(self.fetch_logs(query).await?)
    }
}
