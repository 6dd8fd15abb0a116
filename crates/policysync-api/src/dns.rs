// DNS A-record resolution
//
// Thin wrapper over hickory's tokio resolver. An NXDOMAIN or empty
// answer is a valid outcome (the group simply matches nothing), so
// only genuine resolver failures surface as errors.

use std::net::Ipv4Addr;
use std::time::Duration;

use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use tracing::debug;

use crate::error::Error;

/// Async A-record resolver.
#[derive(Clone)]
pub struct DnsResolver {
    inner: TokioAsyncResolver,
}

impl DnsResolver {
    /// Resolver using the host's `/etc/resolv.conf` (or platform
    /// equivalent). `timeout` bounds each query attempt.
    pub fn from_system(timeout: Duration) -> Result<Self, Error> {
        let (config, mut opts) =
            hickory_resolver::system_conf::read_system_conf().map_err(|e| Error::Dns {
                name: "<system config>".into(),
                message: e.to_string(),
            })?;
        opts.timeout = timeout;
        Ok(Self {
            inner: TokioAsyncResolver::tokio(config, opts),
        })
    }

    /// Resolver pointed at the public default upstreams.
    pub fn with_defaults(timeout: Duration) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        Self {
            inner: TokioAsyncResolver::tokio(ResolverConfig::default(), opts),
        }
    }

    /// Query A records for `fqdn`. Returns addresses sorted and deduplicated.
    pub async fn resolve_ipv4(&self, fqdn: &str) -> Result<Vec<Ipv4Addr>, Error> {
        match self.inner.ipv4_lookup(fqdn).await {
            Ok(lookup) => {
                let mut addrs: Vec<Ipv4Addr> = lookup.iter().map(|a| a.0).collect();
                addrs.sort_unstable();
                addrs.dedup();
                debug!(fqdn, count = addrs.len(), "resolved A records");
                Ok(addrs)
            }
            Err(e) if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) => {
                debug!(fqdn, "no A records");
                Ok(Vec::new())
            }
            Err(e) => Err(Error::Dns {
                name: fqdn.to_owned(),
                message: e.to_string(),
            }),
        }
    }
}
