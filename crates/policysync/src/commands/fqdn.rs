//! `fqdn` command: refresh `fqdn_*` groups from DNS.

use policysync_api::DnsResolver;
use policysync_core::Reconciler;

use crate::cli::{FqdnArgs, FqdnCommand};
use crate::commands::{Context, util};
use crate::error::CliError;

pub async fn handle(ctx: &Context<'_>, args: FqdnArgs) -> Result<(), CliError> {
    match args.command {
        FqdnCommand::Sync { fqdns } => {
            let extra = extra_fqdns(&ctx.profile.fqdns, fqdns);
            let resolver = resolver(ctx);

            let controller = ctx.connect().await?;
            let outcomes = Reconciler::new(&controller)
                .sync_fqdn_groups(&resolver, &extra)
                .await?;
            util::report_outcomes(&outcomes, ctx.global)
        }
    }
}

/// System resolver, or the public defaults when the host config is unreadable.
pub(crate) fn resolver(ctx: &Context<'_>) -> DnsResolver {
    DnsResolver::from_system(ctx.timeout()).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "system resolver unavailable, using defaults");
        DnsResolver::with_defaults(ctx.timeout())
    })
}

/// Profile hosts followed by flag hosts, without repeats.
pub(crate) fn extra_fqdns(profile: &[String], flags: Vec<String>) -> Vec<String> {
    let mut all = profile.to_vec();
    for fqdn in flags {
        if !all.contains(&fqdn) {
            all.push(fqdn);
        }
    }
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_hosts_extend_profile_hosts() {
        let merged = extra_fqdns(
            &["a.example.com".to_owned()],
            vec!["b.example.com".into(), "a.example.com".into()],
        );
        assert_eq!(merged, vec!["a.example.com", "b.example.com"]);
    }
}
