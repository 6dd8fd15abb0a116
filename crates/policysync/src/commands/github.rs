//! `github` command: mirror published meta-IP ranges.

use policysync_api::MetaClient;
use policysync_core::Reconciler;

use crate::cli::{GithubArgs, GithubCommand};
use crate::commands::{Context, util};
use crate::config;
use crate::error::CliError;

pub async fn handle(ctx: &Context<'_>, args: GithubArgs) -> Result<(), CliError> {
    match args.command {
        GithubCommand::Sync { endpoints, api_url } => {
            let endpoints = config::resolve_github_endpoints(endpoints.as_deref(), &ctx.profile)?;
            let meta = meta_client(ctx, api_url.as_deref())?;

            let controller = ctx.connect().await?;
            let outcomes = Reconciler::new(&controller)
                .sync_meta_groups(&meta, &endpoints)
                .await?;
            util::report_outcomes(&outcomes, ctx.global)
        }
    }
}

/// Meta-IP client on system-root TLS, whatever the controller uses.
pub(crate) fn meta_client(ctx: &Context<'_>, api_url: Option<&str>) -> Result<MetaClient, CliError> {
    let base = config::resolve_github_api(api_url, &ctx.profile)?;
    Ok(MetaClient::new(base, &ctx.transport().for_public_endpoint())?)
}
