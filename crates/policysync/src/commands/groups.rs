//! `groups` command: list SmartGroups, edit CIDRs by UUID.

use tabled::Tabled;

use policysync_api::AppDomain;
use policysync_core::Reconciler;

use crate::cli::{GroupsArgs, GroupsCommand};
use crate::commands::{Context, util};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "UUID")]
    uuid: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "CIDRs")]
    cidrs: String,
}

fn group_row(g: &AppDomain) -> GroupRow {
    let cidrs: Vec<&str> = g.cidrs().collect();
    GroupRow {
        uuid: g.uuid.clone(),
        name: g.name.clone(),
        cidrs: if cidrs.is_empty() {
            "-".into()
        } else {
            cidrs.join("\n")
        },
    }
}

pub async fn handle(ctx: &Context<'_>, args: GroupsArgs) -> Result<(), CliError> {
    match args.command {
        GroupsCommand::List { prefix } => {
            let controller = ctx.connect().await?;
            let mut groups = Reconciler::new(&controller).list_groups().await?;
            if let Some(ref prefix) = prefix {
                groups.retain(|g| g.name.starts_with(prefix.as_str()));
            }
            groups.sort_by(|a, b| a.name.cmp(&b.name));

            let out = output::render_list(&ctx.global.output, &groups, group_row, |g| {
                g.uuid.clone()
            });
            output::print_output(&out, ctx.global.quiet);
            Ok(())
        }

        GroupsCommand::Update {
            uuid,
            action,
            cidrs,
        } => {
            util::require_uuid("uuid", &uuid)?;

            let controller = ctx.connect().await?;
            let result = Reconciler::new(&controller)
                .update_group_cidrs(&uuid, &cidrs, action.as_action())
                .await?;

            let out = output::render_single(
                &ctx.global.output,
                &result,
                |_| format!("✓ {} {} CIDR(s) on {uuid}", action.as_action(), cidrs.len()),
                |_| uuid.clone(),
            );
            output::print_output(&out, ctx.global.quiet);
            Ok(())
        }
    }
}
