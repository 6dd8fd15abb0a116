//! `rules` command: show and edit the ordered DCF rule list.

use std::path::Path;

use tabled::Tabled;

use policysync_api::PolicyRule;
use policysync_core::event::PolicyListInput;
use policysync_core::{Reconciler, RuleListAction};

use crate::cli::{RulesArgs, RulesCommand};
use crate::commands::{Context, util};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "UUID")]
    uuid: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Src")]
    src: String,
    #[tabled(rename = "Dst")]
    dst: String,
}

fn or_dash(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".into())
}

fn rule_row(position: usize, r: &PolicyRule) -> RuleRow {
    RuleRow {
        position,
        uuid: or_dash(r.uuid().map(str::to_owned)),
        name: r.name().to_owned(),
        action: or_dash(r.action().map(|a| a.to_string())),
        priority: or_dash(r.priority().map(|p| p.to_string())),
        src: r.src_ads().collect::<Vec<_>>().join("\n"),
        dst: r.dst_ads().collect::<Vec<_>>().join("\n"),
    }
}

fn read_rule(path: &Path) -> Result<PolicyRule, CliError> {
    Ok(serde_json::from_value(util::read_json_input(path)?)?)
}

pub async fn handle(ctx: &Context<'_>, args: RulesArgs) -> Result<(), CliError> {
    let action = match args.command {
        RulesCommand::List => {
            let controller = ctx.connect().await?;
            let rules = Reconciler::new(&controller).list_rules().await?;

            // 1-based; the controller evaluates rules in list order.
            let mut position = 0;
            let out = output::render_list(
                &ctx.global.output,
                &rules,
                |r| {
                    position += 1;
                    rule_row(position, r)
                },
                |r| r.uuid().unwrap_or_default().to_owned(),
            );
            output::print_output(&out, ctx.global.quiet);
            return Ok(());
        }

        RulesCommand::Add { from_file } => RuleListAction::AddRule(read_rule(&from_file)?),

        RulesCommand::Delete { uuid } => {
            util::require_uuid("uuid", &uuid)?;
            if !util::confirm(&format!("Delete rule {uuid}?"), ctx.global.yes)? {
                return Ok(());
            }
            RuleListAction::DeleteRule { uuid }
        }

        RulesCommand::Replace { from_file, uuid } => {
            let rule = read_rule(&from_file)?;
            RuleListAction::from_parts("REPLACE_RULE", Some(rule), uuid, None)?
        }

        RulesCommand::ReplaceList { from_file } => {
            let input: PolicyListInput = serde_json::from_value(util::read_json_input(&from_file)?)?;
            let rules = input.into_rules();
            if !util::confirm(
                &format!("Overwrite the rule list with {} rule(s)?", rules.len()),
                ctx.global.yes,
            )? {
                return Ok(());
            }
            RuleListAction::ReplaceList(rules)
        }
    };

    let controller = ctx.connect().await?;
    let result = Reconciler::new(&controller).update_rule_list(&action).await?;

    let kind = action.kind();
    let out = output::render_single(
        &ctx.global.output,
        &result,
        |_| format!("✓ {kind} applied"),
        |_| kind.to_string(),
    );
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}
