//! `invoke` command: run an event handler locally.
//!
//! Prints the `{statusCode, headers, body}` envelope exactly as a
//! function runtime would return it; a non-200 status fails the command.

use std::path::Path;

use serde_json::Value;

use policysync_core::EventResponse;
use policysync_core::event::{self, event_body};

use crate::cli::{InvokeArgs, InvokeCommand};
use crate::commands::{Context, fqdn, github, util};
use crate::config::{self, parse_name_list};
use crate::error::CliError;
use crate::output;

fn read_optional(path: Option<&Path>) -> Result<Option<Value>, CliError> {
    path.map(util::read_json_input).transpose()
}

/// A list field from a scheduled event: JSON array or comma-separated string.
fn list_field(event: Option<&Value>, field: &str) -> Result<Option<Vec<String>>, CliError> {
    let Some(event) = event else {
        return Ok(None);
    };
    let body = event_body(event)?;
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => Ok(Some(parse_name_list(field, raw)?)),
        Some(other) => Ok(Some(serde_json::from_value(other.clone()).map_err(|e| {
            CliError::Validation {
                field: field.into(),
                reason: format!("expected a list of strings: {e}"),
            }
        })?)),
    }
}

pub async fn handle(ctx: &Context<'_>, args: InvokeArgs) -> Result<(), CliError> {
    let response = match args.command {
        InvokeCommand::Smartgroup { event } => {
            let event = util::read_json_input(&event)?;
            let controller = ctx.connect().await?;
            event::handle_smartgroup_event(&controller, &event).await
        }

        InvokeCommand::Rules { event } => {
            let event = util::read_json_input(&event)?;
            let controller = ctx.connect().await?;
            event::handle_rule_list_event(&controller, &event).await
        }

        InvokeCommand::Github { event } => {
            let event = read_optional(event.as_deref())?;
            let endpoints = match list_field(event.as_ref(), "github_endpoints")? {
                Some(endpoints) => endpoints,
                None => config::resolve_github_endpoints(None, &ctx.profile)?,
            };
            let meta = github::meta_client(ctx, None)?;
            let controller = ctx.connect().await?;
            event::handle_github_sync(&controller, &meta, &endpoints).await
        }

        InvokeCommand::Fqdn { event } => {
            let event = read_optional(event.as_deref())?;
            let extra = list_field(event.as_ref(), "fqdns")?.unwrap_or_default();
            let fqdns = fqdn::extra_fqdns(&ctx.profile.fqdns, extra);
            let resolver = fqdn::resolver(ctx);
            let controller = ctx.connect().await?;
            event::handle_fqdn_sync(&controller, &resolver, &fqdns).await
        }
    };

    print_response(&response, ctx.global.quiet);
    if response.status_code == 200 {
        Ok(())
    } else {
        Err(CliError::HandlerStatus {
            status: response.status_code,
        })
    }
}

fn print_response(response: &EventResponse, quiet: bool) {
    output::print_output(&output::render_json_pretty(response), quiet);
}
