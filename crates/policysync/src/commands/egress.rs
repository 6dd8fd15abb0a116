//! `egress` command: WebGroup/SmartGroup candidates from DCF logs.

use std::fmt::Write as _;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Tabled;

use policysync_core::egress::{self, EgressReport};
use policysync_core::{EgressParams, Recommendation};

use crate::cli::{EgressArgs, EgressCommand, OutputFormat};
use crate::commands::Context;
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct RecommendationRow {
    #[tabled(rename = "Port")]
    port: u32,
    #[tabled(rename = "Protocol")]
    protocol: String,
    #[tabled(rename = "Destinations")]
    destinations: String,
}

impl From<&Recommendation> for RecommendationRow {
    fn from(r: &Recommendation) -> Self {
        Self {
            port: r.port,
            protocol: r.protocol.clone(),
            destinations: r.destinations.join("\n"),
        }
    }
}

fn detail(report: &EgressReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Analysed {} log(s) from {} polic(ies) since {}",
        report.logs,
        report.policies.len(),
        report.window_start
    );
    for (title, recs) in [
        ("WebGroup candidates (L7 SNI)", &report.webgroups),
        ("SmartGroup candidates (L4)", &report.smartgroups),
    ] {
        let _ = writeln!(out, "\n{title}");
        if recs.is_empty() {
            let _ = writeln!(out, "  (none)");
        } else {
            let rows: Vec<RecommendationRow> = recs.iter().map(RecommendationRow::from).collect();
            let _ = writeln!(out, "{}", output::render_table(&rows));
        }
    }
    out
}

fn progress_bar(global_quiet: bool, format: &OutputFormat) -> ProgressBar {
    if global_quiet || !matches!(format, OutputFormat::Table) {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("{spinner} fetching logs {pos}/{len} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

pub async fn handle(ctx: &Context<'_>, args: EgressArgs) -> Result<(), CliError> {
    match args.command {
        EgressCommand::Recommend {
            priority,
            days,
            copilot,
        } => {
            let copilot_config =
                config::resolve_copilot_config(ctx.global, ctx.config, copilot.as_deref())?;
            let params = EgressParams {
                priority: (priority > 0).then_some(priority),
                days,
                now: chrono::Utc::now(),
            };

            let controller = ctx.connect().await?;
            let copilot = policysync_core::connect_copilot(&copilot_config).await?;

            let pb = progress_bar(ctx.global.quiet, &ctx.global.output);
            let report = egress::recommend(&controller, &copilot, &params, |fetched, total| {
                pb.set_length(total);
                pb.set_position(u64::try_from(fetched).unwrap_or(u64::MAX));
            })
            .await;
            pb.finish_and_clear();

            if let Err(err) = copilot.logout().await {
                tracing::warn!(error = %err, "CoPilot logout failed");
            }
            let report = report?;

            let out = output::render_single(&ctx.global.output, &report, detail, |r| {
                r.webgroups
                    .iter()
                    .chain(&r.smartgroups)
                    .flat_map(|rec| rec.destinations.iter().cloned())
                    .collect::<Vec<_>>()
                    .join("\n")
            });
            output::print_output(&out, ctx.global.quiet);
            Ok(())
        }
    }
}
