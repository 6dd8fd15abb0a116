//! Shared helpers for command handlers.

use std::io::{IsTerminal, Read};
use std::path::Path;

use tabled::Tabled;

use policysync_core::SyncOutcome;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal on stdin there is nobody to ask, so the caller must
/// pass `--yes`.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read and parse JSON from a file, or from stdin when `path` is `-`.
pub fn read_json_input(path: &Path) -> Result<serde_json::Value, CliError> {
    let contents = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: path.display().to_string(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Reject identifiers that are not UUIDs before any request is made.
pub fn require_uuid(field: &str, raw: &str) -> Result<(), CliError> {
    uuid::Uuid::parse_str(raw)
        .map(|_| ())
        .map_err(|e| CliError::Validation {
            field: field.into(),
            reason: format!("'{raw}' is not a UUID: {e}"),
        })
}

// ── Multi-group sync results ────────────────────────────────────────

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Write")]
    write: String,
    #[tabled(rename = "CIDRs")]
    cidrs: usize,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

/// Print per-group outcomes; any failed group fails the command after
/// the full table has been printed.
pub fn report_outcomes(outcomes: &[SyncOutcome], global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        outcomes,
        |o| OutcomeRow {
            group: o.group.clone(),
            write: o.write.unwrap_or("-").to_owned(),
            cidrs: o.cidrs,
            status: output::status_cell(o.is_ok(), color),
            detail: o.result.as_ref().err().map(ToString::to_string).unwrap_or_default(),
        },
        |o| o.group.clone(),
    );
    output::print_output(&out, global.quiet);

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if failed > 0 {
        return Err(CliError::PartialFailure {
            failed,
            total: outcomes.len(),
        });
    }
    Ok(())
}
