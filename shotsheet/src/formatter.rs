//! Output formatters for sync results

use anyhow::Result;
use colored::*;
use shotsheet_core::{SyncError, UpdateRecord, WriteOutcome, WritePlan};

fn print_header(record: &UpdateRecord) {
    println!(
        "{} {} {} {}",
        "Shot:".bold(),
        record.shot.cyan().bold(),
        "Task:".bold(),
        record.task.cyan()
    );
    println!(
        "  {} {} ({})",
        "Sheet:".bold(),
        record.sheet_name,
        record.record_type().to_string().bright_black()
    );
}

fn print_values(plan: &WritePlan) {
    println!("  {} {}", "Range:".bold(), plan.qualified_range().yellow());
    for (offset, value) in plan.values.iter().enumerate() {
        let cell = shotsheet_core::cell_ref(plan.range.start.row, plan.range.start.col + offset as u32);
        match value {
            Some(value) => println!("    {} = {:?}", cell.bright_black(), value),
            None => println!("    {} {}", cell.bright_black(), "(unchanged)".bright_black()),
        }
    }
}

/// Print a completed write in human-readable format
pub fn print_outcome_human(record: &UpdateRecord, outcome: &WriteOutcome) {
    print_header(record);
    print_values(&outcome.plan);
    println!();
    println!(
        "{}",
        format!("✓ {} cells updated", outcome.summary.updated_cells)
            .green()
            .bold()
    );
}

/// Print a resolved plan without a write
pub fn print_plan_human(record: &UpdateRecord, plan: &WritePlan) {
    println!("{}", "[DRY RUN] No cells were written".yellow().bold());
    print_header(record);
    print_values(plan);
}

pub fn print_outcome_json(record: &UpdateRecord, outcome: &WriteOutcome) -> Result<()> {
    let output = serde_json::json!({
        "ok": true,
        "record": record,
        "range": outcome.plan.qualified_range(),
        "values": outcome.plan.values,
        "updated_cells": outcome.summary.updated_cells,
        "updated_range": outcome.summary.updated_range,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn print_plan_json(record: &UpdateRecord, plan: &WritePlan) -> Result<()> {
    let output = serde_json::json!({
        "ok": true,
        "dry_run": true,
        "record": record,
        "row": plan.row,
        "range": plan.qualified_range(),
        "values": plan.values,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn sync_error(err: &anyhow::Error) -> Option<&SyncError> {
    err.chain().find_map(|e| e.downcast_ref::<SyncError>())
}

pub fn print_error_human(err: &anyhow::Error) {
    eprintln!("{} {:#}", "✗ Update not applied:".red().bold(), err);
}

/// Failures still go to stdout in JSON mode so callers parse a single stream
pub fn print_error_json(err: &anyhow::Error) {
    let kind = sync_error(err).map(SyncError::kind).unwrap_or("other");
    let output = serde_json::json!({
        "ok": false,
        "error": {
            "kind": kind,
            "message": format!("{:#}", err),
        }
    });
    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{}", json),
        Err(_) => eprintln!("{:#}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_sync_error_found_through_context() {
        let err: anyhow::Error = Err::<(), _>(SyncError::ShotNotFound {
            shot: "sh010".to_string(),
        })
        .context("Failed to apply update")
        .unwrap_err();

        assert_eq!(sync_error(&err).map(SyncError::kind), Some("shot_not_found"));
        assert!(format!("{:#}", err).contains("shot 'sh010' not found"));
    }

    #[test]
    fn test_plain_error_has_no_kind() {
        let err = anyhow::anyhow!("boom");
        assert!(sync_error(&err).is_none());
    }
}
