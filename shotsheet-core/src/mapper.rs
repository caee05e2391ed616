//! Maps an update record onto a row and column span of its tracking sheet

use crate::cell_ref::CellRange;
use crate::error::{Result, SyncError};
use crate::layout::ColumnLayouts;
use crate::record::{RecordKind, UpdateRecord};
use crate::service::{SheetsService, UpdateSummary, qualified_range, quote_sheet_name};
use crate::snapshot::SheetSnapshot;
use serde::Serialize;

/// Where a record will be written and with which values
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WritePlan {
    pub sheet_name: String,
    /// Zero-based row in the snapshot
    pub row: usize,
    pub range: CellRange,
    /// One entry per cell of `range`; `None` keeps the cell's current value
    pub values: Vec<Option<String>>,
}

impl WritePlan {
    /// Range including the sheet name, e.g. "'Shots'!P2"
    pub fn qualified_range(&self) -> String {
        qualified_range(&self.sheet_name, &self.range.to_string())
    }
}

/// A completed write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
    pub plan: WritePlan,
    pub summary: UpdateSummary,
}

/// Resolves records against sheet snapshots using a fixed layout table
pub struct RecordMapper {
    layouts: ColumnLayouts,
}

impl RecordMapper {
    pub fn new(layouts: ColumnLayouts) -> Self {
        Self { layouts }
    }

    /// Find the target row and columns for `record` in `snapshot`
    pub fn plan(&self, record: &UpdateRecord, snapshot: &SheetSnapshot) -> Result<WritePlan> {
        let shot_col = self.layouts.shot_column(record.record_type());
        let shot_row = snapshot
            .find(shot_col, &record.shot)
            .ok_or_else(|| SyncError::ShotNotFound {
                shot: record.shot.clone(),
            })?;

        let (row, first_col, last_col, values) = match &record.kind {
            RecordKind::Animation { phase, status } => {
                let col = self.layouts.animation.status_column(*phase);
                (shot_row, col, col, vec![Some(status.clone())])
            }
            RecordKind::Render {
                phase,
                assignees,
                status,
                date,
            } => {
                let cols = self.layouts.render.phase(*phase);
                (
                    shot_row,
                    cols.assignee,
                    cols.date,
                    vec![
                        Some(assignees.clone()),
                        Some(status.clone()),
                        Some(date.clone()),
                    ],
                )
            }
            RecordKind::General {
                assignees,
                status,
                task_type,
                description,
            } => {
                // Task rows are listed under their shot, so the search starts at
                // the shot row and runs to the end of the sheet.
                let layout = &self.layouts.general;
                let task_row = snapshot
                    .find_from(shot_row, layout.task, &record.task)
                    .ok_or_else(|| SyncError::TaskNotFound {
                        shot: record.shot.clone(),
                        task: record.task.clone(),
                    })?;
                (
                    task_row,
                    layout.assignee,
                    layout.description,
                    vec![
                        Some(assignees.clone()),
                        Some(record.task.clone()),
                        Some(status.clone()),
                        task_type.clone(),
                        description.clone(),
                    ],
                )
            }
        };

        let sheet_row = u32::try_from(row).map_err(|_| {
            SyncError::Config(format!("row {} is beyond the addressable sheet size", row))
        })?;

        Ok(WritePlan {
            sheet_name: record.sheet_name.clone(),
            row,
            range: CellRange::row_span(sheet_row, first_col, last_col),
            values,
        })
    }

    /// Read the record's sheet and resolve the plan without writing
    pub fn resolve<S: SheetsService + ?Sized>(
        &self,
        record: &UpdateRecord,
        service: &S,
    ) -> Result<WritePlan> {
        let rows = service.get_values(&record.spreadsheet_id, &quote_sheet_name(&record.sheet_name))?;
        let snapshot = SheetSnapshot::new(rows);
        log::debug!(
            "Read {} rows from '{}' in {}",
            snapshot.len(),
            record.sheet_name,
            record.spreadsheet_id
        );

        let plan = self.plan(record, &snapshot)?;
        log::info!(
            "Shot '{}' task '{}' resolved to {}",
            record.shot,
            record.task,
            plan.qualified_range()
        );
        Ok(plan)
    }

    /// Read the sheet, resolve the target and write the record's values once
    pub fn apply<S: SheetsService + ?Sized>(
        &self,
        record: &UpdateRecord,
        service: &S,
    ) -> Result<WriteOutcome> {
        let plan = self.resolve(record, service)?;
        let summary =
            service.update_values(&record.spreadsheet_id, &plan.qualified_range(), &plan.values)?;
        log::info!("{} cells updated in {}", summary.updated_cells, plan.qualified_range());

        Ok(WriteOutcome { plan, summary })
    }
}
