//! In-memory [`SheetsService`] for tests.
//!
//! Public so integration tests, and crates embedding shotsheet-core, can run
//! the mapper end to end without network access or credentials. It follows the
//! values API closely enough for that: whole-sheet reads, single-row writes
//! whose width must match the range, and `None` cells left as they were.

use super::{SheetsService, UpdateSummary, qualified_range, split_qualified_range};
use crate::cell_ref::{CellRange, CellReference, parse_cell_range, parse_cell_ref};
use crate::error::{Result, SyncError};
use std::cell::RefCell;
use std::collections::HashMap;

/// A write recorded by [`MemorySheets`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub spreadsheet_id: String,
    pub range: String,
    pub values: Vec<Option<String>>,
}

#[derive(Debug, Default)]
pub struct MemorySheets {
    sheets: RefCell<HashMap<(String, String), Vec<Vec<String>>>>,
    writes: RefCell<Vec<RecordedWrite>>,
    reads: RefCell<usize>,
}

impl MemorySheets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(self, spreadsheet_id: &str, sheet_name: &str, rows: Vec<Vec<String>>) -> Self {
        self.sheets
            .borrow_mut()
            .insert((spreadsheet_id.to_string(), sheet_name.to_string()), rows);
        self
    }

    /// Current rows of a sheet
    pub fn rows(&self, spreadsheet_id: &str, sheet_name: &str) -> Option<Vec<Vec<String>>> {
        self.sheets
            .borrow()
            .get(&(spreadsheet_id.to_string(), sheet_name.to_string()))
            .cloned()
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.borrow().clone()
    }

    pub fn read_count(&self) -> usize {
        *self.reads.borrow()
    }

    fn parse_target(range: &str) -> Option<CellRange> {
        if let Some((start_row, start_col, end_row, end_col)) = parse_cell_range(range) {
            return Some(CellRange::new(
                CellReference::new(start_row, start_col),
                CellReference::new(end_row, end_col),
            ));
        }
        parse_cell_ref(range).map(|(row, col)| CellRange::single(CellReference::new(row, col)))
    }
}

impl SheetsService for MemorySheets {
    fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>> {
        *self.reads.borrow_mut() += 1;
        let (sheet_name, cells) = split_qualified_range(range);
        if cells.is_some() {
            return Err(SyncError::RemoteService {
                status: Some(400),
                message: format!("only whole-sheet reads are supported, got '{}'", range),
            });
        }
        self.rows(spreadsheet_id, &sheet_name)
            .ok_or_else(|| SyncError::RemoteService {
                status: Some(400),
                message: format!("Unable to parse range: {}", range),
            })
    }

    fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Option<String>],
    ) -> Result<UpdateSummary> {
        let (sheet_name, cells) = split_qualified_range(range);
        let target = cells
            .and_then(Self::parse_target)
            .ok_or_else(|| SyncError::RemoteService {
                status: Some(400),
                message: format!("Unable to parse range: {}", range),
            })?;
        if target.start.row != target.end.row || target.width() as usize != values.len() {
            return Err(SyncError::RemoteService {
                status: Some(400),
                message: format!(
                    "Requested writing within range [{}], but tried writing {} values",
                    range,
                    values.len()
                ),
            });
        }

        let mut sheets = self.sheets.borrow_mut();
        let rows = sheets
            .get_mut(&(spreadsheet_id.to_string(), sheet_name.clone()))
            .ok_or_else(|| SyncError::RemoteService {
                status: Some(400),
                message: format!("Unable to parse range: {}", range),
            })?;

        let row_idx = target.start.row as usize;
        if rows.len() <= row_idx {
            rows.resize(row_idx + 1, Vec::new());
        }
        let row = &mut rows[row_idx];
        let mut updated_cells: u64 = 0;
        for (offset, value) in values.iter().enumerate() {
            let Some(value) = value else {
                continue;
            };
            let col = target.start.col as usize + offset;
            if row.len() <= col {
                row.resize(col + 1, String::new());
            }
            row[col] = value.clone();
            updated_cells += 1;
        }

        self.writes.borrow_mut().push(RecordedWrite {
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
            values: values.to_vec(),
        });

        Ok(UpdateSummary {
            updated_range: qualified_range(&sheet_name, &target.to_string()),
            updated_cells,
        })
    }
}
