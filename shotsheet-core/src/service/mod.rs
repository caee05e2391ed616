//! Access to the remote spreadsheet as a range store

pub mod google;
pub mod memory;

use crate::error::Result;
use serde::Serialize;

pub use google::GoogleSheets;
pub use memory::MemorySheets;

/// Result of a successful range update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateSummary {
    pub updated_range: String,
    pub updated_cells: u64,
}

/// Read and write cell values of a spreadsheet
pub trait SheetsService {
    /// All values in `range` (an A1 range or a bare sheet name), row by row
    fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>>;

    /// Write one row of values into `range`, interpreting them as if typed by a user.
    /// `None` entries leave their cell unchanged.
    fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Option<String>],
    ) -> Result<UpdateSummary>;
}

/// Sheet name as it must appear in an A1 range ("'Shots'", "'Ana''s'").
///
/// Names are always quoted: a bare tab name such as `EP01` or `Q1` would
/// otherwise be read as a cell of the first sheet.
pub fn quote_sheet_name(sheet_name: &str) -> String {
    format!("'{}'", sheet_name.replace('\'', "''"))
}

/// Join a sheet name and a cell range: "'Shots'!P2", "'Shot List'!I5:K5"
pub fn qualified_range(sheet_name: &str, cells: &str) -> String {
    format!("{}!{}", quote_sheet_name(sheet_name), cells)
}

/// Split "Sheet!A1:B2" into the unquoted sheet name and the cell part, if any
pub fn split_qualified_range(range: &str) -> (String, Option<&str>) {
    let (sheet, cells) = if let Some(rest) = range.strip_prefix('\'') {
        // Quoted names may contain '!' so look for the closing quote first.
        let mut end = None;
        let bytes = rest.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'\'' {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                    continue;
                }
                end = Some(i);
                break;
            }
            i += 1;
        }
        match end {
            Some(end) => {
                let name = rest[..end].replace("''", "'");
                let cells = rest[end + 1..].strip_prefix('!');
                return (name, cells);
            }
            None => (range, None),
        }
    } else {
        match range.split_once('!') {
            Some((sheet, cells)) => (sheet, Some(cells)),
            None => (range, None),
        }
    };
    (sheet.to_string(), cells)
}
