//! Read-only copy of a sheet's rows, fetched once per update

/// Ordered rows of cell strings; rows may be ragged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetSnapshot {
    rows: Vec<Vec<String>>,
}

impl SheetSnapshot {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell value, `None` when the row is shorter than `col`
    pub fn cell(&self, row: usize, col: u32) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col as usize))
            .map(String::as_str)
    }

    /// First row at or after `start` whose `col` cell equals `value`
    pub fn find_from(&self, start: usize, col: u32, value: &str) -> Option<usize> {
        (start..self.rows.len()).find(|&row| self.cell(row, col) == Some(value))
    }

    /// First row whose `col` cell equals `value`
    pub fn find(&self, col: u32, value: &str) -> Option<usize> {
        self.find_from(0, col, value)
    }
}

impl From<Vec<Vec<String>>> for SheetSnapshot {
    fn from(rows: Vec<Vec<String>>) -> Self {
        Self::new(rows)
    }
}
