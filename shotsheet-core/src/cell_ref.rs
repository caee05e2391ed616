//! A1-style cell and range references

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Zero-based cell position (e.g., row 4, col 2 is "C5")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CellReference {
    pub row: u32,
    pub col: u32,
}

impl CellReference {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Convert to A1-style reference (e.g., "A1")
    pub fn to_a1(&self) -> String {
        cell_ref(self.row, self.col)
    }
}

impl PartialOrd for CellReference {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellReference {
    fn cmp(&self, other: &Self) -> Ordering {
        self.row.cmp(&other.row).then_with(|| self.col.cmp(&other.col))
    }
}

impl fmt::Display for CellReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1())
    }
}

/// A rectangular span between two cells, rendered as "C5:E5"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellRange {
    pub start: CellReference,
    pub end: CellReference,
}

impl CellRange {
    pub fn new(start: CellReference, end: CellReference) -> Self {
        Self { start, end }
    }

    /// Range covering a single cell
    pub fn single(cell: CellReference) -> Self {
        Self {
            start: cell,
            end: cell,
        }
    }

    /// Columns `first..=last` on one row
    pub fn row_span(row: u32, first: u32, last: u32) -> Self {
        Self::new(CellReference::new(row, first), CellReference::new(row, last))
    }

    pub fn is_single(&self) -> bool {
        self.start == self.end
    }

    /// Number of columns covered
    pub fn width(&self) -> u32 {
        self.end.col.saturating_sub(self.start.col) + 1
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

/// Column letters for a zero-based column index (0 -> A, 25 -> Z, 26 -> AA)
pub fn column_letters(col: u32) -> String {
    // Bijective base-26: there is no zero digit, so a remainder of 0 is 'Z'.
    let mut n = col as u64 + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let mut remainder = n % 26;
        if remainder == 0 {
            remainder = 26;
        }
        letters.push((b'A' + (remainder - 1) as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// A1-style reference for a zero-based (row, col) pair
pub fn cell_ref(row: u32, col: u32) -> String {
    format!("{}{}", column_letters(col), row as u64 + 1)
}

/// Parse a cell reference like "A1" into (row, col) as 0-based indices
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    let split = cell_ref
        .find(|c: char| c.is_ascii_digit())
        .filter(|&idx| idx > 0)?;
    let (letters, digits) = cell_ref.split_at(split);

    let mut col = 0u64;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + (ch.to_ascii_uppercase() as u64 - 'A' as u64 + 1);
        if col > u32::MAX as u64 + 1 {
            return None;
        }
    }

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let row = digits.parse::<u64>().ok()?;
    if row == 0 || row > u32::MAX as u64 + 1 {
        return None;
    }

    Some(((row - 1) as u32, (col - 1) as u32))
}

/// Parse a cell range like "A1:B2" into (start_row, start_col, end_row, end_col)
pub fn parse_cell_range(range: &str) -> Option<(u32, u32, u32, u32)> {
    let (start, end) = range.split_once(':')?;
    let (start_row, start_col) = parse_cell_ref(start)?;
    let (end_row, end_col) = parse_cell_ref(end)?;

    Some((start_row, start_col, end_row, end_col))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_ref_known_values() {
        assert_eq!(cell_ref(0, 0), "A1");
        assert_eq!(cell_ref(25, 0), "A26");
        assert_eq!(cell_ref(0, 25), "Z1");
        assert_eq!(cell_ref(0, 26), "AA1");
        assert_eq!(cell_ref(4, 2), "C5");
        assert_eq!(cell_ref(0, 51), "AZ1");
        assert_eq!(cell_ref(0, 52), "BA1");
        assert_eq!(cell_ref(0, 701), "ZZ1");
        assert_eq!(cell_ref(0, 702), "AAA1");
        assert_eq!(cell_ref(0, 16383), "XFD1");
    }

    #[test]
    fn test_cell_ref_round_trip() {
        for row in [0u32, 1, 9, 99, 1_048_575] {
            for col in (0u32..800).chain([16383, 100_000]) {
                let a1 = cell_ref(row, col);
                assert_eq!(parse_cell_ref(&a1), Some((row, col)), "{}", a1);
            }
        }
        let a1 = cell_ref(u32::MAX, u32::MAX);
        assert_eq!(parse_cell_ref(&a1), Some((u32::MAX, u32::MAX)));
    }

    #[test]
    fn test_parse_cell_ref() {
        assert_eq!(parse_cell_ref("A1"), Some((0, 0)));
        assert_eq!(parse_cell_ref("b2"), Some((1, 1)));
        assert_eq!(parse_cell_ref("Z26"), Some((25, 25)));
        assert_eq!(parse_cell_ref("AB10"), Some((9, 27)));
        assert_eq!(parse_cell_ref("A0"), None);
        assert_eq!(parse_cell_ref("12"), None);
        assert_eq!(parse_cell_ref("A"), None);
        assert_eq!(parse_cell_ref("A1B"), None);
    }

    #[test]
    fn test_parse_cell_range() {
        assert_eq!(parse_cell_range("A1:B2"), Some((0, 0, 1, 1)));
        assert_eq!(parse_cell_range("I5:K5"), Some((4, 8, 4, 10)));
        assert_eq!(parse_cell_range("A1"), None);
    }

    #[test]
    fn test_range_display() {
        assert_eq!(CellRange::row_span(4, 2, 4).to_string(), "C5:E5");
        assert_eq!(CellRange::single(CellReference::new(1, 15)).to_string(), "P2");
        assert_eq!(CellRange::row_span(0, 3, 7).width(), 5);
    }
}
