//! Tabular result model
//!
//! Every warehouse query produces a `ResultTable`: an ordered list of rows
//! under a fixed column schema determined by the query shape that built it.
//! Tables are never mutated in place; windowing and reshaping produce new
//! tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::ops::Range;

/// A single typed cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Text(String),
    Float(f64),
    Int(i64),
    /// Date/timestamp values, normalized to UTC by the fetcher
    Date(DateTime<Utc>),
    Null,
}

impl Cell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view; integers widen to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Float(v) => Some(*v),
            Cell::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Cell::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Render for export at source precision (no display rounding)
    pub fn render(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Float(v) => v.to_string(),
            Cell::Int(v) => v.to_string(),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
            Cell::Null => String::new(),
        }
    }

    fn hash_into(&self, h: &mut impl Hasher) {
        match self {
            Cell::Text(s) => {
                0u8.hash(h);
                s.hash(h);
            }
            Cell::Float(v) => {
                1u8.hash(h);
                v.to_bits().hash(h);
            }
            Cell::Int(v) => {
                2u8.hash(h);
                v.hash(h);
            }
            Cell::Date(d) => {
                3u8.hash(h);
                d.timestamp_micros().hash(h);
            }
            Cell::Null => 4u8.hash(h),
        }
    }
}

/// Ordered rows under a fixed column schema
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ResultTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    /// Zero-row table carrying the schema of the query that produced it
    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// New table holding the given row range (0-based, half-open)
    pub fn slice(&self, range: Range<usize>) -> ResultTable {
        let end = range.end.min(self.rows.len());
        let start = range.start.min(end);
        ResultTable {
            columns: self.columns.clone(),
            rows: self.rows[start..end].to_vec(),
        }
    }

    /// Stable digest of schema and content, used to detect that the
    /// underlying table changed between recomputations
    pub fn fingerprint(&self) -> u64 {
        let mut h = DefaultHasher::new();
        self.columns.hash(&mut h);
        self.rows.len().hash(&mut h);
        for row in &self.rows {
            for cell in row {
                cell.hash_into(&mut h);
            }
        }
        h.finish()
    }
}

/// Raw warehouse record, used when seeding the `stock_details` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockRow {
    pub company: String,
    pub date: chrono::NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultTable {
        ResultTable::new(
            vec!["company".into(), "close".into()],
            vec![
                vec![Cell::Text("A".into()), Cell::Float(1.5)],
                vec![Cell::Text("B".into()), Cell::Float(2.5)],
                vec![Cell::Text("C".into()), Cell::Null],
            ],
        )
    }

    #[test]
    fn test_slice_is_clamped() {
        let t = sample();
        assert_eq!(t.slice(0..2).len(), 2);
        assert_eq!(t.slice(2..10).len(), 1);
        assert_eq!(t.slice(5..10).len(), 0);
        // original untouched
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn test_column_index() {
        let t = sample();
        assert_eq!(t.column_index("close"), Some(1));
        assert_eq!(t.column_index("volume"), None);
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        let t = sample();
        let mut other = sample();
        assert_eq!(t.fingerprint(), other.fingerprint());

        other.rows[0][1] = Cell::Float(9.9);
        assert_ne!(t.fingerprint(), other.fingerprint());
    }

    #[test]
    fn test_cell_views() {
        assert_eq!(Cell::Int(3).as_f64(), Some(3.0));
        assert_eq!(Cell::Text("x".into()).as_f64(), None);
        assert_eq!(Cell::Null.render(), "");
    }
}
