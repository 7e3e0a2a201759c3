//! Export Service
//!
//! CSV rendering of the summary-stats table for the download action.
//! Values are written at source precision; rounding to two decimals is a
//! display concern only.

use crate::db::table::ResultTable;
use crate::error::{AppError, Result};

/// CSV export over result tables
pub struct ExportService;

impl ExportService {
    /// Render a table as CSV: header row from the column names, one record
    /// per row, comma-separated
    pub fn to_csv(table: &ResultTable) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer.write_record(&table.columns)?;
        for row in &table.rows {
            let record: Vec<String> = row.iter().map(|cell| cell.render()).collect();
            writer.write_record(&record)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| AppError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::table::Cell;

    fn stats_table() -> ResultTable {
        ResultTable::new(
            vec![
                "company".into(),
                "avg_open".into(),
                "avg_close".into(),
                "avg_high".into(),
                "avg_low".into(),
                "avg_volume".into(),
            ],
            vec![
                vec![
                    Cell::Text("AAPL".into()),
                    Cell::Float(132.25),
                    Cell::Float(133.118725),
                    Cell::Float(135.0),
                    Cell::Float(130.5),
                    Cell::Float(1_000_000.5),
                ],
                vec![
                    Cell::Text("MSFT".into()),
                    Cell::Float(250.0),
                    Cell::Float(251.5),
                    Cell::Float(255.25),
                    Cell::Float(248.75),
                    Cell::Float(2_000_000.0),
                ],
            ],
        )
    }

    #[test]
    fn test_header_matches_stats_schema() {
        let csv = ExportService::to_csv(&stats_table()).unwrap();
        let header = csv.lines().next().unwrap();
        assert_eq!(header, "company,avg_open,avg_close,avg_high,avg_low,avg_volume");
    }

    #[test]
    fn test_values_keep_source_precision() {
        let csv = ExportService::to_csv(&stats_table()).unwrap();
        // no forced rounding on export
        assert!(csv.contains("133.118725"));
        assert!(csv.lines().nth(1).unwrap().starts_with("AAPL,"));
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_empty_table_is_header_only() {
        let table = ResultTable::empty(vec!["company".into(), "avg_open".into()]);
        let csv = ExportService::to_csv(&table).unwrap();
        assert_eq!(csv.trim_end(), "company,avg_open");
    }
}
