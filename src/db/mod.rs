//! Warehouse access
//!
//! DuckDB-backed analytical store holding the `stock_details` table. The
//! explorer only reads from it; `insert_rows` exists for seeding tools and
//! tests.

mod migrations;
pub mod table;

use crate::error::Result;
use crate::query::{BoundQuery, ScalarParam};
use chrono::{DateTime, NaiveDate, Utc};
use duckdb::types::{TimeUnit, Value, ValueRef};
use duckdb::Connection;
use parking_lot::Mutex;
use std::path::Path;
use table::{Cell, ResultTable, StockRow};

/// Warehouse connection wrapper
pub struct Warehouse {
    conn: Mutex<Connection>,
}

impl Warehouse {
    /// Open (or create) a warehouse at the given path
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Open an in-memory warehouse (dev and tests)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.run_migrations()?;

        Ok(db)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock();
        migrations::run_migrations(&conn)
    }

    /// Execute a built query and decode the result.
    ///
    /// Date/timestamp columns (flagged by the builder) are normalized to
    /// UTC. Errors propagate; catching them is the fetcher boundary's job.
    pub fn run(&self, query: &BoundQuery) -> Result<ResultTable> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(&query.sql)?;
        let bound: Vec<Value> = query.params.iter().map(bind_value).collect();
        let mut rows = stmt.query(duckdb::params_from_iter(bound))?;

        let mut out: Vec<Vec<Cell>> = Vec::new();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(query.columns.len());
            for (idx, col) in query.columns.iter().enumerate() {
                cells.push(decode_cell(row.get_ref(idx)?, col.is_date));
            }
            out.push(cells);
        }

        Ok(ResultTable::new(query.column_names(), out))
    }

    /// Distinct company identifiers, alphabetically ordered
    pub fn list_companies(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();

        let mut stmt =
            conn.prepare("SELECT DISTINCT company FROM stock_details ORDER BY company")?;
        let companies = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(companies)
    }

    /// Earliest and latest record dates, `None` for an empty warehouse
    pub fn date_bounds(&self) -> Result<Option<(NaiveDate, NaiveDate)>> {
        let conn = self.conn.lock();

        let (earliest, latest): (Option<String>, Option<String>) = conn.query_row(
            "SELECT strftime(min(date), '%Y-%m-%d'), strftime(max(date), '%Y-%m-%d')
             FROM stock_details",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        match (earliest, latest) {
            (Some(min), Some(max)) => {
                let min = NaiveDate::parse_from_str(&min, "%Y-%m-%d")
                    .map_err(|e| crate::error::AppError::Internal(e.to_string()))?;
                let max = NaiveDate::parse_from_str(&max, "%Y-%m-%d")
                    .map_err(|e| crate::error::AppError::Internal(e.to_string()))?;
                Ok(Some((min, max)))
            }
            _ => Ok(None),
        }
    }

    /// Insert stock rows (batch insert with transaction); seeding only
    pub fn insert_rows(&self, rows: &[StockRow]) -> Result<usize> {
        let mut conn = self.conn.lock();

        let tx = conn.transaction()?;

        let mut stmt = tx.prepare(
            "INSERT INTO stock_details (company, date, open, high, low, close, volume)
             VALUES (?, CAST(? AS TIMESTAMP), ?, ?, ?, ?, ?)
             ON CONFLICT (company, date) DO UPDATE SET
               open = excluded.open, high = excluded.high, low = excluded.low,
               close = excluded.close, volume = excluded.volume",
        )?;

        let mut count = 0;
        for row in rows {
            stmt.execute(duckdb::params![
                row.company,
                row.date.to_string(),
                row.open,
                row.high,
                row.low,
                row.close,
                row.volume,
            ])?;
            count += 1;
        }

        drop(stmt);
        tx.commit()?;

        Ok(count)
    }
}

#[cfg(test)]
impl Warehouse {
    /// Drop the stock table so fetch-failure handling can be exercised
    pub(crate) fn drop_stock_table(&self) {
        let conn = self.conn.lock();
        conn.execute_batch("DROP TABLE stock_details")
            .expect("drop stock_details");
    }

    /// Recreate the stock table after `drop_stock_table`, for recovery tests
    pub(crate) fn restore_stock_table(&self) {
        let conn = self.conn.lock();
        conn.execute_batch(migrations::CREATE_STOCK_DETAILS)
            .expect("recreate stock_details");
    }
}

/// Convert a builder parameter into a bindable value. Dates bind as ISO
/// text; the query text carries the explicit `CAST(? AS DATE)`.
fn bind_value(param: &ScalarParam) -> Value {
    match param {
        ScalarParam::Text(s) => Value::Text(s.clone()),
        ScalarParam::Date(d) => Value::Text(d.to_string()),
    }
}

/// Decode one warehouse cell into the table model
fn decode_cell(value: ValueRef<'_>, is_date: bool) -> Cell {
    match value {
        ValueRef::Null => Cell::Null,
        ValueRef::Boolean(b) => Cell::Int(b as i64),
        ValueRef::TinyInt(v) => Cell::Int(v as i64),
        ValueRef::SmallInt(v) => Cell::Int(v as i64),
        ValueRef::Int(v) => Cell::Int(v as i64),
        ValueRef::BigInt(v) => Cell::Int(v),
        // sum() over BIGINT comes back as HUGEINT
        ValueRef::HugeInt(v) => match i64::try_from(v) {
            Ok(v) => Cell::Int(v),
            Err(_) => Cell::Float(v as f64),
        },
        ValueRef::UTinyInt(v) => Cell::Int(v as i64),
        ValueRef::USmallInt(v) => Cell::Int(v as i64),
        ValueRef::UInt(v) => Cell::Int(v as i64),
        ValueRef::UBigInt(v) => Cell::Int(v as i64),
        ValueRef::Float(v) => Cell::Float(v as f64),
        ValueRef::Double(v) => Cell::Float(v),
        ValueRef::Date32(days) => days_to_utc(days).map(Cell::Date).unwrap_or(Cell::Null),
        ValueRef::Timestamp(unit, v) => timestamp_to_utc(unit, v)
            .map(Cell::Date)
            .unwrap_or(Cell::Null),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes).into_owned();
            if is_date {
                match NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
                    Ok(d) => Cell::Date(midnight_utc(d)),
                    Err(_) => Cell::Text(text),
                }
            } else {
                Cell::Text(text)
            }
        }
        other => {
            tracing::debug!("Unhandled warehouse value type: {:?}", other);
            Cell::Null
        }
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or_else(Utc::now)
}

fn days_to_utc(days: i32) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(days as i64 * 86_400, 0)
}

fn timestamp_to_utc(unit: TimeUnit, value: i64) -> Option<DateTime<Utc>> {
    match unit {
        TimeUnit::Second => DateTime::<Utc>::from_timestamp(value, 0),
        TimeUnit::Millisecond => DateTime::<Utc>::from_timestamp_millis(value),
        TimeUnit::Microsecond => DateTime::<Utc>::from_timestamp_micros(value),
        TimeUnit::Nanosecond => Some(DateTime::<Utc>::from_timestamp_nanos(value)),
    }
}
