//! Warehouse migrations

use crate::error::Result;
use duckdb::Connection;

/// Run all warehouse migrations
pub fn run_migrations(conn: &Connection) -> Result<()> {
    // Migrations tracking table (name is the primary key since we don't
    // need auto-increment)
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS migrations (
            name VARCHAR PRIMARY KEY,
            applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
    )?;

    run_migration(conn, "001_stock_details", CREATE_STOCK_DETAILS)?;

    tracing::info!("Warehouse migrations completed");
    Ok(())
}

fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM migrations WHERE name = ?",
        [name],
        |row| row.get(0),
    )?;

    if !exists {
        tracing::info!("Running warehouse migration: {}", name);
        conn.execute_batch(sql)?;
        conn.execute("INSERT INTO migrations (name) VALUES (?)", [name])?;
    }

    Ok(())
}

pub(crate) const CREATE_STOCK_DETAILS: &str = r#"
CREATE TABLE IF NOT EXISTS stock_details (
    company VARCHAR NOT NULL,
    date TIMESTAMP NOT NULL,
    open DOUBLE NOT NULL,
    high DOUBLE NOT NULL,
    low DOUBLE NOT NULL,
    close DOUBLE NOT NULL,
    volume BIGINT NOT NULL,
    PRIMARY KEY (company, date)
);

CREATE INDEX IF NOT EXISTS idx_stock_details_company ON stock_details(company);
CREATE INDEX IF NOT EXISTS idx_stock_details_date ON stock_details(date);
"#;
