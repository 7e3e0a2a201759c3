//! Pagination
//!
//! Stateless windowing over a result table, plus the small piece of state
//! that survives recomputations: the current page sticks around until the
//! page size or the underlying table changes.

use crate::db::table::ResultTable;
use crate::params::PAGE_SIZES;
use serde::{Deserialize, Serialize};

/// One window of a table. Display indices (`first_row`/`last_row`) are
/// 1-based inclusive; an empty table yields `first_row = 0, last_row = 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub rows: ResultTable,
    pub page_number: usize,
    pub page_size: usize,
    pub total_rows: usize,
    pub total_pages: usize,
    pub first_row: usize,
    pub last_row: usize,
}

impl Page {
    /// "Showing rows X to Y of N" line for the stats panel
    pub fn display_range(&self) -> String {
        format!(
            "Showing rows {} to {} of {}",
            self.first_row, self.last_row, self.total_rows
        )
    }
}

/// Window `table` to the requested page.
///
/// Out-of-range page numbers clamp to the nearest valid page rather than
/// failing; internal slicing is 0-based half-open.
pub fn paginate(table: &ResultTable, page_number: usize, page_size: usize) -> Page {
    let page_size = page_size.max(1);
    let total_rows = table.len();
    let total_pages = total_rows.div_ceil(page_size).max(1);

    let page_number = page_number.clamp(1, total_pages);
    let start = (page_number - 1) * page_size;
    let end = (start + page_size).min(total_rows);

    Page {
        rows: table.slice(start..end),
        page_number,
        page_size,
        total_rows,
        total_pages,
        first_row: if total_rows == 0 { 0 } else { start + 1 },
        last_row: end,
    }
}

/// Cross-recomputation pagination state for the stats table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationState {
    page: usize,
    page_size: usize,
    table_fingerprint: Option<u64>,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            table_fingerprint: None,
        }
    }
}

impl PaginationState {
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Change rows-per-page. Unknown sizes are ignored; a real change
    /// resets to page 1.
    pub fn set_page_size(&mut self, size: usize) {
        if PAGE_SIZES.contains(&size) && size != self.page_size {
            self.page_size = size;
            self.page = 1;
        }
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn next_page(&mut self) {
        self.page += 1;
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    /// Reconcile with the freshly fetched table: reset to page 1 when the
    /// table content changed, keep the page otherwise.
    pub fn sync(&mut self, table: &ResultTable) {
        let fingerprint = table.fingerprint();
        if self.table_fingerprint != Some(fingerprint) {
            self.table_fingerprint = Some(fingerprint);
            self.page = 1;
        }
    }

    /// Window the table at the current page, clamping the stored page to
    /// whatever `paginate` considered valid
    pub fn current(&mut self, table: &ResultTable) -> Page {
        let page = paginate(table, self.page, self.page_size);
        self.page = page.page_number;
        page
    }
}
