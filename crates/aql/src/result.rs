//! AQL result adapter
//!
//! Wraps a SQL cursor over a translated query as a labeled, typed row
//! stream. The header is the ordered list of select labels; each cell is
//! either a string value or a null marker. The adapter pre-advances the
//! cursor so `has_next_row` reflects the next yet-unconsumed row.

use triplestore::{SqlCursor, StoreError, StoreResult};

use crate::model::Query;

/// Labeled row stream over an executed query.
pub struct ResultSet<'conn> {
    header: Vec<String>,
    cursor: SqlCursor<'conn>,
    pending: Option<Vec<Option<String>>>,
}

impl<'conn> ResultSet<'conn> {
    /// Wrap an executed cursor, taking the header from the query's selects.
    pub fn new(query: &Query, mut cursor: SqlCursor<'conn>) -> StoreResult<Self> {
        let header = query
            .selects
            .iter()
            .map(|select| select.label.clone())
            .collect();
        let pending = cursor.next_row()?;
        Ok(Self {
            header,
            cursor,
            pending,
        })
    }

    /// Ordered select labels
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Whether another row is available
    pub fn has_next_row(&self) -> bool {
        self.pending.is_some()
    }

    /// Consume and return the next row, normalized to the header width.
    ///
    /// Reading past the end is an error.
    pub fn next_row(&mut self) -> StoreResult<Vec<Option<String>>> {
        let Some(mut row) = self.pending.take() else {
            return Err(StoreError::CursorConsumed);
        };
        row.resize(self.header.len(), None);
        self.pending = self.cursor.next_row()?;
        Ok(row)
    }
}
