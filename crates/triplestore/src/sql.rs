//! Thin wrapper over the SQLite connection
//!
//! `Database` is the single connection the store owns; `SqlCursor` is the
//! cursor contract the query layer consumes. The cursor carries its
//! connection handle explicitly, so there is no ambient "current database".

use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::collections::VecDeque;
use tracing::trace;

use crate::error::{StoreError, StoreResult};

/// Owned SQLite connection with statement tracing.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &str) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(StoreError::Open)?;
        Ok(Self { conn })
    }

    pub(crate) fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::Open)?;
        Ok(Self { conn })
    }

    /// The underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Execute a statement batch
    pub(crate) fn exec_batch(&self, sql: &str) -> rusqlite::Result<()> {
        trace!(%sql, "exec");
        self.conn.execute_batch(sql)
    }

    /// Open a cursor over an arbitrary query
    pub fn cursor(&self, sql: &str) -> StoreResult<SqlCursor<'_>> {
        SqlCursor::new(&self.conn, sql)
    }
}

/// Cursor over one prepared query.
///
/// Rows are materialized when the cursor is opened or reset, so no read
/// cursor stays open on the connection between `next_row` calls. A cursor
/// that has returned `None` is invalid until `reset`, which re-executes the
/// statement.
#[derive(Debug)]
pub struct SqlCursor<'conn> {
    conn: &'conn Connection,
    sql: String,
    columns: Vec<String>,
    rows: VecDeque<Vec<Option<String>>>,
    valid: bool,
}

impl<'conn> SqlCursor<'conn> {
    fn new(conn: &'conn Connection, sql: &str) -> StoreResult<Self> {
        let mut cursor = Self {
            conn,
            sql: sql.to_owned(),
            columns: Vec::new(),
            rows: VecDeque::new(),
            valid: true,
        };
        cursor.execute()?;
        Ok(cursor)
    }

    fn execute(&mut self) -> StoreResult<()> {
        trace!(sql = %self.sql, "cursor execute");
        let mut stmt = self.conn.prepare(&self.sql).map_err(|e| StoreError::Prepare {
            sql: self.sql.clone(),
            source: e,
        })?;
        self.columns = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let width = self.columns.len();
        self.rows.clear();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for index in 0..width {
                cells.push(match row.get_ref(index)? {
                    ValueRef::Null => None,
                    ValueRef::Integer(v) => Some(v.to_string()),
                    ValueRef::Real(v) => Some(v.to_string()),
                    ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
                    ValueRef::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
                });
            }
            self.rows.push_back(cells);
        }
        self.valid = true;
        Ok(())
    }

    /// Column labels, in select order
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Fetch the next row; `None` once the result is exhausted.
    ///
    /// Reading past exhaustion without a `reset` is an error.
    pub fn next_row(&mut self) -> StoreResult<Option<Vec<Option<String>>>> {
        if !self.valid {
            return Err(StoreError::CursorConsumed);
        }
        match self.rows.pop_front() {
            Some(row) => Ok(Some(row)),
            None => {
                self.valid = false;
                Ok(None)
            }
        }
    }

    /// Re-execute the statement, making the cursor valid again
    pub fn reset(&mut self) -> StoreResult<()> {
        self.execute()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.exec_batch(
            "CREATE TABLE t (a INTEGER, b TEXT);
             INSERT INTO t VALUES (1, 'one');
             INSERT INTO t VALUES (2, NULL);",
        )
        .unwrap();
        db
    }

    #[test]
    fn test_cursor_rows_and_columns() {
        let db = test_db();
        let mut cursor = db.cursor("SELECT a, b FROM t ORDER BY a").unwrap();
        assert_eq!(cursor.column_names(), ["a", "b"]);
        assert_eq!(
            cursor.next_row().unwrap(),
            Some(vec![Some("1".to_string()), Some("one".to_string())])
        );
        assert_eq!(
            cursor.next_row().unwrap(),
            Some(vec![Some("2".to_string()), None])
        );
        assert_eq!(cursor.next_row().unwrap(), None);
    }

    #[test]
    fn test_cursor_invalid_after_done() {
        let db = test_db();
        let mut cursor = db.cursor("SELECT a FROM t").unwrap();
        while cursor.next_row().unwrap().is_some() {}
        assert!(matches!(
            cursor.next_row(),
            Err(StoreError::CursorConsumed)
        ));
        cursor.reset().unwrap();
        assert!(cursor.next_row().unwrap().is_some());
    }

    #[test]
    fn test_prepare_error_carries_sql() {
        let db = test_db();
        let err = db.cursor("SELECT nope FROM missing").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("error preparing query"));
        assert!(text.contains("SELECT nope FROM missing"));
    }
}
