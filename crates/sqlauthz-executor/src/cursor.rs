//! Query cursors
//!
//! A cursor materializes its rows when it is opened and keeps the state it
//! read from alive. Later commits never change what it yields.

use std::sync::Arc;

use sqlauthz_ast::SqlValue;
use sqlauthz_storage::DatabaseState;

use crate::result::ResultSet;

#[derive(Debug, Clone)]
pub struct Cursor {
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
    pos: usize,
    snapshot: Arc<DatabaseState>,
}

impl Cursor {
    pub(crate) fn new(snapshot: Arc<DatabaseState>, result: ResultSet) -> Self {
        Cursor { columns: result.columns, rows: result.rows, pos: 0, snapshot }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Version of the committed state the cursor was opened on.
    pub fn version(&self) -> u64 {
        self.snapshot.version()
    }

    pub fn remaining(&self) -> usize {
        self.rows.len() - self.pos
    }
}

impl Iterator for Cursor {
    type Item = Vec<SqlValue>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.get(self.pos)?.clone();
        self.pos += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}
