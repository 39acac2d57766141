//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database. Stages build records in
//! memory; the store validates a whole dataset and then writes it.

use crate::error::{SimError, SimResult};
use rusqlite::{types::ValueRef, Connection};

mod kpi;
mod writer;

pub use kpi::{PeriodCount, PeriodRevenue, RetentionRow, VariantCohortRetention};

/// Every output table, in write order.
pub const TABLES: [&str; 8] = [
    "players",
    "teams",
    "team_memberships",
    "sessions",
    "events",
    "purchases",
    "experiment_assignments",
    "dau_report",
];

pub struct SimStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl SimStore {
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_game_schema.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_generation_report.sql"))?;
        Ok(())
    }

    pub fn table_count(&self, table: &str) -> SimResult<i64> {
        let table = known_table(table)?;
        let n = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(n)
    }

    /// Every row of a table rendered as `a|b|c`, ordered by the first
    /// column(s). Two runs are identical iff their dumps are.
    pub fn dump_table(&self, table: &str) -> SimResult<Vec<String>> {
        let table = known_table(table)?;
        let order = if table == "experiment_assignments" { "1, 2" } else { "1" };
        let mut stmt = self.conn.prepare(&format!("SELECT * FROM {table} ORDER BY {order}"))?;
        let columns = stmt.column_count();
        let rows = stmt.query_map([], |row| {
            let mut cells = Vec::with_capacity(columns);
            for i in 0..columns {
                cells.push(match row.get_ref(i)? {
                    ValueRef::Null => "NULL".to_string(),
                    ValueRef::Integer(v) => v.to_string(),
                    ValueRef::Real(v) => v.to_string(),
                    ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
                    ValueRef::Blob(b) => format!("{b:?}"),
                });
            }
            Ok(cells.join("|"))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn known_table(table: &str) -> SimResult<&'static str> {
    TABLES
        .iter()
        .find(|t| **t == table)
        .copied()
        .ok_or_else(|| SimError::config(format!("unknown table {table}")))
}
