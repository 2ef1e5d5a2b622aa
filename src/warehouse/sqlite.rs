use anyhow::{Context, Result};
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use std::path::Path;
use tracing::debug;

use super::Warehouse;
use crate::catalog::{Statement, StatementBody};
use crate::loader;
use crate::timeparts::{TimePart, TimeParts, CLOCK_FUNCTION, PART_FUNCTION};

/// Rehearsal target backed by a SQLite file
pub struct SqliteWarehouse {
    conn: Connection,
}

impl SqliteWarehouse {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database: {:?}", db_path))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        debug!(path = ?db_path, "opened sqlite warehouse");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        register_time_functions(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Warehouse for SqliteWarehouse {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn execute(&mut self, statement: &Statement) -> Result<u64> {
        match &statement.body {
            StatementBody::Sql(sql) => Ok(self.conn.execute(sql, [])? as u64),
            StatementBody::Copy(copy) => loader::copy_into(&mut self.conn, copy),
        }
    }

    fn count_rows(&mut self, table: &str) -> Result<i64> {
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })
            .with_context(|| format!("Failed to count rows in {}", table))?;
        Ok(count)
    }
}

/// `epoch_clock(ts)` and `epoch_part('<part>', ts)`; NULL in, NULL out
fn register_time_functions(conn: &Connection) -> Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function(CLOCK_FUNCTION, 1, flags, |ctx| {
        let ts: Option<i64> = ctx.get(0)?;
        Ok(ts
            .and_then(TimeParts::from_epoch_millis)
            .map(|parts| parts.start_time))
    })
    .context("Failed to register epoch_clock")?;

    conn.create_scalar_function(PART_FUNCTION, 2, flags, |ctx| {
        let name: String = ctx.get(0)?;
        let part: TimePart = name
            .parse()
            .map_err(|e: String| rusqlite::Error::UserFunctionError(e.into()))?;
        let ts: Option<i64> = ctx.get(1)?;
        Ok(ts
            .and_then(TimeParts::from_epoch_millis)
            .map(|parts| parts.part(part)))
    })
    .context("Failed to register epoch_part")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_functions() {
        let wh = SqliteWarehouse::open_in_memory().unwrap();
        let (clock, week, weekday): (String, i64, i64) = wh
            .connection()
            .query_row(
                "SELECT epoch_clock(1541121934796), epoch_part('week', 1541121934796), epoch_part('weekday', 1541121934796)",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(clock, "01:25:34");
        assert_eq!(week, 44);
        assert_eq!(weekday, 5);
    }

    #[test]
    fn test_time_functions_pass_null_through() {
        let wh = SqliteWarehouse::open_in_memory().unwrap();
        let clock: Option<String> = wh
            .connection()
            .query_row("SELECT epoch_clock(NULL)", [], |row| row.get(0))
            .unwrap();
        assert_eq!(clock, None);
    }

    #[test]
    fn test_unknown_part_is_an_error() {
        let wh = SqliteWarehouse::open_in_memory().unwrap();
        let result: rusqlite::Result<i64> =
            wh.connection()
                .query_row("SELECT epoch_part('minute', 0)", [], |row| row.get(0));
        assert!(result.is_err());
    }

    #[test]
    fn test_open_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut wh = SqliteWarehouse::open(&dir.path().join("sparkify.db")).unwrap();
        wh.connection()
            .execute("CREATE TABLE t (x INTEGER)", [])
            .unwrap();
        assert_eq!(wh.count_rows("t").unwrap(), 0);
        assert!(wh.count_rows("missing").is_err());
    }
}
