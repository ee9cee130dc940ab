//! Opening attendance database connections.
//!
//! A returned connection has `foreign_keys=ON`, a 5 s busy timeout, the
//! `fold_case` SQL function and the latest schema. Anything short of that
//! is an error and the connection is dropped.

use super::migrations::{apply_migrations, latest_version};
use super::{register_text_functions, DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating if needed) the database file at `path` and upgrades it.
///
/// Logs one `event=db_open` line with the outcome and duration.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with("file", || Connection::open(path))
}

/// In-memory database with the full schema; contents vanish on drop.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", Connection::open_in_memory)
}

fn open_with(
    mode: &'static str,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    let opened = connect().map_err(DbError::from).and_then(|mut conn| {
        let steps = prepare(&mut conn)?;
        Ok((conn, steps))
    });

    match opened {
        Ok((conn, steps)) => {
            info!(
                "event=db_open module=db status=ok mode={mode} schema_version={} migrated_steps={steps} duration_ms={}",
                latest_version(),
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} error_code={} duration_ms={} error={err}",
                error_code(&err),
                started_at.elapsed().as_millis()
            );
            Err(err)
        }
    }
}

fn prepare(conn: &mut Connection) -> DbResult<usize> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    register_text_functions(conn)?;
    apply_migrations(conn)
}

fn error_code(err: &DbError) -> &'static str {
    match err {
        DbError::Sqlite(_) => "db_open_failed",
        DbError::UnsupportedSchemaVersion { .. } => "db_schema_too_new",
        DbError::Migration { .. } => "db_migration_failed",
    }
}
