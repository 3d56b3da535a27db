//! Store bootstrap: connect, configure, migrate.

use super::migrations::apply_migrations;
use super::{DbError, DbResult, StoreLocation};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) the app store at `path` and migrates it.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    bootstrap(StoreLocation::File(path.to_path_buf()), || {
        Connection::open(path)
    })
}

/// In-memory store with the same configuration and migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    bootstrap(StoreLocation::Memory, Connection::open_in_memory)
}

fn bootstrap(
    location: StoreLocation,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    let kind = location.kind();

    let prepared = connect()
        .map_err(|source| DbError::Open {
            location: location.clone(),
            source,
        })
        .and_then(|mut conn| {
            configure(&mut conn)?;
            let status = apply_migrations(&mut conn)?;
            Ok((conn, status))
        });

    match prepared {
        Ok((conn, status)) => {
            info!(
                "event=db_open module=db status=ok mode={kind} schema={} duration_ms={}",
                status.current,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={kind} duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            );
            Err(err)
        }
    }
}

fn configure(conn: &mut Connection) -> DbResult<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}
