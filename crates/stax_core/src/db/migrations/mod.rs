//! Ordered schema steps for the app store.
//!
//! Each step is an embedded SQL file. Pending steps run in one transaction
//! and the version is bumped after every step, so a failed batch leaves the
//! store at its previous version.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::{Connection, Transaction};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "apps_and_files",
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        name: "window_geometry",
        sql: include_str!("0002_window_geometry.sql"),
    },
];

/// Snapshot of a store's schema relative to this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaStatus {
    pub current: u32,
    pub latest: u32,
}

impl SchemaStatus {
    pub fn is_current(self) -> bool {
        self.current == self.latest
    }

    pub fn pending(self) -> usize {
        MIGRATIONS
            .iter()
            .filter(|migration| migration.version > self.current)
            .count()
    }
}

pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Schema version currently recorded in the store.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

pub fn schema_status(conn: &Connection) -> DbResult<SchemaStatus> {
    Ok(SchemaStatus {
        current: current_user_version(conn)?,
        latest: latest_version(),
    })
}

/// Runs every step newer than the store's version.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<SchemaStatus> {
    let status = schema_status(conn)?;
    if status.current > status.latest {
        return Err(DbError::SchemaTooNew {
            found: status.current,
            supported: status.latest,
        });
    }
    if status.is_current() {
        debug!("event=db_migrate module=db status=ok version={} pending=0", status.current);
        return Ok(status);
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS
        .iter()
        .filter(|migration| migration.version > status.current)
    {
        apply_step(&tx, migration)?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from={} to={}",
        status.current, status.latest
    );
    Ok(SchemaStatus {
        current: status.latest,
        latest: status.latest,
    })
}

fn apply_step(tx: &Transaction<'_>, migration: &Migration) -> DbResult<()> {
    let step = |err: rusqlite::Error| DbError::Migration {
        version: migration.version,
        source: err,
    };
    tx.execute_batch(migration.sql).map_err(step)?;
    tx.pragma_update(None, "user_version", migration.version)
        .map_err(step)?;
    debug!(
        "event=db_migrate_step module=db status=ok version={} name={}",
        migration.version, migration.name
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{latest_version, SchemaStatus, MIGRATIONS};

    #[test]
    fn versions_are_strictly_increasing() {
        assert!(MIGRATIONS
            .windows(2)
            .all(|pair| pair[0].version < pair[1].version));
        assert_eq!(latest_version(), 2);
    }

    #[test]
    fn pending_counts_steps_above_current() {
        let fresh = SchemaStatus {
            current: 0,
            latest: latest_version(),
        };
        assert_eq!(fresh.pending(), MIGRATIONS.len());
        assert!(!fresh.is_current());

        let done = SchemaStatus {
            current: latest_version(),
            latest: latest_version(),
        };
        assert_eq!(done.pending(), 0);
        assert!(done.is_current());
    }
}
