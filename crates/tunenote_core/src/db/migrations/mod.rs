//! Store table migrations, tracked with `PRAGMA user_version`.
//!
//! These shape the SQLite tables only. Note-type schema versions live in
//! record metadata, see `crate::migration`.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// `(user_version after applying, sql)`, ascending and gap-free.
const STORE_MIGRATIONS: [(u32, &str); 2] = [
    (1, include_str!("0001_init.sql")),
    (2, include_str!("0002_note_order.sql")),
];

/// Highest store table version this build knows.
pub fn latest_version() -> u32 {
    STORE_MIGRATIONS.len() as u32
}

/// Brings the store tables up to `latest_version()` in one transaction.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file was written by a newer build.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let latest = latest_version();
    if from > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: latest,
        });
    }

    let pending = &STORE_MIGRATIONS[from as usize..];
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, sql) in pending {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        info!("event=db_migrate module=db status=applied version={version}");
    }
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{latest_version, STORE_MIGRATIONS};

    #[test]
    fn versions_are_dense_from_one() {
        for (index, (version, _)) in STORE_MIGRATIONS.iter().enumerate() {
            assert_eq!(*version as usize, index + 1);
        }
        assert_eq!(latest_version(), 2);
    }
}
