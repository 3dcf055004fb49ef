//! Database schema migrations for the plan history.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};
use tracing::{debug, warn};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const CURRENT_VERSION: i32 = 1;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);
    if current_version < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            warn!("failed to read schema_version: {e}");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: trips with their days and entries.
///
/// Timestamps are stored as ISO-8601 text without offset, dates as
/// `YYYY-MM-DD`, statuses and activities by their snake_case names.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS trips (
            id                  TEXT PRIMARY KEY,
            created_at          TEXT NOT NULL,
            total_miles         REAL NOT NULL,
            total_driving_hours REAL NOT NULL,
            estimated_days      INTEGER NOT NULL,
            actual_days         INTEGER NOT NULL,
            num_fuel_stops      INTEGER NOT NULL,
            restart_needed      INTEGER NOT NULL,
            cycle_used_before   REAL NOT NULL,
            cycle_used_after    REAL NOT NULL,
            origin              TEXT,
            pickup              TEXT,
            dropoff             TEXT
        );

        CREATE TABLE IF NOT EXISTS daily_logs (
            trip_id                 TEXT NOT NULL REFERENCES trips(id) ON DELETE CASCADE,
            day_number              INTEGER NOT NULL,
            date                    TEXT NOT NULL,
            total_driving_hours     REAL NOT NULL,
            total_on_duty_hours     REAL NOT NULL,
            total_off_duty_hours    REAL NOT NULL,
            remaining_drive_time    REAL NOT NULL,
            remaining_on_duty_time  REAL NOT NULL,
            cycle_hours_remaining   REAL NOT NULL,
            is_restart              INTEGER NOT NULL,
            PRIMARY KEY (trip_id, day_number)
        );

        CREATE TABLE IF NOT EXISTS log_entries (
            trip_id         TEXT NOT NULL,
            day_number      INTEGER NOT NULL,
            seq             INTEGER NOT NULL,
            status          TEXT NOT NULL,
            activity        TEXT NOT NULL,
            start_time      TEXT NOT NULL,
            end_time        TEXT NOT NULL,
            duration_hours  REAL NOT NULL,
            notes           TEXT NOT NULL DEFAULT '',
            location        TEXT,
            PRIMARY KEY (trip_id, day_number, seq),
            FOREIGN KEY (trip_id, day_number)
                REFERENCES daily_logs(trip_id, day_number) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_trips_created_at ON trips(created_at);",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()?;
    debug!("applied schema migration v1");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get::<_, i32>(0),
        )
        .unwrap()
            > 0
    }

    #[test]
    fn test_migrate_from_scratch() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(get_schema_version(&conn), 0);

        migrate(&conn).unwrap();

        assert_eq!(get_schema_version(&conn), CURRENT_VERSION);
        for table in ["trips", "daily_logs", "log_entries"] {
            assert!(table_exists(&conn, table), "missing table {table}");
        }
    }

    #[test]
    fn test_migrate_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), CURRENT_VERSION);

        let rows: i32 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_current_version_skips_v1() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema_version_table(&conn).unwrap();
        set_schema_version(&conn, 1).unwrap();

        migrate(&conn).unwrap();

        // v1 already recorded, so its tables were never created
        assert!(!table_exists(&conn, "trips"));
    }
}
