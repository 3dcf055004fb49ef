//! SQLite-based trip plan history.
//!
//! Provides persistent storage for:
//! - Planned trips with their summary figures and stop labels
//! - Every daily log and log entry of each trip

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::duty::{DailyLog, LogEntry, TripPlan};
use crate::error::{DatabaseError, Result};
use crate::planner::StopLabels;

use super::{data_dir, migrations};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Caller-supplied context stored alongside a plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripMeta {
    #[serde(default)]
    pub labels: StopLabels,
}

impl From<StopLabels> for TripMeta {
    fn from(labels: StopLabels) -> Self {
        Self { labels }
    }
}

/// One row of the history listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub total_miles: f64,
    pub actual_days: u32,
    pub restart_needed: bool,
    pub labels: StopLabels,
}

/// SQLite database of planned trips.
pub struct PlanStore {
    conn: Connection,
}

impl PlanStore {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/dutyplan/dutyplan.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the
    /// database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("dutyplan.db");
        let conn = Connection::open(&path)
            .map_err(|source| DatabaseError::OpenFailed { path, source })?;
        Ok(Self::init(conn)?)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, DatabaseError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Store a plan and return its new trip id.
    ///
    /// # Errors
    /// Returns an error if any insert fails; nothing is stored in that case.
    pub fn save(&self, plan: &TripPlan, meta: &TripMeta) -> Result<String, DatabaseError> {
        let id = Uuid::new_v4().to_string();
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO trips (id, created_at, total_miles, total_driving_hours,
                estimated_days, actual_days, num_fuel_stops, restart_needed,
                cycle_used_before, cycle_used_after, origin, pickup, dropoff)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                id,
                Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
                plan.total_miles,
                plan.total_driving_hours,
                plan.estimated_days,
                plan.actual_days,
                plan.num_fuel_stops,
                plan.restart_needed,
                plan.cycle_used_before,
                plan.cycle_used_after,
                meta.labels.origin,
                meta.labels.pickup,
                meta.labels.dropoff,
            ],
        )?;

        for day in &plan.daily_logs {
            tx.execute(
                "INSERT INTO daily_logs (trip_id, day_number, date, total_driving_hours,
                    total_on_duty_hours, total_off_duty_hours, remaining_drive_time,
                    remaining_on_duty_time, cycle_hours_remaining, is_restart)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    id,
                    day.day_number,
                    day.date.format(DATE_FORMAT).to_string(),
                    day.total_driving_hours,
                    day.total_on_duty_hours,
                    day.total_off_duty_hours,
                    day.remaining_drive_time,
                    day.remaining_on_duty_time,
                    day.cycle_hours_remaining,
                    day.is_restart,
                ],
            )?;

            for (seq, entry) in day.log_entries.iter().enumerate() {
                tx.execute(
                    "INSERT INTO log_entries (trip_id, day_number, seq, status, activity,
                        start_time, end_time, duration_hours, notes, location)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    params![
                        id,
                        day.day_number,
                        seq as i64,
                        entry.status.as_str(),
                        entry.activity.as_str(),
                        entry.start_time.format(TIMESTAMP_FORMAT).to_string(),
                        entry.end_time.format(TIMESTAMP_FORMAT).to_string(),
                        entry.duration_hours,
                        entry.notes,
                        entry.location,
                    ],
                )?;
            }
        }

        tx.commit()?;
        debug!(trip_id = %id, days = plan.daily_logs.len(), "saved trip plan");
        Ok(id)
    }

    /// All stored trips, newest first.
    ///
    /// # Errors
    /// Returns an error if the query fails or a row cannot be decoded.
    pub fn list(&self) -> Result<Vec<TripSummary>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, created_at, total_miles, actual_days, restart_needed,
                    origin, pickup, dropoff
             FROM trips
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, bool>(4)?,
                labels_from_row(row, 5)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, created_at, total_miles, actual_days, restart_needed, labels) = row?;
            out.push(TripSummary {
                id,
                created_at: parse_created_at(&created_at)?,
                total_miles,
                actual_days,
                restart_needed,
                labels,
            });
        }
        Ok(out)
    }

    /// Summary row for one trip.
    ///
    /// # Errors
    /// Returns [`DatabaseError::TripNotFound`] if no trip has this id.
    pub fn summary(&self, id: &str) -> Result<TripSummary, DatabaseError> {
        self.list()?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| DatabaseError::TripNotFound(id.to_string()))
    }

    /// Rebuild a stored plan.
    ///
    /// # Errors
    /// Returns [`DatabaseError::TripNotFound`] if no trip has this id, or
    /// [`DatabaseError::CorruptRow`] if a stored value cannot be decoded.
    pub fn load(&self, id: &str) -> Result<TripPlan, DatabaseError> {
        let header = self
            .conn
            .query_row(
                "SELECT total_miles, total_driving_hours, estimated_days, actual_days,
                        num_fuel_stops, restart_needed, cycle_used_before, cycle_used_after
                 FROM trips WHERE id = ?1",
                params![id],
                |row| {
                    Ok(TripPlan {
                        total_miles: row.get(0)?,
                        total_driving_hours: row.get(1)?,
                        estimated_days: row.get(2)?,
                        actual_days: row.get(3)?,
                        num_fuel_stops: row.get(4)?,
                        restart_needed: row.get(5)?,
                        cycle_used_before: row.get(6)?,
                        cycle_used_after: row.get(7)?,
                        daily_logs: Vec::new(),
                    })
                },
            )
            .optional()?;
        let mut plan = header.ok_or_else(|| DatabaseError::TripNotFound(id.to_string()))?;

        let mut days_stmt = self.conn.prepare(
            "SELECT day_number, date, total_driving_hours, total_on_duty_hours,
                    total_off_duty_hours, remaining_drive_time, remaining_on_duty_time,
                    cycle_hours_remaining, is_restart
             FROM daily_logs WHERE trip_id = ?1 ORDER BY day_number",
        )?;
        let days = days_stmt.query_map(params![id], |row| {
            Ok((
                row.get::<_, u32>(0)?,
                row.get::<_, String>(1)?,
                [
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, f64>(5)?,
                    row.get::<_, f64>(6)?,
                    row.get::<_, f64>(7)?,
                ],
                row.get::<_, bool>(8)?,
            ))
        })?;

        for day in days {
            let (day_number, date, totals, is_restart) = day?;
            let date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
                .map_err(|e| corrupt("daily_logs", format!("date '{date}': {e}")))?;
            plan.daily_logs.push(DailyLog {
                day_number,
                date,
                log_entries: self.load_entries(id, day_number)?,
                total_driving_hours: totals[0],
                total_on_duty_hours: totals[1],
                total_off_duty_hours: totals[2],
                remaining_drive_time: totals[3],
                remaining_on_duty_time: totals[4],
                cycle_hours_remaining: totals[5],
                is_restart,
            });
        }
        Ok(plan)
    }

    fn load_entries(&self, id: &str, day_number: u32) -> Result<Vec<LogEntry>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT status, activity, start_time, end_time, duration_hours, notes, location
             FROM log_entries WHERE trip_id = ?1 AND day_number = ?2 ORDER BY seq",
        )?;
        let rows = stmt.query_map(params![id, day_number], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, Option<String>>(6)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (status, activity, start, end, duration_hours, notes, location) = row?;
            entries.push(LogEntry {
                status: status
                    .parse()
                    .map_err(|e| corrupt("log_entries", format!("{e}")))?,
                activity: activity
                    .parse()
                    .map_err(|e| corrupt("log_entries", format!("{e}")))?,
                start_time: parse_timestamp(&start)?,
                end_time: parse_timestamp(&end)?,
                duration_hours,
                notes,
                location,
            });
        }
        Ok(entries)
    }

    /// Remove a trip with all its days and entries.
    ///
    /// # Errors
    /// Returns [`DatabaseError::TripNotFound`] if no trip has this id.
    pub fn delete(&self, id: &str) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM log_entries WHERE trip_id = ?1", params![id])?;
        tx.execute("DELETE FROM daily_logs WHERE trip_id = ?1", params![id])?;
        let removed = tx.execute("DELETE FROM trips WHERE id = ?1", params![id])?;
        if removed == 0 {
            return Err(DatabaseError::TripNotFound(id.to_string()));
        }
        tx.commit()?;
        debug!(trip_id = %id, "deleted trip plan");
        Ok(())
    }
}

fn labels_from_row(row: &Row<'_>, first: usize) -> rusqlite::Result<StopLabels> {
    Ok(StopLabels {
        origin: row.get(first)?,
        pickup: row.get(first + 1)?,
        dropoff: row.get(first + 2)?,
    })
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|e| corrupt("log_entries", format!("timestamp '{s}': {e}")))
}

fn parse_created_at(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| corrupt("trips", format!("created_at '{s}': {e}")))
}

fn corrupt(table: &str, message: String) -> DatabaseError {
    DatabaseError::CorruptRow {
        table: table.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{TripPlanner, TripRequest};
    use chrono::NaiveDate;

    fn plan(miles: f64, cycle_used: f64) -> TripPlan {
        let start = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        TripPlanner::new()
            .plan(&TripRequest::new(miles, cycle_used).starting_at(start))
            .unwrap()
    }

    fn labels() -> StopLabels {
        StopLabels {
            origin: Some("Denver, CO".into()),
            pickup: Some("Omaha, NE".into()),
            dropoff: None,
        }
    }

    #[test]
    fn save_and_load_reproduce_the_plan() {
        let store = PlanStore::open_memory().unwrap();
        let original = plan(1500.0, 60.0);
        let id = store.save(&original, &labels().into()).unwrap();

        let loaded = store.load(&id).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn list_returns_summaries_newest_first() {
        let store = PlanStore::open_memory().unwrap();
        let first = store.save(&plan(200.0, 5.0), &TripMeta::default()).unwrap();
        let second = store.save(&plan(2800.0, 0.0), &labels().into()).unwrap();

        let trips = store.list().unwrap();
        assert_eq!(trips.len(), 2);
        assert_eq!(trips[0].id, second);
        assert_eq!(trips[1].id, first);
        assert_eq!(trips[0].total_miles, 2800.0);
        assert_eq!(trips[0].actual_days, 5);
        assert_eq!(trips[0].labels.origin.as_deref(), Some("Denver, CO"));
        assert_eq!(trips[1].labels, StopLabels::default());
    }

    #[test]
    fn summary_finds_one_trip() {
        let store = PlanStore::open_memory().unwrap();
        let id = store.save(&plan(1500.0, 60.0), &TripMeta::default()).unwrap();
        let summary = store.summary(&id).unwrap();
        assert!(summary.restart_needed);
    }

    #[test]
    fn delete_removes_everything() {
        let store = PlanStore::open_memory().unwrap();
        let id = store.save(&plan(900.0, 0.0), &TripMeta::default()).unwrap();
        store.delete(&id).unwrap();

        assert!(store.list().unwrap().is_empty());
        let entries: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM log_entries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(entries, 0);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let store = PlanStore::open_memory().unwrap();
        assert!(matches!(
            store.load("missing"),
            Err(DatabaseError::TripNotFound(_))
        ));
        assert!(matches!(
            store.delete("missing"),
            Err(DatabaseError::TripNotFound(_))
        ));
    }
}
