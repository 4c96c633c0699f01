//! Interval store for the registre time tracker.
//!
//! Provides persistence for [`Record`]s using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! The tool runs one command per process, so a single owned connection is all it needs.
//!
//! # Schema
//!
//! One table, `reg`, holds every interval. An interval is open while its `stop`
//! column is NULL; the "at most one open interval" rule is enforced here, at
//! the application level, not by a database constraint.
//!
//! ## Timestamp Format
//!
//! `start` and `stop` are stored as numeric Unix epoch seconds in UTC. Whole
//! seconds are written as INTEGER, anything finer as REAL, so fractional values
//! from older files survive an export and re-import unchanged.
//! Calendar bucketing uses the UTC civil date of `start`.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use registre_core::{Bucket, Record, YearMonth};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// More than one interval is open; the store is inconsistent.
    #[error("found {} open intervals (ids {ids:?}); at most one may be open", .ids.len())]
    MultipleOpenIntervals { ids: Vec<i64> },
    /// No record with the given id.
    #[error("no record with id {0}")]
    RecordNotFound(i64),
    /// A stored timestamp is outside the representable range.
    #[error("invalid timestamp for record {id}: {value}")]
    InvalidTimestamp { id: i64, value: f64 },
    /// An imported record collides with a different stored record.
    #[error("record {id} already exists with different contents")]
    ImportConflict { id: i64 },
    /// An imported record stops before it starts.
    #[error("record {id} stops before it starts")]
    NegativeInterval { id: i64 },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Summary counts for the `info` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub record_count: i64,
    /// Distinct project names, sorted.
    pub projects: Vec<String>,
}

/// Outcome of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub inserted: usize,
    /// Records already present with identical contents.
    pub unchanged: usize,
}

const SELECT_RECORD: &str = "SELECT id, project, task, start, stop FROM reg";

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        tracing::debug!(path = %path.display(), "opened database");
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database,
    /// and never touches existing rows.
    pub fn initialize(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- start/stop: Unix epoch seconds (UTC); stop IS NULL marks the open interval
            CREATE TABLE IF NOT EXISTS reg (
                id INTEGER NOT NULL PRIMARY KEY,
                project TEXT NOT NULL,
                task TEXT,
                start TIMESTAMP NOT NULL,
                stop TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_reg_start ON reg(start);
            ",
        )?;
        Ok(())
    }

    /// Inserts a new open record and returns its id.
    pub fn append(
        &mut self,
        project: &str,
        task: Option<&str>,
        start: DateTime<Utc>,
    ) -> Result<i64, DbError> {
        let id = insert_open(&self.conn, project, task, start)?;
        tracing::debug!(id, project, "appended open record");
        Ok(id)
    }

    /// Sets the stop time of a record.
    ///
    /// The caller is responsible for the record being open; this does not
    /// check `stop IS NULL`.
    pub fn close(&mut self, id: i64, stop: DateTime<Utc>) -> Result<(), DbError> {
        set_stop(&self.conn, id, stop)?;
        tracing::debug!(id, "closed record");
        Ok(())
    }

    /// Sets the stop time of several records in one transaction.
    pub fn close_all(&mut self, closes: &[(i64, DateTime<Utc>)]) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        for &(id, stop) in closes {
            set_stop(&tx, id, stop)?;
        }
        tx.commit()?;
        tracing::debug!(count = closes.len(), "closed records");
        Ok(())
    }

    /// Closes `close_id` and opens a new record in one transaction.
    pub fn switch_to(
        &mut self,
        close_id: i64,
        stop: DateTime<Utc>,
        project: &str,
        task: Option<&str>,
        start: DateTime<Utc>,
    ) -> Result<i64, DbError> {
        let tx = self.conn.transaction()?;
        set_stop(&tx, close_id, stop)?;
        let id = insert_open(&tx, project, task, start)?;
        tx.commit()?;
        tracing::debug!(closed = close_id, opened = id, project, "switched record");
        Ok(id)
    }

    /// Returns the most recently started record, optionally for one project.
    ///
    /// The result may be closed if nothing is open.
    pub fn last_started(&self, project: Option<&str>) -> Result<Option<Record>, DbError> {
        let record = match project {
            Some(project) => self
                .conn
                .query_row(
                    &format!(
                        "{SELECT_RECORD} WHERE project = ? ORDER BY start DESC, id DESC LIMIT 1"
                    ),
                    [project],
                    RawRecord::from_row,
                )
                .optional()?,
            None => self
                .conn
                .query_row(
                    &format!("{SELECT_RECORD} ORDER BY start DESC, id DESC LIMIT 1"),
                    [],
                    RawRecord::from_row,
                )
                .optional()?,
        };
        record.map(RawRecord::into_record).transpose()
    }

    /// Returns the open record, if any.
    ///
    /// Fails with [`DbError::MultipleOpenIntervals`] if more than one record is open.
    pub fn current_open(&self) -> Result<Option<Record>, DbError> {
        let mut open = self.open_records()?;
        if open.len() > 1 {
            let ids: Vec<i64> = open.iter().map(|r| r.id).collect();
            tracing::warn!(?ids, "multiple open intervals");
            return Err(DbError::MultipleOpenIntervals { ids });
        }
        Ok(open.pop())
    }

    /// Every record without a stop time, oldest first.
    ///
    /// Normally zero or one; more only after concurrent starts.
    pub fn open_records(&self) -> Result<Vec<Record>, DbError> {
        self.query(
            &format!("{SELECT_RECORD} WHERE stop IS NULL ORDER BY start ASC, id ASC"),
            [],
        )
    }

    /// Records starting on the given UTC date.
    pub fn query_by_day(&self, date: NaiveDate) -> Result<Vec<Record>, DbError> {
        self.query_bucket(&Bucket::day(date))
    }

    /// Records starting in the Monday-to-Sunday week that contains `week_start`.
    pub fn query_by_week(&self, week_start: NaiveDate) -> Result<Vec<Record>, DbError> {
        match Bucket::week_containing(week_start) {
            Some(bucket) => self.query_bucket(&bucket),
            None => Ok(Vec::new()),
        }
    }

    /// Records starting in the given month.
    pub fn query_by_month(&self, month: YearMonth) -> Result<Vec<Record>, DbError> {
        self.query_bucket(&Bucket::month(month))
    }

    /// Records whose start date falls within the bucket.
    pub fn query_bucket(&self, bucket: &Bucket) -> Result<Vec<Record>, DbError> {
        let (from, to) = bucket.utc_bounds();
        tracing::debug!(
            period = %bucket.period(),
            first = %bucket.first_day(),
            last = %bucket.last_day(),
            "querying bucket"
        );
        self.query_range(Some(from), to)
    }

    /// Records with `from <= start < to`, either bound optional.
    pub fn query_range(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Record>, DbError> {
        self.query(
            &format!(
                "{SELECT_RECORD}
                WHERE (?1 IS NULL OR start >= ?1) AND (?2 IS NULL OR start < ?2)
                ORDER BY start ASC, id ASC"
            ),
            params![from.map(epoch_value), to.map(epoch_value)],
        )
    }

    /// Lists all records ordered by start then ID.
    pub fn list_records(&self) -> Result<Vec<Record>, DbError> {
        self.query_range(None, None)
    }

    /// Counts records and collects distinct project names.
    pub fn stats(&self) -> Result<StoreStats, DbError> {
        let record_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM reg", [], |row| row.get(0))?;
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT project FROM reg ORDER BY project ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut projects = Vec::new();
        for row in rows {
            projects.push(row?);
        }
        Ok(StoreStats {
            record_count,
            projects,
        })
    }

    /// Imports records, preserving their ids, in a single transaction.
    ///
    /// A record whose id already exists with identical contents is skipped,
    /// so re-importing an export is a no-op. Any error rolls back the whole
    /// import.
    pub fn import_records(&mut self, records: &[Record]) -> Result<ImportSummary, DbError> {
        let mut summary = ImportSummary::default();
        let tx = self.conn.transaction()?;
        {
            let mut select = tx.prepare(&format!("{SELECT_RECORD} WHERE id = ?"))?;
            let mut insert = tx.prepare(
                "INSERT INTO reg (id, project, task, start, stop) VALUES (?, ?, ?, ?, ?)",
            )?;
            for record in records {
                let record = &Record {
                    start: as_stored(record.id, record.start)?,
                    stop: record.stop.map(|t| as_stored(record.id, t)).transpose()?,
                    ..record.clone()
                };
                if record.stop.is_some_and(|stop| stop < record.start) {
                    return Err(DbError::NegativeInterval { id: record.id });
                }
                let existing = select
                    .query_row([record.id], RawRecord::from_row)
                    .optional()?
                    .map(RawRecord::into_record)
                    .transpose()?;
                match existing {
                    Some(existing) if existing == *record => summary.unchanged += 1,
                    Some(_) => return Err(DbError::ImportConflict { id: record.id }),
                    None => {
                        insert.execute(params![
                            record.id,
                            record.project,
                            record.task,
                            epoch_value(record.start),
                            record.stop.map(epoch_value),
                        ])?;
                        summary.inserted += 1;
                    }
                }
            }

            let mut open = tx.prepare("SELECT id FROM reg WHERE stop IS NULL ORDER BY id")?;
            let ids = open
                .query_map([], |row| row.get::<_, i64>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            if ids.len() > 1 {
                return Err(DbError::MultipleOpenIntervals { ids });
            }
        }
        tx.commit()?;
        tracing::debug!(?summary, "imported records");
        Ok(summary)
    }

    fn query<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<Record>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, RawRecord::from_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }
}

fn insert_open(
    conn: &Connection,
    project: &str,
    task: Option<&str>,
    start: DateTime<Utc>,
) -> Result<i64, DbError> {
    conn.execute(
        "INSERT INTO reg (project, task, start) VALUES (?, ?, ?)",
        params![project, task, epoch_value(start)],
    )?;
    Ok(conn.last_insert_rowid())
}

fn set_stop(conn: &Connection, id: i64, stop: DateTime<Utc>) -> Result<(), DbError> {
    let updated = conn.execute(
        "UPDATE reg SET stop = ? WHERE id = ?",
        params![epoch_value(stop), id],
    )?;
    if updated == 0 {
        return Err(DbError::RecordNotFound(id));
    }
    Ok(())
}

/// A row as stored, before timestamp conversion.
struct RawRecord {
    id: i64,
    project: String,
    task: Option<String>,
    start: f64,
    stop: Option<f64>,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            project: row.get(1)?,
            task: row.get(2)?,
            start: row.get(3)?,
            stop: row.get(4)?,
        })
    }

    fn into_record(self) -> Result<Record, DbError> {
        let id = self.id;
        let start = epoch_to_utc(id, self.start)?;
        let stop = self.stop.map(|value| epoch_to_utc(id, value)).transpose()?;
        Ok(Record {
            id,
            project: self.project,
            task: self.task,
            start,
            stop,
        })
    }
}

/// Column value for a timestamp: INTEGER for whole seconds, REAL otherwise.
#[allow(clippy::cast_precision_loss)]
fn epoch_value(time: DateTime<Utc>) -> Value {
    match time.timestamp_subsec_nanos() {
        0 => Value::Integer(time.timestamp()),
        nanos => Value::Real(time.timestamp() as f64 + f64::from(nanos) / 1e9),
    }
}

/// The timestamp as it reads back after being stored.
fn as_stored(id: i64, time: DateTime<Utc>) -> Result<DateTime<Utc>, DbError> {
    match epoch_value(time) {
        Value::Real(value) => epoch_to_utc(id, value),
        _ => Ok(time),
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn epoch_to_utc(id: i64, value: f64) -> Result<DateTime<Utc>, DbError> {
    let invalid = || DbError::InvalidTimestamp { id, value };
    if !value.is_finite() {
        return Err(invalid());
    }
    let secs = value.floor();
    let nanos = (((value - secs) * 1e9).round() as u32).min(999_999_999);
    if secs < i64::MIN as f64 || secs > i64::MAX as f64 {
        return Err(invalid());
    }
    DateTime::from_timestamp(secs as i64, nanos).ok_or_else(invalid)
}
