//! Record store adapter: repository contracts and the SQLite implementation.
//!
//! # Responsibility
//! - Define one use-case oriented contract per collection (personnel, time
//!   slots, class instances, attendance events).
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate model input before SQL mutations.
//! - Natural-key violations surface as `RepoError::Conflict`, never as raw
//!   SQLite errors.
//! - Read paths reject invalid persisted status values instead of masking them.

use crate::db::migrations::latest_version;
use crate::db::{register_text_functions, DbError};
use crate::model::validation::ValidationError;
use chrono::{NaiveDate, NaiveTime};
use rusqlite::{Connection, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod attendance_repo;
pub mod class_repo;
pub mod personnel_repo;
pub mod time_slot_repo;

pub use attendance_repo::{AttendanceQuery, AttendanceRepository, AttendanceWithClass};
pub use class_repo::{ClassQuery, ClassRepository, DateOrder};
pub use personnel_repo::{PersonnelQuery, PersonnelRepository};
pub use time_slot_repo::{NewTimeSlot, TimeSlotQuery, TimeSlotRepository};

pub type RepoResult<T> = Result<T, RepoError>;

/// Store-level error shared by every repository.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound { entity: &'static str, id: Uuid },
    /// A natural key (employee code, `(class_date, time_slot_id)`) is taken.
    Conflict(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "attendance store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "attendance store requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Every collection the core reads or writes.
///
/// Services and report pipelines are generic over this umbrella so tests
/// can wrap the SQLite store.
pub trait RecordStore:
    PersonnelRepository + TimeSlotRepository + ClassRepository + AttendanceRepository
{
}

impl<T> RecordStore for T where
    T: PersonnelRepository + TimeSlotRepository + ClassRepository + AttendanceRepository
{
}

/// SQLite-backed record store over a migrated connection.
pub struct SqliteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStore<'conn> {
    /// Constructs the store, rejecting connections that skipped migrations.
    ///
    /// Also registers `fold_case` on `conn`, so connections opened outside
    /// [`crate::db::open_db`] can run name searches.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let actual_version: u32 =
            conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        for table in ["personnel", "time_slots", "daily_classes", "attendance"] {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }

        register_text_functions(conn)?;
        Ok(Self { conn })
    }

    pub(crate) fn conn(&self) -> &'conn Connection {
        self.conn
    }
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Maps unique/primary-key violations to `Conflict`, everything else to `Db`.
pub(crate) fn map_write_error(
    err: rusqlite::Error,
    conflict: impl FnOnce() -> String,
) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        let is_key_violation = failure.code == ErrorCode::ConstraintViolation
            && matches!(
                failure.extended_code,
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            );
        if is_key_violation {
            return RepoError::Conflict(conflict());
        }
    }
    RepoError::Db(DbError::Sqlite(err))
}

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

pub(crate) fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_date(value: &str, column: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}` in {column}")))
}

pub(crate) fn time_to_db(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub(crate) fn parse_time(value: &str, column: &str) -> RepoResult<NaiveTime> {
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| RepoError::InvalidData(format!("invalid time `{value}` in {column}")))
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
