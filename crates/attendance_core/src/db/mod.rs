//! Attendance database file: opening, schema upgrades, SQL helpers.
//!
//! Every connection handed out by [`open_db`] / [`open_db_in_memory`] has
//! foreign keys on, the `fold_case` SQL function registered, and the schema
//! at [`migrations::latest_version`]. Deleting a person or a time slot
//! cascades into their classes and attendance rows.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
mod text;

pub use open::{open_db, open_db_in_memory};
pub(crate) use text::{fold_case, register_text_functions, FOLD_CASE_SQL};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was written by a newer build than this one.
    UnsupportedSchemaVersion { db_version: u32, latest_supported: u32 },
    /// A schema step failed; the file keeps its previous version.
    Migration { version: u32, source: rusqlite::Error },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "attendance file is at schema version {db_version}; this build reads up to {latest_supported}"
            ),
            Self::Migration { version, source } => {
                write!(f, "attendance schema step {version} failed: {source}")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

#[cfg(test)]
mod tests {
    use super::DbError;
    use std::error::Error;

    #[test]
    fn migration_error_names_the_failing_step() {
        let err = DbError::Migration {
            version: 2,
            source: rusqlite::Error::InvalidQuery,
        };
        assert!(err.to_string().starts_with("attendance schema step 2 failed"));
        assert!(err.source().is_some());
    }

    #[test]
    fn newer_file_error_reports_both_versions() {
        let err = DbError::UnsupportedSchemaVersion {
            db_version: 9,
            latest_supported: 1,
        };
        let message = err.to_string();
        assert!(message.contains("version 9"));
        assert!(message.contains("up to 1"));
        assert!(err.source().is_none());
    }
}
