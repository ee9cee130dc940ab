//! Core domain logic for attendance tracking.
//! This crate is the single source of truth for attendance invariants:
//! natural-key uniqueness, idempotent marking commits and derived report counts.

pub mod db;
pub mod logging;
pub mod model;
pub mod ranking;
pub mod report;
pub mod repo;
pub mod service;

pub use logging::{flush_logs, init_logging, LogConfig, LogLevel, LoggingError};
pub use model::attendance::{AttendanceEvent, AttendanceStatus, StatusCounts};
pub use model::class_instance::{ClassId, ClassInstance, ClassWithSlot};
pub use model::personnel::{Category, Personnel, PersonnelDraft, PersonnelId, SubCategory};
pub use model::time_slot::{TimeSlot, TimeSlotId};
pub use model::validation::ValidationError;
pub use ranking::rank_personnel;
pub use report::class_search::{search_classes, ClassSearchOutcome};
pub use report::dashboard::{build_dashboard, DashboardStats};
pub use report::date_wise::{build_date_report, CellStatus, DateReport, DateSummary};
pub use report::person_wise::{build_person_history, HistoryTotals, PersonHistory};
pub use report::request::{LatestReport, RequestSequence, RequestToken};
pub use report::slot_wise::{build_slot_summary, SlotSummary};
pub use report::ClassTally;
pub use repo::{RecordStore, RepoError, RepoResult, SqliteStore};
pub use service::marking::{MarkingError, MarkingPhase, MarkingSession, SaveSummary};
pub use service::roster::{RosterFilter, RosterService};
pub use service::schedule::{
    load_day_schedule, save_day_schedule, PartialBatchError, ScheduleError, SlotOutcome,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
