//! Person-wise history: every recorded status for one personnel.
//!
//! # Invariants
//! - Rows are sorted by class date descending. ISO `YYYY-MM-DD` text makes
//!   lexicographic and chronological order agree; rows whose class is gone
//!   carry an empty date and sort last.
//! - `totals.total == rows.len()`.

use crate::model::attendance::{AttendanceStatus, StatusCounts};
use crate::model::personnel::{Personnel, PersonnelId};
use crate::repo::{RecordStore, RepoResult, DATE_FORMAT};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRow {
    /// `YYYY-MM-DD`, or empty when the class row is missing.
    pub class_date: String,
    pub slot_label: String,
    pub class_name: String,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HistoryTotals {
    pub present: u32,
    pub absent: u32,
    pub total: u32,
}

impl From<StatusCounts> for HistoryTotals {
    fn from(value: StatusCounts) -> Self {
        Self {
            present: value.present,
            absent: value.absent,
            total: value.total(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonHistory {
    /// `None` when the id no longer resolves to a personnel record.
    pub personnel: Option<Personnel>,
    pub rows: Vec<HistoryRow>,
    pub totals: HistoryTotals,
}

pub fn build_person_history<S: RecordStore + ?Sized>(
    store: &S,
    personnel_id: PersonnelId,
) -> RepoResult<PersonHistory> {
    let personnel = store.get_personnel(personnel_id)?;

    let mut counts = StatusCounts::default();
    let mut rows: Vec<HistoryRow> = store
        .list_attendance_with_class(personnel_id)?
        .into_iter()
        .map(|record| {
            counts.record(record.status);
            HistoryRow {
                class_date: record
                    .class_date
                    .map(|date| date.format(DATE_FORMAT).to_string())
                    .unwrap_or_default(),
                slot_label: record.slot_label.unwrap_or_default(),
                class_name: record.class_name.unwrap_or_default(),
                status: record.status,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.class_date.cmp(&a.class_date));

    Ok(PersonHistory {
        personnel,
        rows,
        totals: counts.into(),
    })
}
