//! Date-wise pivot: personnel x time slot status matrix for one date.
//!
//! # Invariants
//! - Columns follow `sort_order`; rows follow canonical personnel rank.
//! - `present + absent + unmarked == rows * columns` for every report.
//! - A slot without a class on the date contributes only unmarked cells.

use crate::model::attendance::AttendanceStatus;
use crate::model::personnel::{Personnel, PersonnelId};
use crate::model::time_slot::{TimeSlot, TimeSlotId};
use crate::ranking::rank_personnel;
use crate::repo::{
    AttendanceQuery, ClassQuery, PersonnelQuery, RecordStore, RepoResult, TimeSlotQuery,
};
use chrono::NaiveDate;
use log::debug;
use serde::Serialize;
use std::collections::HashMap;

/// One pivot cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStatus {
    Present,
    Absent,
    /// No event recorded, or no class held in the slot.
    Unmarked,
}

impl From<Option<AttendanceStatus>> for CellStatus {
    fn from(value: Option<AttendanceStatus>) -> Self {
        match value {
            Some(AttendanceStatus::Present) => Self::Present,
            Some(AttendanceStatus::Absent) => Self::Absent,
            None => Self::Unmarked,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateReportColumn {
    pub slot: TimeSlot,
    /// Name of the class held in this slot on the report date.
    pub class_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateReportRow {
    pub personnel: Personnel,
    /// Parallel to [`DateReport::columns`].
    pub cells: Vec<CellStatus>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateSummary {
    pub present: usize,
    pub absent: usize,
    pub unmarked: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateReport {
    pub date: NaiveDate,
    pub columns: Vec<DateReportColumn>,
    pub rows: Vec<DateReportRow>,
    pub summary: DateSummary,
}

impl DateReport {
    /// Looks up one cell; `None` when the personnel or slot is not in the report.
    pub fn cell(&self, personnel_id: PersonnelId, slot_id: TimeSlotId) -> Option<CellStatus> {
        let column = self.columns.iter().position(|c| c.slot.id == slot_id)?;
        let row = self.rows.iter().find(|r| r.personnel.id == personnel_id)?;
        row.cells.get(column).copied()
    }
}

/// Builds the pivot for `date` over active slots and active personnel.
pub fn build_date_report<S: RecordStore + ?Sized>(
    store: &S,
    date: NaiveDate,
) -> RepoResult<DateReport> {
    let slots = store.list_time_slots(&TimeSlotQuery { active_only: true })?;
    let personnel = store.list_personnel(&PersonnelQuery::active())?;
    build_date_report_for(store, date, &slots, &personnel)
}

/// Builds the pivot for `date` over caller-supplied slot and personnel sets.
pub fn build_date_report_for<S: RecordStore + ?Sized>(
    store: &S,
    date: NaiveDate,
    slots: &[TimeSlot],
    personnel: &[Personnel],
) -> RepoResult<DateReport> {
    let mut slots = slots.to_vec();
    slots.sort_by_key(|slot| slot.sort_order);
    let personnel = rank_personnel(personnel);

    let classes = store.find_classes(&ClassQuery {
        class_date: Some(date),
        ..ClassQuery::default()
    })?;
    let mut class_names: HashMap<TimeSlotId, String> = HashMap::new();
    let mut class_to_slot = HashMap::new();
    for found in classes {
        class_to_slot.insert(found.class.id, found.class.time_slot_id);
        class_names.insert(found.class.time_slot_id, found.class.class_name);
    }

    let mut pivot: HashMap<PersonnelId, HashMap<TimeSlotId, AttendanceStatus>> = HashMap::new();
    if !class_to_slot.is_empty() {
        let class_ids = class_to_slot.keys().copied().collect();
        for event in store.list_attendance(&AttendanceQuery::for_classes(class_ids))? {
            if let Some(slot_id) = class_to_slot.get(&event.daily_class_id) {
                pivot
                    .entry(event.employee_id)
                    .or_default()
                    .insert(*slot_id, event.status);
            }
        }
    }

    let mut summary = DateSummary::default();
    let rows: Vec<DateReportRow> = personnel
        .into_iter()
        .map(|person| {
            let statuses = pivot.get(&person.id);
            let cells = slots
                .iter()
                .map(|slot| {
                    let status = statuses.and_then(|by_slot| by_slot.get(&slot.id).copied());
                    let cell = CellStatus::from(status);
                    match cell {
                        CellStatus::Present => summary.present += 1,
                        CellStatus::Absent => summary.absent += 1,
                        CellStatus::Unmarked => summary.unmarked += 1,
                    }
                    cell
                })
                .collect();
            DateReportRow {
                personnel: person,
                cells,
            }
        })
        .collect();

    let columns = slots
        .into_iter()
        .map(|slot| DateReportColumn {
            class_name: class_names.remove(&slot.id),
            slot,
        })
        .collect();

    debug!(
        "event=report_date module=report status=ok date={date} present={} absent={} unmarked={}",
        summary.present, summary.absent, summary.unmarked
    );
    Ok(DateReport {
        date,
        columns,
        rows,
        summary,
    })
}
