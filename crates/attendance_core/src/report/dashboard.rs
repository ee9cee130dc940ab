//! Headline counts for one day.

use crate::model::attendance::StatusCounts;
use crate::repo::{
    AttendanceQuery, ClassQuery, PersonnelQuery, RecordStore, RepoResult, TimeSlotQuery,
};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub date: NaiveDate,
    pub active_personnel: usize,
    pub active_slots: usize,
    pub classes_on_date: usize,
    /// Rounded share of `present` among recorded events; `None` without events.
    pub attendance_percent: Option<u32>,
}

pub fn build_dashboard<S: RecordStore + ?Sized>(
    store: &S,
    date: NaiveDate,
) -> RepoResult<DashboardStats> {
    let active_personnel = store.list_personnel(&PersonnelQuery::active())?.len();
    let active_slots = store
        .list_time_slots(&TimeSlotQuery { active_only: true })?
        .len();
    let classes = store.find_classes(&ClassQuery {
        class_date: Some(date),
        ..ClassQuery::default()
    })?;

    let mut counts = StatusCounts::default();
    if !classes.is_empty() {
        let class_ids = classes.iter().map(|found| found.class.id).collect();
        for event in store.list_attendance(&AttendanceQuery::for_classes(class_ids))? {
            counts.record(event.status);
        }
    }

    Ok(DashboardStats {
        date,
        active_personnel,
        active_slots,
        classes_on_date: classes.len(),
        attendance_percent: rounded_percent(counts),
    })
}

fn rounded_percent(counts: StatusCounts) -> Option<u32> {
    let total = counts.total();
    if total == 0 {
        return None;
    }
    Some((counts.present * 100 + total / 2) / total)
}
