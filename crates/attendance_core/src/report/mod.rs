//! Read-only reporting pipelines over attendance data.
//!
//! # Responsibility
//! - Pivot raw attendance events into date, person, slot and class-name
//!   reports with derived counts.
//! - Provide request sequencing so stale report results can be dropped.
//!
//! # Invariants
//! - Pipelines never write to the store.
//! - Every pipeline recomputes from scratch on each call; nothing is cached.
//! - Missing join targets render as empty strings or zero counts instead of
//!   failing the whole report.

use crate::model::attendance::StatusCounts;
use crate::model::class_instance::{ClassId, ClassWithSlot};
use crate::repo::{AttendanceQuery, RecordStore, RepoResult};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

pub mod class_search;
pub mod dashboard;
pub mod date_wise;
pub mod person_wise;
pub mod request;
pub mod slot_wise;

/// Per-class present/absent tally used by the slot and class-name reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassTally {
    pub class_id: ClassId,
    pub class_date: NaiveDate,
    pub class_name: String,
    /// Empty when the slot row is gone.
    pub slot_label: String,
    #[serde(flatten)]
    pub counts: StatusCounts,
}

/// Folds attendance counts onto `classes`, keeping their order.
///
/// Classes without any events are listed with zero counts.
pub(crate) fn tally_classes<S: RecordStore + ?Sized>(
    store: &S,
    classes: Vec<ClassWithSlot>,
) -> RepoResult<Vec<ClassTally>> {
    if classes.is_empty() {
        return Ok(Vec::new());
    }

    let class_ids = classes.iter().map(|found| found.class.id).collect();
    let mut counts: HashMap<ClassId, StatusCounts> = HashMap::new();
    for event in store.list_attendance(&AttendanceQuery::for_classes(class_ids))? {
        counts
            .entry(event.daily_class_id)
            .or_default()
            .record(event.status);
    }

    Ok(classes
        .into_iter()
        .map(|found| ClassTally {
            counts: counts.remove(&found.class.id).unwrap_or_default(),
            class_id: found.class.id,
            class_date: found.class.class_date,
            class_name: found.class.class_name,
            slot_label: found.slot_label,
        })
        .collect())
}
