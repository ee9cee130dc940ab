//! Slot-wise summary: every class held in one time slot, newest first.

use crate::model::time_slot::{TimeSlot, TimeSlotId};
use crate::report::{tally_classes, ClassTally};
use crate::repo::{ClassQuery, DateOrder, RecordStore, RepoResult};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSummary {
    /// `None` when the slot id no longer resolves.
    pub slot: Option<TimeSlot>,
    pub classes: Vec<ClassTally>,
}

pub fn build_slot_summary<S: RecordStore + ?Sized>(
    store: &S,
    slot_id: TimeSlotId,
) -> RepoResult<SlotSummary> {
    let slot = store.get_time_slot(slot_id)?;
    let classes = store.find_classes(&ClassQuery {
        time_slot_id: Some(slot_id),
        order: DateOrder::Descending,
        ..ClassQuery::default()
    })?;

    Ok(SlotSummary {
        slot,
        classes: tally_classes(store, classes)?,
    })
}
