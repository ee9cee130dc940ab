//! Full-day class schedule: one class name per active time slot.
//!
//! # Responsibility
//! - Read the current slot -> class mapping for a date.
//! - Apply a batch of slot names as independent insert/rename operations.
//!
//! # Invariants
//! - Each slot is attempted independently; one failure never stops the rest.
//! - Succeeded slots are not rolled back when another slot fails.
//! - Blank names are skipped; they never delete an existing class.
//! - The batch is successful only when no slot failed.

use crate::model::class_instance::{normalize_class_name, ClassId, ClassInstance};
use crate::model::time_slot::{TimeSlot, TimeSlotId};
use crate::repo::{ClassQuery, RecordStore, RepoError, RepoResult, TimeSlotQuery};
use chrono::NaiveDate;
use log::{info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Current schedule line for one active slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayScheduleEntry {
    pub slot: TimeSlot,
    pub class: Option<ClassInstance>,
}

/// What happened to one slot during a batch save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum SlotOutcome {
    Created(ClassId),
    Renamed(ClassId),
    Unchanged(ClassId),
    /// No name given for this slot.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotScheduleResult {
    pub slot_id: TimeSlotId,
    pub slot_label: String,
    pub outcome: SlotOutcome,
}

impl SlotScheduleResult {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, SlotOutcome::Failed(_))
    }
}

/// At least one slot failed; carries every slot's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialBatchError {
    pub results: Vec<SlotScheduleResult>,
}

impl PartialBatchError {
    pub fn failures(&self) -> impl Iterator<Item = &SlotScheduleResult> {
        self.results.iter().filter(|result| result.is_failure())
    }
}

impl Display for PartialBatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let failed: Vec<String> = self
            .failures()
            .map(|result| match &result.outcome {
                SlotOutcome::Failed(message) => format!("{}: {message}", result.slot_label),
                _ => result.slot_label.clone(),
            })
            .collect();
        write!(
            f,
            "{} of {} slots failed ({})",
            failed.len(),
            self.results.len(),
            failed.join("; ")
        )
    }
}

impl Error for PartialBatchError {}

#[derive(Debug)]
pub enum ScheduleError {
    /// The batch could not start (slot or class lookup failed).
    Store(RepoError),
    PartialBatch(PartialBatchError),
}

impl Display for ScheduleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::PartialBatch(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ScheduleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::PartialBatch(err) => Some(err),
        }
    }
}

impl From<RepoError> for ScheduleError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

/// Lists active slots with the class held in each on `date`.
pub fn load_day_schedule<S: RecordStore + ?Sized>(
    store: &S,
    date: NaiveDate,
) -> RepoResult<Vec<DayScheduleEntry>> {
    let slots = store.list_time_slots(&TimeSlotQuery { active_only: true })?;
    let mut by_slot = classes_by_slot(store, date)?;

    Ok(slots
        .into_iter()
        .map(|slot| DayScheduleEntry {
            class: by_slot.remove(&slot.id),
            slot,
        })
        .collect())
}

/// Applies `names` (slot id -> class name) to the active slots of `date`.
///
/// Names keyed by inactive or unknown slots are ignored.
pub fn save_day_schedule<S: RecordStore + ?Sized>(
    store: &S,
    date: NaiveDate,
    names: &HashMap<TimeSlotId, String>,
) -> Result<Vec<SlotScheduleResult>, ScheduleError> {
    let slots = store.list_time_slots(&TimeSlotQuery { active_only: true })?;
    let existing = classes_by_slot(store, date)?;

    let results: Vec<SlotScheduleResult> = slots
        .iter()
        .map(|slot| SlotScheduleResult {
            slot_id: slot.id,
            slot_label: slot.label.clone(),
            outcome: apply_slot(
                store,
                date,
                slot.id,
                names.get(&slot.id).map(String::as_str),
                existing.get(&slot.id),
            ),
        })
        .collect();

    let failed = results.iter().filter(|result| result.is_failure()).count();
    if failed > 0 {
        warn!(
            "event=schedule_save module=schedule status=partial date={date} slots={} failed={failed}",
            results.len()
        );
        return Err(ScheduleError::PartialBatch(PartialBatchError { results }));
    }

    info!(
        "event=schedule_save module=schedule status=ok date={date} slots={}",
        results.len()
    );
    Ok(results)
}

fn apply_slot<S: RecordStore + ?Sized>(
    store: &S,
    date: NaiveDate,
    slot_id: TimeSlotId,
    raw_name: Option<&str>,
    existing: Option<&ClassInstance>,
) -> SlotOutcome {
    let Some(raw_name) = raw_name.filter(|name| !name.trim().is_empty()) else {
        return SlotOutcome::Skipped;
    };
    let name = match normalize_class_name(raw_name) {
        Ok(name) => name,
        Err(err) => return SlotOutcome::Failed(err.to_string()),
    };

    match existing {
        Some(class) if class.class_name == name => SlotOutcome::Unchanged(class.id),
        Some(class) => match store.rename_class(class.id, &name) {
            Ok(()) => SlotOutcome::Renamed(class.id),
            Err(err) => SlotOutcome::Failed(err.to_string()),
        },
        None => {
            let created = match ClassInstance::new(date, slot_id, &name) {
                Ok(created) => created,
                Err(err) => return SlotOutcome::Failed(err.to_string()),
            };
            match store.insert_class(&created) {
                Ok(()) => SlotOutcome::Created(created.id),
                Err(err) => SlotOutcome::Failed(err.to_string()),
            }
        }
    }
}

fn classes_by_slot<S: RecordStore + ?Sized>(
    store: &S,
    date: NaiveDate,
) -> RepoResult<HashMap<TimeSlotId, ClassInstance>> {
    Ok(store
        .find_classes(&ClassQuery {
            class_date: Some(date),
            ..ClassQuery::default()
        })?
        .into_iter()
        .map(|found| (found.class.time_slot_id, found.class))
        .collect())
}
