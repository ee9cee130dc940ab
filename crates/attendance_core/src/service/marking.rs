//! Attendance marking workflow for one `(date, time slot)` selection.
//!
//! # Responsibility
//! - Resolve (or create) the class instance for the selection.
//! - Seed an in-memory present-set from stored attendance.
//! - Commit the present-set as one idempotent batch upsert.
//!
//! # Invariants
//! - Phase moves `NoSelection -> SlotChosen -> ClassMissing | ClassLoaded ->
//!   Editing -> Saved`. `Saving` only exists for the duration of
//!   [`MarkingSession::save`].
//! - Toggles and bulk marks never touch the store.
//! - The present-set only contains ids from the session roster.
//! - A save writes one event per roster member, so previously unmarked
//!   personnel become explicit `absent`.
//! - Failed store calls leave the phase at its pre-call value.

use crate::model::attendance::{AttendanceEvent, AttendanceStatus};
use crate::model::class_instance::{normalize_class_name, ClassInstance};
use crate::model::personnel::{Personnel, PersonnelId};
use crate::model::time_slot::{TimeSlot, TimeSlotId};
use crate::model::validation::ValidationError;
use crate::ranking::rank_personnel;
use crate::repo::{AttendanceQuery, PersonnelQuery, RecordStore, RepoError, TimeSlotQuery};
use chrono::NaiveDate;
use log::{info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Observable workflow phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkingPhase {
    NoSelection,
    /// Selection is set but the class lookup has not completed.
    SlotChosen,
    ClassMissing,
    ClassLoaded,
    Editing,
    Saved,
}

/// Concrete date and slot under edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub date: NaiveDate,
    pub slot_id: TimeSlotId,
}

/// Counts reported after a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaveSummary {
    pub present: usize,
    pub absent: usize,
}

#[derive(Debug)]
pub enum MarkingError {
    Validation(ValidationError),
    Store(RepoError),
    /// Action is not allowed in the current phase.
    InvalidState {
        action: &'static str,
        phase: MarkingPhase,
    },
    /// Personnel id is not part of the active roster loaded by this session.
    UnknownPersonnel(PersonnelId),
}

impl Display for MarkingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::InvalidState { action, phase } => {
                write!(f, "cannot {action} while marking is in phase {phase:?}")
            }
            Self::UnknownPersonnel(id) => write!(f, "personnel {id} is not on the active roster"),
        }
    }
}

impl Error for MarkingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for MarkingError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for MarkingError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Store(other),
        }
    }
}

/// One editing session over a borrowed record store.
pub struct MarkingSession<'s, S: RecordStore + ?Sized> {
    store: &'s S,
    roster: Vec<Personnel>,
    slots: Vec<TimeSlot>,
    selection: Option<Selection>,
    class: Option<ClassInstance>,
    present: HashSet<PersonnelId>,
    phase: MarkingPhase,
    last_error: Option<String>,
}

impl<'s, S: RecordStore + ?Sized> MarkingSession<'s, S> {
    /// Loads active time slots, then the ranked active roster.
    pub fn open(store: &'s S) -> Result<Self, MarkingError> {
        let slots = store.list_time_slots(&TimeSlotQuery { active_only: true })?;
        let roster = rank_personnel(&store.list_personnel(&PersonnelQuery::active())?);

        Ok(Self {
            store,
            roster,
            slots,
            selection: None,
            class: None,
            present: HashSet::new(),
            phase: MarkingPhase::NoSelection,
            last_error: None,
        })
    }

    pub fn phase(&self) -> MarkingPhase {
        self.phase
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn class(&self) -> Option<&ClassInstance> {
        self.class.as_ref()
    }

    /// Active roster in canonical order.
    pub fn roster(&self) -> &[Personnel] {
        &self.roster
    }

    /// Active slots ordered by `sort_order`.
    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn selected_slot(&self) -> Option<&TimeSlot> {
        let selection = self.selection?;
        self.slots.iter().find(|slot| slot.id == selection.slot_id)
    }

    pub fn is_present(&self, id: PersonnelId) -> bool {
        self.present.contains(&id)
    }

    pub fn present_count(&self) -> usize {
        self.present.len()
    }

    /// Message of the most recent failed store call, cleared on success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Changes the selection; a missing date or slot resets the session.
    pub fn select(
        &mut self,
        date: Option<NaiveDate>,
        slot_id: Option<TimeSlotId>,
    ) -> Result<MarkingPhase, MarkingError> {
        self.class = None;
        self.present.clear();
        self.last_error = None;

        let (Some(date), Some(slot_id)) = (date, slot_id) else {
            self.selection = None;
            self.phase = MarkingPhase::NoSelection;
            return Ok(self.phase);
        };

        self.selection = Some(Selection { date, slot_id });
        self.phase = MarkingPhase::SlotChosen;
        self.reload()
    }

    /// Re-reads the class and its attendance for the current selection.
    pub fn reload(&mut self) -> Result<MarkingPhase, MarkingError> {
        let selection = self.selection.ok_or(ValidationError::MissingSelection)?;

        match self.load_selection(selection) {
            Ok((class, present)) => {
                self.phase = if class.is_some() {
                    MarkingPhase::ClassLoaded
                } else {
                    MarkingPhase::ClassMissing
                };
                self.class = class;
                self.present = present;
                self.last_error = None;
                Ok(self.phase)
            }
            Err(err) => {
                warn!(
                    "event=marking_load module=marking status=error date={} slot_id={} error={}",
                    selection.date, selection.slot_id, err
                );
                self.class = None;
                self.present.clear();
                self.phase = MarkingPhase::SlotChosen;
                self.last_error = Some(err.to_string());
                Err(err.into())
            }
        }
    }

    fn load_selection(
        &self,
        selection: Selection,
    ) -> Result<(Option<ClassInstance>, HashSet<PersonnelId>), RepoError> {
        let Some(class) = self
            .store
            .find_class_for_slot(selection.date, selection.slot_id)?
        else {
            return Ok((None, HashSet::new()));
        };

        let roster_ids: HashSet<PersonnelId> = self.roster.iter().map(|p| p.id).collect();
        let present = self
            .store
            .list_attendance(&AttendanceQuery::for_classes(vec![class.id]))?
            .into_iter()
            .filter(|event| event.status == AttendanceStatus::Present)
            .map(|event| event.employee_id)
            .filter(|id| roster_ids.contains(id))
            .collect();

        Ok((Some(class), present))
    }

    /// Creates the class for the current selection from `ClassMissing`.
    ///
    /// When another writer created the class first, the existing instance is
    /// loaded instead of creating a duplicate.
    pub fn create_class(&mut self, class_name: &str) -> Result<&ClassInstance, MarkingError> {
        if self.phase != MarkingPhase::ClassMissing {
            return Err(MarkingError::InvalidState {
                action: "create a class",
                phase: self.phase,
            });
        }
        let selection = self.selection.ok_or(ValidationError::MissingSelection)?;
        let class = ClassInstance::new(selection.date, selection.slot_id, class_name)?;

        match self.store.insert_class(&class) {
            Ok(()) => {
                info!(
                    "event=class_create module=marking status=ok date={} slot_id={} class_id={}",
                    selection.date, selection.slot_id, class.id
                );
                self.present.clear();
                self.phase = MarkingPhase::ClassLoaded;
                self.last_error = None;
                Ok(self.class.insert(class))
            }
            Err(RepoError::Conflict(message)) => {
                info!(
                    "event=class_create module=marking status=exists date={} slot_id={} detail={}",
                    selection.date, selection.slot_id, message
                );
                self.reload()?;
                self.class.as_ref().ok_or(MarkingError::InvalidState {
                    action: "load the existing class",
                    phase: self.phase,
                })
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Renames the loaded class in place.
    pub fn rename_class(&mut self, class_name: &str) -> Result<(), MarkingError> {
        let class_name = normalize_class_name(class_name)?;
        let phase = self.phase;
        let class = self.class.as_mut().ok_or(MarkingError::InvalidState {
            action: "rename the class",
            phase,
        })?;

        if let Err(err) = self.store.rename_class(class.id, &class_name) {
            self.last_error = Some(err.to_string());
            return Err(err.into());
        }
        class.class_name = class_name;
        self.last_error = None;
        Ok(())
    }

    /// Flips one roster member's membership; returns the new state.
    pub fn toggle(&mut self, id: PersonnelId) -> Result<bool, MarkingError> {
        self.begin_edit("toggle attendance")?;
        self.ensure_on_roster(id)?;

        let now_present = if self.present.remove(&id) {
            false
        } else {
            self.present.insert(id);
            true
        };
        Ok(now_present)
    }

    /// Puts one roster member in the present set. Repeating it changes nothing.
    pub fn mark_present(&mut self, id: PersonnelId) -> Result<(), MarkingError> {
        self.begin_edit("mark present")?;
        self.ensure_on_roster(id)?;
        self.present.insert(id);
        Ok(())
    }

    pub fn mark_all_present(&mut self) -> Result<(), MarkingError> {
        self.begin_edit("mark all present")?;
        self.present = self.roster.iter().map(|person| person.id).collect();
        Ok(())
    }

    pub fn mark_all_absent(&mut self) -> Result<(), MarkingError> {
        self.begin_edit("mark all absent")?;
        self.present.clear();
        Ok(())
    }

    fn ensure_on_roster(&self, id: PersonnelId) -> Result<(), MarkingError> {
        if self.roster.iter().any(|person| person.id == id) {
            Ok(())
        } else {
            Err(MarkingError::UnknownPersonnel(id))
        }
    }

    fn begin_edit(&mut self, action: &'static str) -> Result<(), MarkingError> {
        match self.phase {
            MarkingPhase::ClassLoaded | MarkingPhase::Editing | MarkingPhase::Saved => {
                self.phase = MarkingPhase::Editing;
                Ok(())
            }
            phase => Err(MarkingError::InvalidState { action, phase }),
        }
    }

    /// Writes one event per roster member in a single upsert.
    pub fn save(&mut self) -> Result<SaveSummary, MarkingError> {
        let class_id = match (&self.class, self.phase) {
            (
                Some(class),
                MarkingPhase::ClassLoaded | MarkingPhase::Editing | MarkingPhase::Saved,
            ) => class.id,
            (_, phase) => {
                return Err(MarkingError::InvalidState {
                    action: "save attendance",
                    phase,
                })
            }
        };

        let started_at = Instant::now();
        let events: Vec<AttendanceEvent> = self
            .roster
            .iter()
            .map(|person| AttendanceEvent {
                employee_id: person.id,
                daily_class_id: class_id,
                status: AttendanceStatus::from_present(self.present.contains(&person.id)),
            })
            .collect();
        let summary = SaveSummary {
            present: self.present.len(),
            absent: self.roster.len() - self.present.len(),
        };

        if let Err(err) = self.store.upsert_attendance(&events) {
            warn!(
                "event=attendance_save module=marking status=error class_id={} duration_ms={} error={}",
                class_id,
                started_at.elapsed().as_millis(),
                err
            );
            self.phase = MarkingPhase::Editing;
            self.last_error = Some(err.to_string());
            return Err(err.into());
        }

        info!(
            "event=attendance_save module=marking status=ok class_id={} present={} absent={} duration_ms={}",
            class_id,
            summary.present,
            summary.absent,
            started_at.elapsed().as_millis()
        );
        self.phase = MarkingPhase::Saved;
        self.last_error = None;
        Ok(summary)
    }
}
