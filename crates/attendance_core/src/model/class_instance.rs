//! Class instance model: one class held on one date in one time slot.
//!
//! # Invariants
//! - `class_name` is trimmed, non-empty and at most 100 characters.
//! - `(class_date, time_slot_id)` is a natural key; the store rejects a
//!   second instance for the same pair.

use crate::model::time_slot::TimeSlotId;
use crate::model::validation::{ValidationError, CLASS_NAME_MAX_CHARS};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ClassId = Uuid;

/// Persisted class instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInstance {
    pub id: ClassId,
    pub class_date: NaiveDate,
    pub time_slot_id: TimeSlotId,
    pub class_name: String,
}

impl ClassInstance {
    /// Builds a new instance with a fresh id after validating the name.
    pub fn new(
        class_date: NaiveDate,
        time_slot_id: TimeSlotId,
        class_name: &str,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id: Uuid::new_v4(),
            class_date,
            time_slot_id,
            class_name: normalize_class_name(class_name)?,
        })
    }
}

/// Class instance joined with its time slot label.
///
/// `slot_label` is empty when the slot row is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassWithSlot {
    pub class: ClassInstance,
    pub slot_label: String,
}

/// Trims and checks a user-supplied class name.
pub fn normalize_class_name(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyClassName);
    }
    let chars = trimmed.chars().count();
    if chars > CLASS_NAME_MAX_CHARS {
        return Err(ValidationError::ClassNameTooLong { chars });
    }
    Ok(trimmed.to_string())
}
