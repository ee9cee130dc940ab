//! Time slot model: a recurring period of the day.
//!
//! # Invariants
//! - `sort_order` defines column order in every report.
//! - `label` is never empty; a missing label defaults to the 12-hour
//!   rendering of `time`.

use crate::model::validation::ValidationError;
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TimeSlotId = Uuid;

/// Persisted time slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: TimeSlotId,
    pub time: NaiveTime,
    pub label: String,
    pub sort_order: i64,
    pub is_active: bool,
}

/// Renders a wall-clock time as `hh:mm AM|PM`.
pub fn default_slot_label(time: NaiveTime) -> String {
    let (is_pm, hour) = time.hour12();
    let suffix = if is_pm { "PM" } else { "AM" };
    format!("{hour:02}:{:02} {suffix}", time.minute())
}

/// Resolves the label for a new slot from optional user input.
pub fn resolve_slot_label(time: NaiveTime, label: Option<&str>) -> Result<String, ValidationError> {
    match label {
        None => Ok(default_slot_label(time)),
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(ValidationError::EmptySlotLabel);
            }
            Ok(trimmed.to_string())
        }
    }
}
