//! Attendance event model.
//!
//! # Invariants
//! - At most one event per `(employee_id, daily_class_id)`.
//! - A missing event means "unmarked", which is distinct from `Absent`.

use crate::model::class_instance::ClassId;
use crate::model::personnel::PersonnelId;
use serde::{Deserialize, Serialize};

/// Explicit attendance status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "present" => Some(Self::Present),
            "absent" => Some(Self::Absent),
            _ => None,
        }
    }

    pub fn from_present(is_present: bool) -> Self {
        if is_present {
            Self::Present
        } else {
            Self::Absent
        }
    }
}

/// One personnel's status for one class instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEvent {
    pub employee_id: PersonnelId,
    pub daily_class_id: ClassId,
    pub status: AttendanceStatus,
}

/// Present/absent tally shared by the per-class summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub present: u32,
    pub absent: u32,
}

impl StatusCounts {
    pub fn record(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Absent => self.absent += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.present + self.absent
    }
}
