//! Attendance domain model.
//!
//! # Responsibility
//! - Define the four persisted collections: personnel, time slots, class
//!   instances and attendance events.
//! - Keep category/status vocabularies as closed enumerations.
//!
//! # Invariants
//! - Every record is identified by a store-assigned UUID handle.
//! - `(class_date, time_slot_id)` identifies at most one class instance.
//! - `(employee_id, daily_class_id)` identifies at most one attendance event.

pub mod attendance;
pub mod class_instance;
pub mod personnel;
pub mod time_slot;
pub mod validation;
