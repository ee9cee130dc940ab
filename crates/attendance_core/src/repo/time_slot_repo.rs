//! Time slot repository contract and SQLite implementation.
//!
//! # Invariants
//! - Listing is ordered by `sort_order ASC`, then `time ASC`, then `id ASC`.
//! - Deleting a slot cascades into its class instances and their attendance.

use crate::model::time_slot::{resolve_slot_label, TimeSlot, TimeSlotId};
use crate::repo::{
    bool_to_int, parse_bool, parse_time, parse_uuid, time_to_db, RepoError, RepoResult,
    SqliteStore,
};
use chrono::NaiveTime;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

const TIME_SLOT_SELECT_SQL: &str = "SELECT
    id,
    time,
    label,
    sort_order,
    is_active
FROM time_slots";

/// Input for inserting a time slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimeSlot {
    pub time: NaiveTime,
    /// `None` renders the label from `time`.
    pub label: Option<String>,
    pub sort_order: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeSlotQuery {
    pub active_only: bool,
}

pub trait TimeSlotRepository {
    fn insert_time_slot(&self, slot: &NewTimeSlot) -> RepoResult<TimeSlot>;
    fn set_time_slot_active(&self, id: TimeSlotId, is_active: bool) -> RepoResult<()>;
    fn delete_time_slot(&self, id: TimeSlotId) -> RepoResult<()>;
    fn get_time_slot(&self, id: TimeSlotId) -> RepoResult<Option<TimeSlot>>;
    fn list_time_slots(&self, query: &TimeSlotQuery) -> RepoResult<Vec<TimeSlot>>;
}

impl TimeSlotRepository for SqliteStore<'_> {
    fn insert_time_slot(&self, slot: &NewTimeSlot) -> RepoResult<TimeSlot> {
        let label = resolve_slot_label(slot.time, slot.label.as_deref())?;
        let created = TimeSlot {
            id: Uuid::new_v4(),
            time: slot.time,
            label,
            sort_order: slot.sort_order,
            is_active: slot.is_active,
        };

        self.conn().execute(
            "INSERT INTO time_slots (id, time, label, sort_order, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                created.id.to_string(),
                time_to_db(created.time),
                created.label.as_str(),
                created.sort_order,
                bool_to_int(created.is_active),
            ],
        )?;

        Ok(created)
    }

    fn set_time_slot_active(&self, id: TimeSlotId, is_active: bool) -> RepoResult<()> {
        let changed = self.conn().execute(
            "UPDATE time_slots SET is_active = ?1 WHERE id = ?2;",
            params![bool_to_int(is_active), id.to_string()],
        )?;
        if changed == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    fn delete_time_slot(&self, id: TimeSlotId) -> RepoResult<()> {
        let changed = self
            .conn()
            .execute("DELETE FROM time_slots WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    fn get_time_slot(&self, id: TimeSlotId) -> RepoResult<Option<TimeSlot>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("{TIME_SLOT_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt
            .query_row([id.to_string()], |row| Ok(parse_time_slot_row(row)))
            .optional()?;
        row.transpose()
    }

    fn list_time_slots(&self, query: &TimeSlotQuery) -> RepoResult<Vec<TimeSlot>> {
        let filter = if query.active_only {
            " WHERE is_active = 1"
        } else {
            ""
        };
        let mut stmt = self.conn().prepare(&format!(
            "{TIME_SLOT_SELECT_SQL}{filter} ORDER BY sort_order ASC, time ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut slots = Vec::new();
        while let Some(row) = rows.next()? {
            slots.push(parse_time_slot_row(row)?);
        }
        Ok(slots)
    }
}

fn parse_time_slot_row(row: &Row<'_>) -> RepoResult<TimeSlot> {
    let id_text: String = row.get("id")?;
    let time_text: String = row.get("time")?;
    Ok(TimeSlot {
        id: parse_uuid(&id_text, "time_slots.id")?,
        time: parse_time(&time_text, "time_slots.time")?,
        label: row.get("label")?,
        sort_order: row.get("sort_order")?,
        is_active: parse_bool(row.get("is_active")?, "time_slots.is_active")?,
    })
}

fn not_found(id: TimeSlotId) -> RepoError {
    RepoError::NotFound {
        entity: "time slot",
        id,
    }
}
