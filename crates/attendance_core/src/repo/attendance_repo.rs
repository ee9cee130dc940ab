//! Attendance event repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Batch upsert keyed on `(employee_id, daily_class_id)`.
//! - Filtered reads by employee and by class-id set.
//! - Employee history joined with class and slot (one-level expansion).
//!
//! # Invariants
//! - `upsert_attendance` is all-or-nothing and idempotent: replaying the same
//!   batch leaves the table unchanged apart from `updated_at`.
//! - Unknown status text in storage is rejected as `InvalidData`.

use crate::model::attendance::{AttendanceEvent, AttendanceStatus};
use crate::model::class_instance::ClassId;
use crate::model::personnel::PersonnelId;
use crate::repo::{parse_date, parse_uuid, RepoError, RepoResult, SqliteStore};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};

/// Bound parameters per `IN (...)` query.
const CLASS_ID_CHUNK: usize = 500;

/// Filters for reading raw attendance events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceQuery {
    pub employee_id: Option<PersonnelId>,
    /// `Some(empty)` matches nothing.
    pub class_ids: Option<Vec<ClassId>>,
}

impl AttendanceQuery {
    pub fn for_classes(class_ids: Vec<ClassId>) -> Self {
        Self {
            employee_id: None,
            class_ids: Some(class_ids),
        }
    }
}

/// Attendance event expanded with its class and slot.
///
/// Join fields are `None` when the referenced row no longer exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceWithClass {
    pub daily_class_id: ClassId,
    pub status: AttendanceStatus,
    pub class_date: Option<NaiveDate>,
    pub class_name: Option<String>,
    pub slot_label: Option<String>,
}

pub trait AttendanceRepository {
    fn upsert_attendance(&self, events: &[AttendanceEvent]) -> RepoResult<()>;
    fn list_attendance(&self, query: &AttendanceQuery) -> RepoResult<Vec<AttendanceEvent>>;
    /// Newest-first by record creation.
    fn list_attendance_with_class(
        &self,
        employee_id: PersonnelId,
    ) -> RepoResult<Vec<AttendanceWithClass>>;
}

impl AttendanceRepository for SqliteStore<'_> {
    fn upsert_attendance(&self, events: &[AttendanceEvent]) -> RepoResult<()> {
        if events.is_empty() {
            return Ok(());
        }

        let tx = self.conn().unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO attendance (employee_id, daily_class_id, status)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (employee_id, daily_class_id) DO UPDATE SET
                    status = excluded.status,
                    updated_at = (strftime('%s', 'now') * 1000);",
            )?;
            for event in events {
                stmt.execute(params![
                    event.employee_id.to_string(),
                    event.daily_class_id.to_string(),
                    event.status.as_str(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn list_attendance(&self, query: &AttendanceQuery) -> RepoResult<Vec<AttendanceEvent>> {
        let base = "SELECT employee_id, daily_class_id, status FROM attendance WHERE 1 = 1";
        let employee_filter = query.employee_id.map(|id| Value::Text(id.to_string()));

        let Some(class_ids) = &query.class_ids else {
            return self.query_events(base, employee_filter, &[]);
        };

        let mut events = Vec::new();
        for chunk in class_ids.chunks(CLASS_ID_CHUNK) {
            events.extend(self.query_events(base, employee_filter.clone(), chunk)?);
        }
        Ok(events)
    }

    fn list_attendance_with_class(
        &self,
        employee_id: PersonnelId,
    ) -> RepoResult<Vec<AttendanceWithClass>> {
        let mut stmt = self.conn().prepare(
            "SELECT
                a.daily_class_id AS daily_class_id,
                a.status AS status,
                c.class_date AS class_date,
                c.class_name AS class_name,
                s.label AS slot_label
             FROM attendance a
             LEFT JOIN daily_classes c ON c.id = a.daily_class_id
             LEFT JOIN time_slots s ON s.id = c.time_slot_id
             WHERE a.employee_id = ?1
             ORDER BY a.created_at DESC, a.daily_class_id ASC;",
        )?;
        let mut rows = stmt.query([employee_id.to_string()])?;
        let mut history = Vec::new();
        while let Some(row) = rows.next()? {
            let class_text: String = row.get("daily_class_id")?;
            let class_date = match row.get::<_, Option<String>>("class_date")? {
                Some(text) => Some(parse_date(&text, "daily_classes.class_date")?),
                None => None,
            };
            history.push(AttendanceWithClass {
                daily_class_id: parse_uuid(&class_text, "attendance.daily_class_id")?,
                status: parse_status(row)?,
                class_date,
                class_name: row.get("class_name")?,
                slot_label: row.get("slot_label")?,
            });
        }
        Ok(history)
    }
}

impl SqliteStore<'_> {
    fn query_events(
        &self,
        base: &str,
        employee_filter: Option<Value>,
        class_ids: &[ClassId],
    ) -> RepoResult<Vec<AttendanceEvent>> {
        let mut sql = base.to_string();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(employee) = employee_filter {
            sql.push_str(" AND employee_id = ?");
            bind_values.push(employee);
        }
        if !class_ids.is_empty() {
            let placeholders = vec!["?"; class_ids.len()].join(", ");
            sql.push_str(&format!(" AND daily_class_id IN ({placeholders})"));
            bind_values.extend(class_ids.iter().map(|id| Value::Text(id.to_string())));
        }
        sql.push_str(" ORDER BY daily_class_id ASC, employee_id ASC");

        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            let employee_text: String = row.get("employee_id")?;
            let class_text: String = row.get("daily_class_id")?;
            events.push(AttendanceEvent {
                employee_id: parse_uuid(&employee_text, "attendance.employee_id")?,
                daily_class_id: parse_uuid(&class_text, "attendance.daily_class_id")?,
                status: parse_status(row)?,
            });
        }
        Ok(events)
    }
}

fn parse_status(row: &Row<'_>) -> RepoResult<AttendanceStatus> {
    let status_text: String = row.get("status")?;
    AttendanceStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in attendance.status"))
    })
}
