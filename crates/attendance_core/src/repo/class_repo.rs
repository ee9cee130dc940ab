//! Class instance repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Create, rename and query class instances.
//! - Expand each class with its time slot label (one-level join).
//!
//! # Invariants
//! - `(class_date, time_slot_id)` is unique; a second insert for the same
//!   pair fails with `RepoError::Conflict`.
//! - A class whose slot row is missing is still returned, with an empty label.
//! - Name search is a Unicode case-insensitive substring match; `%`, `_` and
//!   `\` in the query are matched literally.

use crate::db::{fold_case, FOLD_CASE_SQL};
use crate::model::class_instance::{normalize_class_name, ClassId, ClassInstance, ClassWithSlot};
use crate::model::time_slot::TimeSlotId;
use crate::repo::{
    date_to_db, map_write_error, parse_date, parse_uuid, RepoError, RepoResult, SqliteStore,
};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};

const CLASS_SELECT_SQL: &str = "SELECT
    c.id AS id,
    c.class_date AS class_date,
    c.time_slot_id AS time_slot_id,
    c.class_name AS class_name,
    s.label AS slot_label
FROM daily_classes c
LEFT JOIN time_slots s ON s.id = c.time_slot_id";

/// Sort direction on `class_date`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateOrder {
    #[default]
    Ascending,
    Descending,
}

/// Filters for class lookups. All set filters must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassQuery {
    pub class_date: Option<NaiveDate>,
    pub time_slot_id: Option<TimeSlotId>,
    /// Case-insensitive substring on `class_name`.
    pub name_contains: Option<String>,
    pub order: DateOrder,
}

pub trait ClassRepository {
    fn insert_class(&self, class: &ClassInstance) -> RepoResult<()>;
    fn rename_class(&self, id: ClassId, class_name: &str) -> RepoResult<()>;
    fn get_class(&self, id: ClassId) -> RepoResult<Option<ClassInstance>>;
    fn find_classes(&self, query: &ClassQuery) -> RepoResult<Vec<ClassWithSlot>>;

    /// Resolves the class held on `date` in `slot`, if any.
    fn find_class_for_slot(
        &self,
        date: NaiveDate,
        slot: TimeSlotId,
    ) -> RepoResult<Option<ClassInstance>> {
        let mut matches = self.find_classes(&ClassQuery {
            class_date: Some(date),
            time_slot_id: Some(slot),
            ..ClassQuery::default()
        })?;
        if matches.len() > 1 {
            return Err(RepoError::InvalidData(format!(
                "{} classes share date {date} and slot {slot}",
                matches.len()
            )));
        }
        Ok(matches.pop().map(|found| found.class))
    }
}

impl ClassRepository for SqliteStore<'_> {
    fn insert_class(&self, class: &ClassInstance) -> RepoResult<()> {
        let class_name = normalize_class_name(&class.class_name)?;

        self.conn()
            .execute(
                "INSERT INTO daily_classes (id, class_date, time_slot_id, class_name)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    class.id.to_string(),
                    date_to_db(class.class_date),
                    class.time_slot_id.to_string(),
                    class_name,
                ],
            )
            .map_err(|err| {
                map_write_error(err, || {
                    format!(
                        "a class already exists on {} for slot {}",
                        class.class_date, class.time_slot_id
                    )
                })
            })?;
        Ok(())
    }

    fn rename_class(&self, id: ClassId, class_name: &str) -> RepoResult<()> {
        let class_name = normalize_class_name(class_name)?;
        let changed = self.conn().execute(
            "UPDATE daily_classes SET class_name = ?1 WHERE id = ?2;",
            params![class_name, id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "class",
                id,
            });
        }
        Ok(())
    }

    fn get_class(&self, id: ClassId) -> RepoResult<Option<ClassInstance>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("{CLASS_SELECT_SQL} WHERE c.id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_class_row(row)?.class));
        }
        Ok(None)
    }

    fn find_classes(&self, query: &ClassQuery) -> RepoResult<Vec<ClassWithSlot>> {
        let mut sql = format!("{CLASS_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(date) = query.class_date {
            sql.push_str(" AND c.class_date = ?");
            bind_values.push(Value::Text(date_to_db(date)));
        }
        if let Some(slot) = query.time_slot_id {
            sql.push_str(" AND c.time_slot_id = ?");
            bind_values.push(Value::Text(slot.to_string()));
        }
        if let Some(needle) = query.name_contains.as_deref() {
            sql.push_str(&format!(
                " AND {FOLD_CASE_SQL}(c.class_name) LIKE ? ESCAPE '\\'"
            ));
            bind_values.push(Value::Text(like_contains_pattern(needle)));
        }

        match query.order {
            DateOrder::Ascending => sql.push_str(" ORDER BY c.class_date ASC"),
            DateOrder::Descending => sql.push_str(" ORDER BY c.class_date DESC"),
        }
        sql.push_str(", s.sort_order ASC, c.id ASC");

        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut classes = Vec::new();
        while let Some(row) = rows.next()? {
            classes.push(parse_class_row(row)?);
        }
        Ok(classes)
    }
}

fn parse_class_row(row: &Row<'_>) -> RepoResult<ClassWithSlot> {
    let id_text: String = row.get("id")?;
    let date_text: String = row.get("class_date")?;
    let slot_text: String = row.get("time_slot_id")?;

    Ok(ClassWithSlot {
        class: ClassInstance {
            id: parse_uuid(&id_text, "daily_classes.id")?,
            class_date: parse_date(&date_text, "daily_classes.class_date")?,
            time_slot_id: parse_uuid(&slot_text, "daily_classes.time_slot_id")?,
            class_name: row.get("class_name")?,
        },
        slot_label: row
            .get::<_, Option<String>>("slot_label")?
            .unwrap_or_default(),
    })
}

fn like_contains_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in fold_case(needle).chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
