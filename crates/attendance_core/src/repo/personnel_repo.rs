//! Personnel repository contract and SQLite implementation.
//!
//! # Invariants
//! - `employee_id` codes are unique; duplicates map to `RepoError::Conflict`.
//! - Deleting a personnel row cascades into its attendance events
//!   (enforced by the schema).
//! - Listing order is storage order only; callers rank with
//!   [`crate::ranking::rank_personnel`].

use crate::model::personnel::{Category, Personnel, PersonnelDraft, PersonnelId, SubCategory};
use crate::repo::{
    bool_to_int, map_write_error, parse_bool, parse_uuid, RepoError, RepoResult, SqliteStore,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use uuid::Uuid;

const PERSONNEL_SELECT_SQL: &str = "SELECT
    id,
    employee_id,
    name,
    category,
    sub_category,
    is_active
FROM personnel";

/// Equality filters for listing personnel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonnelQuery {
    pub is_active: Option<bool>,
    pub category: Option<Category>,
}

impl PersonnelQuery {
    pub fn active() -> Self {
        Self {
            is_active: Some(true),
            ..Self::default()
        }
    }
}

pub trait PersonnelRepository {
    fn insert_personnel(&self, draft: &PersonnelDraft) -> RepoResult<Personnel>;
    fn update_personnel(&self, id: PersonnelId, draft: &PersonnelDraft) -> RepoResult<()>;
    fn set_personnel_active(&self, id: PersonnelId, is_active: bool) -> RepoResult<()>;
    fn delete_personnel(&self, id: PersonnelId) -> RepoResult<()>;
    fn get_personnel(&self, id: PersonnelId) -> RepoResult<Option<Personnel>>;
    fn list_personnel(&self, query: &PersonnelQuery) -> RepoResult<Vec<Personnel>>;
}

impl PersonnelRepository for SqliteStore<'_> {
    fn insert_personnel(&self, draft: &PersonnelDraft) -> RepoResult<Personnel> {
        let draft = draft.validated()?;
        let personnel = draft.into_personnel(Uuid::new_v4());

        self.conn()
            .execute(
                "INSERT INTO personnel (
                    id,
                    employee_id,
                    name,
                    category,
                    sub_category,
                    is_active
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    personnel.id.to_string(),
                    personnel.employee_id.as_str(),
                    personnel.name.as_str(),
                    personnel.category.as_str(),
                    personnel.sub_category.map(SubCategory::as_str),
                    bool_to_int(personnel.is_active),
                ],
            )
            .map_err(|err| {
                map_write_error(err, || {
                    format!("employee id `{}` already exists", personnel.employee_id)
                })
            })?;

        Ok(personnel)
    }

    fn update_personnel(&self, id: PersonnelId, draft: &PersonnelDraft) -> RepoResult<()> {
        let draft = draft.validated()?;

        let changed = self
            .conn()
            .execute(
                "UPDATE personnel
                 SET
                    employee_id = ?1,
                    name = ?2,
                    category = ?3,
                    sub_category = ?4,
                    is_active = ?5
                 WHERE id = ?6;",
                params![
                    draft.employee_id.as_str(),
                    draft.name.as_str(),
                    draft.category.as_str(),
                    draft.sub_category.map(SubCategory::as_str),
                    bool_to_int(draft.is_active),
                    id.to_string(),
                ],
            )
            .map_err(|err| {
                map_write_error(err, || {
                    format!("employee id `{}` already exists", draft.employee_id)
                })
            })?;

        if changed == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    fn set_personnel_active(&self, id: PersonnelId, is_active: bool) -> RepoResult<()> {
        let changed = self.conn().execute(
            "UPDATE personnel SET is_active = ?1 WHERE id = ?2;",
            params![bool_to_int(is_active), id.to_string()],
        )?;
        if changed == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    fn delete_personnel(&self, id: PersonnelId) -> RepoResult<()> {
        let changed = self
            .conn()
            .execute("DELETE FROM personnel WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    fn get_personnel(&self, id: PersonnelId) -> RepoResult<Option<Personnel>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("{PERSONNEL_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt
            .query_row([id.to_string()], |row| Ok(parse_personnel_row(row)))
            .optional()?;
        row.transpose()
    }

    fn list_personnel(&self, query: &PersonnelQuery) -> RepoResult<Vec<Personnel>> {
        let mut sql = format!("{PERSONNEL_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(is_active) = query.is_active {
            sql.push_str(" AND is_active = ?");
            bind_values.push(Value::Integer(bool_to_int(is_active)));
        }
        if let Some(category) = &query.category {
            sql.push_str(" AND category = ?");
            bind_values.push(Value::Text(category.as_str().to_string()));
        }
        sql.push_str(" ORDER BY employee_id ASC, id ASC");

        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut personnel = Vec::new();
        while let Some(row) = rows.next()? {
            personnel.push(parse_personnel_row(row)?);
        }
        Ok(personnel)
    }
}

fn parse_personnel_row(row: &Row<'_>) -> RepoResult<Personnel> {
    let id_text: String = row.get("id")?;
    let category_text: String = row.get("category")?;
    let sub_category = match row.get::<_, Option<String>>("sub_category")? {
        Some(value) => Some(SubCategory::parse(&value).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid sub category `{value}` in personnel.sub_category"
            ))
        })?),
        None => None,
    };

    Ok(Personnel {
        id: parse_uuid(&id_text, "personnel.id")?,
        employee_id: row.get("employee_id")?,
        name: row.get("name")?,
        category: Category::parse(&category_text),
        sub_category,
        is_active: parse_bool(row.get("is_active")?, "personnel.is_active")?,
    })
}

fn not_found(id: PersonnelId) -> RepoError {
    RepoError::NotFound {
        entity: "personnel",
        id,
    }
}
