//! Personnel model.
//!
//! # Responsibility
//! - Define the tracked individual and its category vocabulary.
//! - Validate roster input before persistence.
//!
//! # Invariants
//! - `employee_id` is the human-visible code and is unique in the store.
//! - `sub_category` is only set when `category == Category::Pc`.
//! - Category text outside the known set is preserved as
//!   `Category::Unrecognized` instead of failing reads.

use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type PersonnelId = Uuid;

/// Personnel category.
///
/// Serialized as its literal token (`RSI`, `ARSI`, `HC`, `PC`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Rsi,
    Arsi,
    Hc,
    Pc,
    /// Persisted value outside the known set. Ranks after every known category.
    Unrecognized(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Rsi => "RSI",
            Self::Arsi => "ARSI",
            Self::Hc => "HC",
            Self::Pc => "PC",
            Self::Unrecognized(raw) => raw.as_str(),
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "RSI" => Self::Rsi,
            "ARSI" => Self::Arsi,
            "HC" => Self::Hc,
            "PC" => Self::Pc,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

/// PC sub-category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubCategory {
    #[serde(rename = "PSO")]
    Pso,
    #[serde(rename = "MT")]
    Mt,
    #[serde(rename = "Staff")]
    Staff,
    #[serde(rename = "STF")]
    Stf,
    #[serde(rename = "General Duty")]
    GeneralDuty,
}

impl SubCategory {
    pub const ALL: [SubCategory; 5] = [
        SubCategory::Pso,
        SubCategory::Mt,
        SubCategory::Staff,
        SubCategory::Stf,
        SubCategory::GeneralDuty,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pso => "PSO",
            Self::Mt => "MT",
            Self::Staff => "Staff",
            Self::Stf => "STF",
            Self::GeneralDuty => "General Duty",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.as_str() == value)
    }
}

/// Persisted personnel record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Personnel {
    pub id: PersonnelId,
    /// Human-visible code, e.g. `PC 10`.
    pub employee_id: String,
    pub name: String,
    pub category: Category,
    pub sub_category: Option<SubCategory>,
    pub is_active: bool,
}

/// Roster input for creating or replacing a personnel record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonnelDraft {
    pub employee_id: String,
    pub name: String,
    pub category: Category,
    pub sub_category: Option<SubCategory>,
    pub is_active: bool,
}

impl PersonnelDraft {
    pub fn new(
        employee_id: impl Into<String>,
        name: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            employee_id: employee_id.into(),
            name: name.into(),
            category,
            sub_category: None,
            is_active: true,
        }
    }

    pub fn with_sub_category(mut self, sub_category: SubCategory) -> Self {
        self.sub_category = Some(sub_category);
        self
    }

    /// Returns a trimmed copy, rejecting blank fields and misplaced sub-categories.
    pub fn validated(&self) -> Result<Self, ValidationError> {
        let employee_id = self.employee_id.trim();
        if employee_id.is_empty() {
            return Err(ValidationError::EmptyEmployeeCode);
        }
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyPersonnelName);
        }
        if self.sub_category.is_some() && self.category != Category::Pc {
            return Err(ValidationError::SubCategoryNotAllowed {
                category: self.category.to_string(),
            });
        }

        Ok(Self {
            employee_id: employee_id.to_string(),
            name: name.to_string(),
            category: self.category.clone(),
            sub_category: self.sub_category,
            is_active: self.is_active,
        })
    }

    /// Materializes the draft into a record with the given id.
    pub fn into_personnel(self, id: PersonnelId) -> Personnel {
        Personnel {
            id,
            employee_id: self.employee_id,
            name: self.name,
            category: self.category,
            sub_category: self.sub_category,
            is_active: self.is_active,
        }
    }
}
