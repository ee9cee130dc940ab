//! Validation errors raised before any store call.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum accepted class name length, in characters, after trimming.
pub const CLASS_NAME_MAX_CHARS: usize = 100;

/// Input rejected by the model layer. Never reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Class name is empty or whitespace-only.
    EmptyClassName,
    /// Class name exceeds [`CLASS_NAME_MAX_CHARS`].
    ClassNameTooLong { chars: usize },
    /// Personnel display code is empty.
    EmptyEmployeeCode,
    /// Personnel name is empty.
    EmptyPersonnelName,
    /// Sub-category supplied for a category other than PC.
    SubCategoryNotAllowed { category: String },
    /// Time slot label is empty.
    EmptySlotLabel,
    /// A workflow step needs a date and a time slot.
    MissingSelection,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyClassName => write!(f, "class name cannot be empty"),
            Self::ClassNameTooLong { chars } => write!(
                f,
                "class name has {chars} characters; maximum is {CLASS_NAME_MAX_CHARS}"
            ),
            Self::EmptyEmployeeCode => write!(f, "employee id cannot be empty"),
            Self::EmptyPersonnelName => write!(f, "personnel name cannot be empty"),
            Self::SubCategoryNotAllowed { category } => {
                write!(f, "sub-category is only allowed for PC, got `{category}`")
            }
            Self::EmptySlotLabel => write!(f, "time slot label cannot be empty"),
            Self::MissingSelection => write!(f, "select both a date and a time slot"),
        }
    }
}

impl Error for ValidationError {}
