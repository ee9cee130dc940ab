//! Class-name search summary.
//!
//! # Invariants
//! - A blank query performs no store call and reports `NotSearched`.
//! - A query with no matching class reports `NoMatches`, distinct from
//!   `NotSearched`.
//! - Matches are ordered by class date descending.

use crate::report::{tally_classes, ClassTally};
use crate::repo::{ClassQuery, DateOrder, RecordStore, RepoResult};
use log::debug;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "classes", rename_all = "snake_case")]
pub enum ClassSearchOutcome {
    #[default]
    NotSearched,
    NoMatches,
    Matches(Vec<ClassTally>),
}

impl ClassSearchOutcome {
    pub fn rows(&self) -> &[ClassTally] {
        match self {
            Self::Matches(rows) => rows,
            Self::NotSearched | Self::NoMatches => &[],
        }
    }
}

/// Case-insensitive substring search on class names with per-class tallies.
pub fn search_classes<S: RecordStore + ?Sized>(
    store: &S,
    query: &str,
) -> RepoResult<ClassSearchOutcome> {
    let needle = query.trim();
    if needle.is_empty() {
        return Ok(ClassSearchOutcome::NotSearched);
    }

    let classes = store.find_classes(&ClassQuery {
        name_contains: Some(needle.to_string()),
        order: DateOrder::Descending,
        ..ClassQuery::default()
    })?;
    debug!(
        "event=report_class_search module=report status=ok matches={}",
        classes.len()
    );
    if classes.is_empty() {
        return Ok(ClassSearchOutcome::NoMatches);
    }

    Ok(ClassSearchOutcome::Matches(tally_classes(store, classes)?))
}
