//! Roster use-case service for personnel and time slots.
//!
//! # Responsibility
//! - Provide ranked, filterable personnel listings.
//! - Wrap roster CRUD with the ordering rules the reports depend on.
//!
//! # Invariants
//! - Personnel listings are always in canonical rank order.
//! - New time slots are appended after the current maximum `sort_order`.

use crate::model::personnel::{Category, Personnel, PersonnelDraft, PersonnelId};
use crate::model::time_slot::{TimeSlot, TimeSlotId};
use crate::ranking::rank_personnel;
use crate::repo::{
    NewTimeSlot, PersonnelQuery, PersonnelRepository, RepoError, RepoResult, TimeSlotQuery,
    TimeSlotRepository,
};
use chrono::NaiveTime;
use log::info;

/// Filters for the roster listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterFilter {
    /// Case-insensitive substring over employee code or name.
    pub search: Option<String>,
    pub category: Option<Category>,
    pub include_inactive: bool,
}

/// Use-case service wrapper for roster management.
pub struct RosterService<R: PersonnelRepository + TimeSlotRepository> {
    repo: R,
}

impl<R: PersonnelRepository + TimeSlotRepository> RosterService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists personnel matching `filter` in canonical order.
    pub fn list_personnel(&self, filter: &RosterFilter) -> RepoResult<Vec<Personnel>> {
        let query = PersonnelQuery {
            is_active: (!filter.include_inactive).then_some(true),
            category: filter.category.clone(),
        };
        let needle = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_lowercase);

        let matching: Vec<Personnel> = self
            .repo
            .list_personnel(&query)?
            .into_iter()
            .filter(|person| match &needle {
                Some(needle) => {
                    person.employee_id.to_lowercase().contains(needle)
                        || person.name.to_lowercase().contains(needle)
                }
                None => true,
            })
            .collect();

        Ok(rank_personnel(&matching))
    }

    pub fn create_personnel(&self, draft: &PersonnelDraft) -> RepoResult<Personnel> {
        let created = self.repo.insert_personnel(draft)?;
        info!(
            "event=personnel_create module=roster status=ok personnel_id={} category={}",
            created.id, created.category
        );
        Ok(created)
    }

    pub fn update_personnel(&self, id: PersonnelId, draft: &PersonnelDraft) -> RepoResult<()> {
        self.repo.update_personnel(id, draft)
    }

    pub fn set_personnel_active(&self, id: PersonnelId, is_active: bool) -> RepoResult<()> {
        self.repo.set_personnel_active(id, is_active)
    }

    /// Deletes a personnel record; the store drops its attendance events.
    pub fn delete_personnel(&self, id: PersonnelId) -> RepoResult<()> {
        self.repo.delete_personnel(id)?;
        info!("event=personnel_delete module=roster status=ok personnel_id={id}");
        Ok(())
    }

    pub fn list_time_slots(&self, include_inactive: bool) -> RepoResult<Vec<TimeSlot>> {
        self.repo.list_time_slots(&TimeSlotQuery {
            active_only: !include_inactive,
        })
    }

    /// Adds an active slot after every existing one.
    ///
    /// A `None` label renders `time` as `hh:mm AM|PM`.
    pub fn add_time_slot(&self, time: NaiveTime, label: Option<&str>) -> RepoResult<TimeSlot> {
        let max_order = self
            .repo
            .list_time_slots(&TimeSlotQuery::default())?
            .iter()
            .map(|slot| slot.sort_order)
            .fold(0, i64::max);

        let created = self.repo.insert_time_slot(&NewTimeSlot {
            time,
            label: label.map(str::to_string),
            sort_order: max_order + 1,
            is_active: true,
        })?;
        info!(
            "event=time_slot_create module=roster status=ok slot_id={} sort_order={}",
            created.id, created.sort_order
        );
        Ok(created)
    }

    /// Flips `is_active`; returns the new value.
    pub fn toggle_time_slot(&self, id: TimeSlotId) -> RepoResult<bool> {
        let slot = self
            .repo
            .get_time_slot(id)?
            .ok_or(RepoError::NotFound {
                entity: "time slot",
                id,
            })?;
        let is_active = !slot.is_active;
        self.repo.set_time_slot_active(id, is_active)?;
        Ok(is_active)
    }

    /// Deletes a slot together with its classes and their attendance.
    pub fn delete_time_slot(&self, id: TimeSlotId) -> RepoResult<()> {
        self.repo.delete_time_slot(id)?;
        info!("event=time_slot_delete module=roster status=ok slot_id={id}");
        Ok(())
    }
}
