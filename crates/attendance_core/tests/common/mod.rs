#![allow(dead_code)]

use attendance_core::repo::{
    AttendanceQuery, AttendanceRepository, AttendanceWithClass, ClassQuery, ClassRepository,
    NewTimeSlot, PersonnelQuery, PersonnelRepository, TimeSlotQuery, TimeSlotRepository,
};
use attendance_core::{
    AttendanceEvent, Category, ClassId, ClassInstance, ClassWithSlot, Personnel, PersonnelDraft,
    PersonnelId, RepoError, RepoResult, SqliteStore, TimeSlot, TimeSlotId,
};
use chrono::{NaiveDate, NaiveTime};
use rusqlite::Connection;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;

pub fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

pub fn add_person(store: &SqliteStore<'_>, code: &str, name: &str, category: Category) -> Personnel {
    store
        .insert_personnel(&PersonnelDraft::new(code, name, category))
        .unwrap()
}

pub fn add_slot(store: &SqliteStore<'_>, hh_mm: &str, sort_order: i64) -> TimeSlot {
    store
        .insert_time_slot(&NewTimeSlot {
            time: NaiveTime::parse_from_str(hh_mm, "%H:%M").unwrap(),
            label: None,
            sort_order,
            is_active: true,
        })
        .unwrap()
}

pub fn add_class(store: &SqliteStore<'_>, on: &str, slot: TimeSlotId, name: &str) -> ClassInstance {
    let class = ClassInstance::new(date(on), slot, name).unwrap();
    store.insert_class(&class).unwrap();
    class
}

pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

/// Delegates to SQLite, failing the write paths a test switches on.
pub struct FlakyStore<'conn> {
    pub inner: SqliteStore<'conn>,
    pub fail_upsert: Cell<bool>,
    pub fail_find_classes: Cell<bool>,
    pub fail_inserts_for: RefCell<HashSet<TimeSlotId>>,
}

impl<'conn> FlakyStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            inner: SqliteStore::try_new(conn).unwrap(),
            fail_upsert: Cell::new(false),
            fail_find_classes: Cell::new(false),
            fail_inserts_for: RefCell::new(HashSet::new()),
        }
    }
}

fn injected(what: &str) -> RepoError {
    RepoError::InvalidData(format!("injected failure: {what}"))
}

impl PersonnelRepository for FlakyStore<'_> {
    fn insert_personnel(&self, draft: &PersonnelDraft) -> RepoResult<Personnel> {
        self.inner.insert_personnel(draft)
    }

    fn update_personnel(&self, id: PersonnelId, draft: &PersonnelDraft) -> RepoResult<()> {
        self.inner.update_personnel(id, draft)
    }

    fn set_personnel_active(&self, id: PersonnelId, is_active: bool) -> RepoResult<()> {
        self.inner.set_personnel_active(id, is_active)
    }

    fn delete_personnel(&self, id: PersonnelId) -> RepoResult<()> {
        self.inner.delete_personnel(id)
    }

    fn get_personnel(&self, id: PersonnelId) -> RepoResult<Option<Personnel>> {
        self.inner.get_personnel(id)
    }

    fn list_personnel(&self, query: &PersonnelQuery) -> RepoResult<Vec<Personnel>> {
        self.inner.list_personnel(query)
    }
}

impl TimeSlotRepository for FlakyStore<'_> {
    fn insert_time_slot(&self, slot: &NewTimeSlot) -> RepoResult<TimeSlot> {
        self.inner.insert_time_slot(slot)
    }

    fn set_time_slot_active(&self, id: TimeSlotId, is_active: bool) -> RepoResult<()> {
        self.inner.set_time_slot_active(id, is_active)
    }

    fn delete_time_slot(&self, id: TimeSlotId) -> RepoResult<()> {
        self.inner.delete_time_slot(id)
    }

    fn get_time_slot(&self, id: TimeSlotId) -> RepoResult<Option<TimeSlot>> {
        self.inner.get_time_slot(id)
    }

    fn list_time_slots(&self, query: &TimeSlotQuery) -> RepoResult<Vec<TimeSlot>> {
        self.inner.list_time_slots(query)
    }
}

impl ClassRepository for FlakyStore<'_> {
    fn insert_class(&self, class: &ClassInstance) -> RepoResult<()> {
        if self.fail_inserts_for.borrow().contains(&class.time_slot_id) {
            return Err(injected("insert_class"));
        }
        self.inner.insert_class(class)
    }

    fn rename_class(&self, id: ClassId, class_name: &str) -> RepoResult<()> {
        self.inner.rename_class(id, class_name)
    }

    fn get_class(&self, id: ClassId) -> RepoResult<Option<ClassInstance>> {
        self.inner.get_class(id)
    }

    fn find_classes(&self, query: &ClassQuery) -> RepoResult<Vec<ClassWithSlot>> {
        if self.fail_find_classes.get() {
            return Err(injected("find_classes"));
        }
        self.inner.find_classes(query)
    }
}

impl AttendanceRepository for FlakyStore<'_> {
    fn upsert_attendance(&self, events: &[AttendanceEvent]) -> RepoResult<()> {
        if self.fail_upsert.get() {
            return Err(injected("upsert_attendance"));
        }
        self.inner.upsert_attendance(events)
    }

    fn list_attendance(&self, query: &AttendanceQuery) -> RepoResult<Vec<AttendanceEvent>> {
        self.inner.list_attendance(query)
    }

    fn list_attendance_with_class(
        &self,
        employee_id: PersonnelId,
    ) -> RepoResult<Vec<AttendanceWithClass>> {
        self.inner.list_attendance_with_class(employee_id)
    }
}
