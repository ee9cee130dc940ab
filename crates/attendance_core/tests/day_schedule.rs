mod common;

use attendance_core::db::open_db_in_memory;
use attendance_core::repo::{ClassRepository, TimeSlotRepository};
use attendance_core::{
    load_day_schedule, save_day_schedule, ScheduleError, SlotOutcome, SqliteStore,
};
use common::{add_class, add_slot, count_rows, date, FlakyStore};
use std::collections::HashMap;

#[test]
fn load_lists_every_active_slot_with_its_class() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let first = add_slot(&store, "07:00", 1);
    let second = add_slot(&store, "09:00", 2);
    let hidden = add_slot(&store, "11:00", 3);
    store.set_time_slot_active(hidden.id, false).unwrap();
    add_class(&store, "2024-01-10", second.id, "Parade");

    let schedule = load_day_schedule(&store, date("2024-01-10")).unwrap();

    assert_eq!(schedule.len(), 2);
    assert_eq!(schedule[0].slot.id, first.id);
    assert!(schedule[0].class.is_none());
    assert_eq!(schedule[1].slot.id, second.id);
    assert_eq!(
        schedule[1].class.as_ref().map(|c| c.class_name.as_str()),
        Some("Parade")
    );
}

#[test]
fn save_creates_renames_skips_and_leaves_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let create = add_slot(&store, "07:00", 1);
    let rename = add_slot(&store, "09:00", 2);
    let same = add_slot(&store, "11:00", 3);
    let skip = add_slot(&store, "13:00", 4);
    let renamed = add_class(&store, "2024-01-10", rename.id, "Drill");
    let kept = add_class(&store, "2024-01-10", same.id, "Parade");

    let names = HashMap::from([
        (create.id, "PT".to_string()),
        (rename.id, "Fire Drill".to_string()),
        (same.id, " Parade ".to_string()),
        (skip.id, "   ".to_string()),
    ]);
    let results = save_day_schedule(&store, date("2024-01-10"), &names).unwrap();

    assert_eq!(results.len(), 4);
    assert!(matches!(results[0].outcome, SlotOutcome::Created(_)));
    assert_eq!(results[1].outcome, SlotOutcome::Renamed(renamed.id));
    assert_eq!(results[2].outcome, SlotOutcome::Unchanged(kept.id));
    assert_eq!(results[3].outcome, SlotOutcome::Skipped);
    assert_eq!(results[3].slot_label, "01:00 PM");

    let created = store
        .find_class_for_slot(date("2024-01-10"), create.id)
        .unwrap()
        .unwrap();
    assert_eq!(created.class_name, "PT");
    assert_eq!(
        store.get_class(renamed.id).unwrap().unwrap().class_name,
        "Fire Drill"
    );
    assert_eq!(count_rows(&conn, "daily_classes"), 3);
}

#[test]
fn failed_slot_does_not_stop_or_roll_back_the_others() {
    let conn = open_db_in_memory().unwrap();
    let seed = SqliteStore::try_new(&conn).unwrap();
    let first = add_slot(&seed, "07:00", 1);
    let broken = add_slot(&seed, "09:00", 2);
    let last = add_slot(&seed, "11:00", 3);

    let store = FlakyStore::new(&conn);
    store.fail_inserts_for.borrow_mut().insert(broken.id);
    let names = HashMap::from([
        (first.id, "PT".to_string()),
        (broken.id, "Drill".to_string()),
        (last.id, "Parade".to_string()),
    ]);

    let err = save_day_schedule(&store, date("2024-01-10"), &names).unwrap_err();
    let batch = match err {
        ScheduleError::PartialBatch(batch) => batch,
        other => panic!("expected a partial batch error, got {other}"),
    };

    assert_eq!(batch.results.len(), 3);
    let failed: Vec<_> = batch.failures().map(|result| result.slot_id).collect();
    assert_eq!(failed, vec![broken.id]);
    assert!(matches!(batch.results[0].outcome, SlotOutcome::Created(_)));
    assert!(matches!(batch.results[2].outcome, SlotOutcome::Created(_)));
    assert!(batch.to_string().contains("1 of 3 slots failed"));
    assert_eq!(count_rows(&conn, "daily_classes"), 2);
}

#[test]
fn over_long_name_fails_only_its_slot() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let ok = add_slot(&store, "07:00", 1);
    let bad = add_slot(&store, "09:00", 2);

    let names = HashMap::from([(ok.id, "PT".to_string()), (bad.id, "x".repeat(101))]);
    let err = save_day_schedule(&store, date("2024-01-10"), &names).unwrap_err();

    let batch = match err {
        ScheduleError::PartialBatch(batch) => batch,
        other => panic!("expected a partial batch error, got {other}"),
    };
    assert!(batch.results[1].is_failure());
    assert!(!batch.results[0].is_failure());
    assert_eq!(count_rows(&conn, "daily_classes"), 1);
}

#[test]
fn lookup_failure_aborts_before_any_write() {
    let conn = open_db_in_memory().unwrap();
    let seed = SqliteStore::try_new(&conn).unwrap();
    let slot = add_slot(&seed, "07:00", 1);

    let store = FlakyStore::new(&conn);
    store.fail_find_classes.set(true);
    let names = HashMap::from([(slot.id, "PT".to_string())]);

    let err = save_day_schedule(&store, date("2024-01-10"), &names).unwrap_err();
    assert!(matches!(err, ScheduleError::Store(_)));
    assert_eq!(count_rows(&conn, "daily_classes"), 0);
}
