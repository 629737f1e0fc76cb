use chrono::NaiveDate;
use tether_core::domain::LogId;
use tether_store::error::StoreErrorKind;
use tether_store::repo::{ContactNew, LogUpdate};
use tether_store::Store;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn store_with_contact(name: &str) -> (Store, tether_core::domain::Contact) {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");
    let contact = store
        .contacts()
        .create(
            1_700_000_000,
            ContactNew {
                name: name.to_string(),
                telegram: None,
                phone: None,
                birthday: None,
            },
        )
        .expect("create contact");
    (store, contact)
}

#[test]
fn sequence_numbers_count_up_per_contact() {
    let (store, ann) = store_with_contact("Ann");
    let bob = store
        .contacts()
        .create(
            1_700_000_001,
            ContactNew {
                name: "Bob".to_string(),
                telegram: None,
                phone: None,
                birthday: None,
            },
        )
        .expect("create Bob");

    let first = store
        .logs()
        .add(1_700_000_010, ann.id, day(2024, 1, 1), "coffee")
        .expect("first log");
    let second = store
        .logs()
        .add(1_700_000_020, ann.id, day(2024, 1, 2), "call")
        .expect("second log");
    let other = store
        .logs()
        .add(1_700_000_030, bob.id, day(2024, 1, 3), "walk")
        .expect("bob log");

    assert_eq!(first.seq, 1);
    assert_eq!(second.seq, 2);
    assert_eq!(other.seq, 1);

    let by_seq = store
        .logs()
        .get_by_seq(ann.id, 2)
        .expect("get by seq")
        .expect("exists");
    assert_eq!(by_seq.id, second.id);
}

#[test]
fn history_is_ordered_oldest_first() {
    let (store, ann) = store_with_contact("Ann");

    store
        .logs()
        .add(1_700_000_010, ann.id, day(2024, 2, 1), "later")
        .expect("log");
    store
        .logs()
        .add(1_700_000_020, ann.id, day(2024, 1, 1), "earlier")
        .expect("log");
    store
        .logs()
        .add(1_700_000_030, ann.id, day(2024, 2, 1), "same day, after")
        .expect("log");

    let history = store.logs().list_for_contact(ann.id).expect("history");
    let texts: Vec<&str> = history.iter().map(|entry| entry.text.as_str()).collect();
    assert_eq!(texts, vec!["earlier", "later", "same day, after"]);
}

#[test]
fn empty_text_only_through_the_empty_marker() {
    let (store, ann) = store_with_contact("Ann");

    let err = store
        .logs()
        .add(1_700_000_010, ann.id, day(2024, 1, 1), "  ")
        .expect_err("blank text rejected");
    assert_eq!(err.kind(), StoreErrorKind::Core);

    let marker = store
        .logs()
        .add_empty(1_700_000_020, ann.id, day(2024, 1, 1))
        .expect("empty marker");
    assert!(marker.is_empty_marker());
    assert_eq!(marker.seq, 1);
}

#[test]
fn log_for_unknown_contact_is_not_found() {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");

    let err = store
        .logs()
        .add(
            1_700_000_010,
            tether_core::domain::ContactId::new(),
            day(2024, 1, 1),
            "ghost",
        )
        .expect_err("unknown contact");
    assert_eq!(err.kind(), StoreErrorKind::NotFound);
}

#[test]
fn edit_text_and_date() {
    let (store, ann) = store_with_contact("Ann");
    let entry = store
        .logs()
        .add(1_700_000_010, ann.id, day(2024, 1, 1), "original")
        .expect("log");

    let edited = store
        .logs()
        .update(
            entry.id,
            LogUpdate {
                text: Some("revised".to_string()),
                date: None,
            },
        )
        .expect("edit text");
    assert_eq!(edited.text, "revised");
    assert_eq!(edited.date, day(2024, 1, 1));
    assert_eq!(edited.seq, entry.seq);

    let moved = store
        .logs()
        .update(
            entry.id,
            LogUpdate {
                text: None,
                date: Some(day(2024, 1, 5)),
            },
        )
        .expect("edit date");
    assert_eq!(moved.date, day(2024, 1, 5));
    assert_eq!(moved.text, "revised");

    let err = store
        .logs()
        .update(
            entry.id,
            LogUpdate {
                text: Some("".to_string()),
                date: None,
            },
        )
        .expect_err("blank edit rejected");
    assert_eq!(err.kind(), StoreErrorKind::Core);

    let err = store
        .logs()
        .update(
            LogId::new(),
            LogUpdate {
                text: Some("whatever".to_string()),
                date: None,
            },
        )
        .expect_err("missing log");
    assert_eq!(err.kind(), StoreErrorKind::NotFound);
}

#[test]
fn delete_log_keeps_remaining_sequence_stable() {
    let (store, ann) = store_with_contact("Ann");
    let first = store
        .logs()
        .add(1_700_000_010, ann.id, day(2024, 1, 1), "one")
        .expect("log");
    store
        .logs()
        .add(1_700_000_020, ann.id, day(2024, 1, 2), "two")
        .expect("log");

    let removed = store.logs().delete(first.id).expect("delete");
    assert_eq!(removed.map(|entry| entry.seq), Some(1));
    assert!(store.logs().delete(first.id).expect("redelete").is_none());

    // "log #2" still means the same entry
    let survivor = store
        .logs()
        .get_by_seq(ann.id, 2)
        .expect("get by seq")
        .expect("exists");
    assert_eq!(survivor.text, "two");

    // and the next append does not reuse the freed number
    let third = store
        .logs()
        .add(1_700_000_030, ann.id, day(2024, 1, 3), "three")
        .expect("log");
    assert_eq!(third.seq, 3);
}

#[test]
fn list_since_joins_contact_names() {
    let (store, ann) = store_with_contact("Ann");
    let bob = store
        .contacts()
        .create(
            1_700_000_001,
            ContactNew {
                name: "Bob".to_string(),
                telegram: None,
                phone: None,
                birthday: None,
            },
        )
        .expect("create Bob");

    store
        .logs()
        .add(1_700_000_010, ann.id, day(2024, 1, 1), "old news")
        .expect("log");
    store
        .logs()
        .add(1_700_000_020, ann.id, day(2024, 3, 2), "fresh")
        .expect("log");
    store
        .logs()
        .add(1_700_000_030, bob.id, day(2024, 3, 3), "also fresh")
        .expect("log");

    let recent = store.logs().list_since(day(2024, 3, 1)).expect("recent");
    let pairs: Vec<(&str, &str)> = recent
        .iter()
        .map(|(name, entry)| (name.as_str(), entry.text.as_str()))
        .collect();
    assert_eq!(pairs, vec![("Ann", "fresh"), ("Bob", "also fresh")]);
}
