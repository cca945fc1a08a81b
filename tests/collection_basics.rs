//! Facade-level CRUD and iteration behavior

mod common;

use common::{new_store, plain_users, user};
use foliodb::{generate_id, KeyPart, ListOptions, SetOptions, WriteOutcome};
use serde_json::json;

#[test]
fn add_allocates_time_ordered_ids() {
    let store = new_store();
    let users = plain_users(&store);

    let mut ids = Vec::new();
    for n in 0..5 {
        let outcome = users.add(&user(&format!("u{}", n), None, None)).unwrap();
        ids.push(outcome.id().unwrap().clone());
    }

    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted, "generated ids must sort in insertion order");

    let listed = users.list(&ListOptions::new()).unwrap();
    let names: Vec<_> = listed
        .documents
        .iter()
        .map(|d| d.value.name.clone())
        .collect();
    assert_eq!(names, vec!["u0", "u1", "u2", "u3", "u4"]);
}

#[test]
fn set_find_delete_round_trip() {
    let store = new_store();
    let users = plain_users(&store);
    let id = KeyPart::from("u1");

    assert!(users
        .set(&id, &user("a", Some("a@x"), None), &SetOptions::new())
        .unwrap()
        .is_ok());

    let found = users.find(&id).unwrap().unwrap();
    assert_eq!(found.id, id);
    assert_eq!(found.value, user("a", Some("a@x"), None));

    users.delete(std::slice::from_ref(&id)).unwrap();
    assert!(users.find(&id).unwrap().is_none());
}

#[test]
fn update_merges_only_named_fields() {
    let store = new_store();
    let users = plain_users(&store);
    let id = KeyPart::from("u1");
    users
        .set(
            &id,
            &user("a", Some("a@x"), Some("admin")),
            &SetOptions::new(),
        )
        .unwrap();

    assert!(users
        .update(&id, &json!({"role": "user"}))
        .unwrap()
        .is_ok());

    let found = users.find(&id).unwrap().unwrap();
    assert_eq!(found.value.name, "a");
    assert_eq!(found.value.email.as_deref(), Some("a@x"));
    assert_eq!(found.value.role.as_deref(), Some("user"));
}

#[test]
fn update_of_missing_document_is_conflict() {
    let store = new_store();
    let users = plain_users(&store);
    assert_eq!(
        users
            .update(&KeyPart::from("ghost"), &json!({"role": "x"}))
            .unwrap(),
        WriteOutcome::Conflict
    );
}

#[test]
fn cursor_pagination_walks_the_whole_collection() {
    let store = new_store();
    let users = plain_users(&store);
    for n in 0..10 {
        users
            .set(
                &KeyPart::from(format!("u{}", n)),
                &user(&format!("u{}", n), None, None),
                &SetOptions::new(),
            )
            .unwrap();
    }

    let mut seen = Vec::new();
    let mut options = ListOptions::new().with_limit(3);
    loop {
        let page = users.list(&options).unwrap();
        if page.documents.is_empty() {
            break;
        }
        seen.extend(page.documents.iter().map(|d| d.value.name.clone()));
        match page.cursor {
            Some(cursor) => options = ListOptions::new().with_limit(3).with_cursor(cursor),
            None => break,
        }
    }

    let expected: Vec<_> = (0..10).map(|n| format!("u{}", n)).collect();
    assert_eq!(seen, expected);
}

#[test]
fn find_many_skips_missing_ids() {
    let store = new_store();
    let users = plain_users(&store);
    users
        .set(&KeyPart::from("u1"), &user("a", None, None), &SetOptions::new())
        .unwrap();

    let found = users
        .find_many(&[
            KeyPart::from("u1"),
            KeyPart::from("missing"),
            generate_id(),
        ])
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].value.name, "a");
}

#[test]
fn delete_many_respects_filters_bounds() {
    let store = new_store();
    let users = plain_users(&store);
    for id in ["a", "b", "c", "d"] {
        users
            .set(&KeyPart::from(id), &user(id, None, None), &SetOptions::new())
            .unwrap();
    }

    users
        .delete_many(&ListOptions::new().with_start_id(KeyPart::from("c")))
        .unwrap();
    assert_eq!(users.count(&ListOptions::new()).unwrap(), 2);
    assert!(users.find(&KeyPart::from("a")).unwrap().is_some());
    assert!(users.find(&KeyPart::from("d")).unwrap().is_none());
}
