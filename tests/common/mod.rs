//! Shared fixtures for integration tests

#![allow(dead_code)]

use foliodb::{
    Collection, CollectionOptions, IndexKind, MemoryStore, Model, Store,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Test document with an optional unique email and an optional role
///
/// Absent options are skipped during serialization, which is what sparse
/// indexing keys off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Model for User {}

pub fn user(name: &str, email: Option<&str>, role: Option<&str>) -> User {
    User {
        name: name.into(),
        email: email.map(Into::into),
        role: role.map(Into::into),
    }
}

pub fn new_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

/// Users collection with a unique index on `email` and a non-unique index
/// on `role`
pub fn users_collection(store: &Arc<MemoryStore>) -> Collection<User> {
    Collection::new(
        Arc::clone(store) as Arc<dyn Store>,
        &["users"],
        CollectionOptions::new()
            .with_index("email", IndexKind::Primary)
            .with_index("role", IndexKind::Secondary),
    )
    .unwrap()
}

/// Plain users collection without indexes
pub fn plain_users(store: &Arc<MemoryStore>) -> Collection<User> {
    Collection::new(
        Arc::clone(store) as Arc<dyn Store>,
        &["plain_users"],
        CollectionOptions::new(),
    )
    .unwrap()
}

/// Count every key the store holds under a collection's base prefix
pub fn keys_under<T: Model>(store: &MemoryStore, collection: &Collection<T>) -> usize {
    store
        .list(
            &foliodb::KeySelector::prefix(collection.keys().base().clone()),
            &foliodb::ScanOptions::new(),
        )
        .unwrap()
        .len()
}
