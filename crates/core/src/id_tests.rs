// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

#[test]
fn new_ids_are_unique() {
    let a = EventId::new();
    let b = EventId::new();
    assert_ne!(a, b);
    assert_eq!(a.as_str().len(), 36);
}

#[test]
fn hash_map_lookup_by_str() {
    let mut map = HashMap::new();
    map.insert(EventId::from("evt-1"), 42);
    assert_eq!(map.get("evt-1"), Some(&42));
}

#[test]
fn serializes_as_plain_string() {
    let id = EventId::from("abc");
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    let back: EventId = serde_json::from_str("\"abc\"").unwrap();
    assert_eq!(back, "abc");
}

#[test]
fn empty_id() {
    assert!(EventId::from("").is_empty());
    assert!(!EventId::new().is_empty());
}
