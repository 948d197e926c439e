// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

crate::define_id! {
    /// Prefixed ID for macro verification.
    pub struct PrefixedId("tst-");
}

crate::define_id! {
    /// Externally assigned ID for macro verification.
    pub struct PlainId;
}

#[test]
fn prefixed_id_has_prefix_and_fits_inline() {
    let id = PrefixedId::new();
    assert!(id.starts_with("tst-"));
    assert_eq!(id.len(), 23);
    assert_eq!(id.suffix().len(), 19);
}

#[test]
fn prefixed_ids_are_unique() {
    assert_ne!(PrefixedId::new(), PrefixedId::new());
}

#[test]
fn plain_id_hash_map_lookup_by_str() {
    let mut map = HashMap::new();
    map.insert(PlainId::from("k"), 42);
    assert_eq!(map.get("k"), Some(&42));
}

#[test]
fn plain_id_serializes_transparently() {
    let id = PlainId::from("abc");
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    let parsed: PlainId = serde_json::from_str("\"abc\"").unwrap();
    assert_eq!(parsed, id);
}

#[yare::parameterized(
    truncates = { "abcdefghijklmnop", 8, "abcdefgh" },
    shorter   = { "abc", 8, "abc" },
    exact     = { "abcdefgh", 8, "abcdefgh" },
    multibyte = { "ééééé", 2, "éé" },
)]
fn short_truncates_by_chars(input: &str, n: usize, expected: &str) {
    assert_eq!(short(input, n), expected);
    assert_eq!(PlainId::from(input).short(n), expected);
}
