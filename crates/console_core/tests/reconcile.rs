use std::sync::Arc;

use console_core::{classify, dedupe_by_key, reconcile, LogRow, Merge, RowSet};
use pretty_assertions::assert_eq;

fn rows(keys: &[i64]) -> RowSet<LogRow> {
    keys.iter()
        .map(|k| LogRow::new(*k).with_field("message", format!("line {k}")))
        .collect::<Vec<_>>()
        .into()
}

fn keys(set: &RowSet<LogRow>) -> Vec<String> {
    set.iter().map(|row| row.key.to_string()).collect()
}

#[test]
fn fresh_reload_of_same_page_keeps_previous_allocation() {
    let previous = rows(&[1, 2, 3]);
    let incoming = rows(&[1, 2, 3]);

    let next = reconcile(&previous, incoming, 0);

    assert!(Arc::ptr_eq(&next, &previous));
}

#[test]
fn fresh_reload_compares_only_length_and_first_key() {
    let previous = rows(&[1, 2, 3]);
    // Same first key and length, different tail: still treated as the same page.
    let incoming = rows(&[1, 8, 9]);

    let next = reconcile(&previous, incoming, 0);

    assert!(Arc::ptr_eq(&next, &previous));
    assert_eq!(keys(&next), vec!["1", "2", "3"]);
}

#[test]
fn fresh_load_replaces_when_first_key_differs() {
    let previous = rows(&[1, 2]);
    let incoming = rows(&[5, 6]);

    let next = reconcile(&previous, incoming.clone(), 0);

    assert!(Arc::ptr_eq(&next, &incoming));
}

#[test]
fn fresh_load_replaces_when_length_differs() {
    let previous = rows(&[1, 2]);
    let incoming = rows(&[1, 2, 3]);

    let next = reconcile(&previous, incoming.clone(), 0);

    assert!(Arc::ptr_eq(&next, &incoming));
}

#[test]
fn fresh_load_of_empty_page_clears_rows() {
    let previous = rows(&[1, 2]);

    let next = reconcile(&previous, rows(&[]), 0);

    assert!(next.is_empty());
}

#[test]
fn fresh_load_of_empty_page_over_empty_rows_is_unchanged() {
    let previous = rows(&[]);

    let next = reconcile(&previous, rows(&[]), 0);

    assert!(Arc::ptr_eq(&next, &previous));
}

#[test]
fn load_more_appends_and_drops_repeated_keys() {
    let previous = rows(&[1, 2, 3]);
    let incoming = rows(&[2, 4]);

    let next = reconcile(&previous, incoming, 3);

    assert_eq!(keys(&next), vec!["1", "2", "3", "4"]);
}

#[test]
fn load_more_keeps_first_loaded_payload_for_repeated_key() {
    let previous: RowSet<LogRow> = vec![
        LogRow::new(1).with_field("message", "first"),
        LogRow::new(2).with_field("message", "second"),
    ]
    .into();
    let incoming: RowSet<LogRow> = vec![
        LogRow::new(1).with_field("message", "refetched"),
        LogRow::new(3).with_field("message", "third"),
    ]
    .into();

    let next = reconcile(&previous, incoming, 2);

    assert_eq!(keys(&next), vec!["1", "2", "3"]);
    assert_eq!(next[0].fields["message"], "first");
}

#[test]
fn duplicate_continuation_wins_over_append() {
    // last(previous) == first(incoming) == 2, so the page is a repeat even
    // though key 3 would otherwise be new.
    let previous = rows(&[1, 2]);
    let incoming = rows(&[2, 3]);

    assert_eq!(classify(&previous, &incoming, 1), Merge::Unchanged);
    let next = reconcile(&previous, incoming, 1);

    assert!(Arc::ptr_eq(&next, &previous));
    assert_eq!(keys(&next), vec!["1", "2"]);
}

#[test]
fn empty_continuation_is_noop() {
    let previous = rows(&[1, 2]);

    let next = reconcile(&previous, rows(&[]), 2);

    assert!(Arc::ptr_eq(&next, &previous));
}

#[test]
fn load_more_onto_empty_rows_dedupes_incoming() {
    let previous = rows(&[]);

    let next = reconcile(&previous, rows(&[4, 4, 5]), 10);

    assert_eq!(keys(&next), vec!["4", "5"]);
}

#[test]
fn dedupe_preserves_first_seen_order() {
    let deduped = dedupe_by_key(vec![
        LogRow::new("b"),
        LogRow::new("a"),
        LogRow::new("b"),
        LogRow::new("c"),
        LogRow::new("a"),
    ]);

    let order: Vec<_> = deduped.iter().map(|row| row.key.to_string()).collect();
    assert_eq!(order, vec!["b", "a", "c"]);
}
