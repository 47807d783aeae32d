//! Merging a freshly fetched page into the rows already on screen.
//!
//! `offset == 0` is a fresh load or a refresh; `offset > 0` is a "load more"
//! continuation. The reconciler keeps no state between calls.

use std::collections::HashSet;
use std::sync::Arc;

use crate::row::{Keyed, RowSet};

/// How a page relates to the rows already shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    /// Keep the previous rows, same allocation.
    Unchanged,
    /// Show the incoming page instead of the previous rows.
    Replaced,
    /// Append the incoming page; `added` counts rows that survived de-duplication.
    Appended { added: usize },
}

pub fn classify<R: Keyed>(previous: &[R], incoming: &[R], offset: usize) -> Merge {
    if offset == 0 {
        if is_same_page(previous, incoming) {
            return Merge::Unchanged;
        }
        return Merge::Replaced;
    }

    if incoming.is_empty() || is_duplicate_continuation(previous, incoming) {
        return Merge::Unchanged;
    }

    let seen: HashSet<&R::Key> = previous.iter().map(Keyed::key).collect();
    let mut fresh: HashSet<&R::Key> = HashSet::new();
    let added = incoming
        .iter()
        .filter(|row| !seen.contains(row.key()) && fresh.insert(row.key()))
        .count();
    Merge::Appended { added }
}

/// Produce the next row set from the previous one and a fetched page.
pub fn reconcile<R: Keyed + Clone>(
    previous: &RowSet<R>,
    incoming: RowSet<R>,
    offset: usize,
) -> RowSet<R> {
    match classify(previous, &incoming, offset) {
        Merge::Unchanged => Arc::clone(previous),
        Merge::Replaced => incoming,
        Merge::Appended { .. } => {
            let combined: Vec<R> = previous.iter().chain(incoming.iter()).cloned().collect();
            dedupe_by_key(combined).into()
        }
    }
}

/// Keep the first row for every key, preserving order.
pub fn dedupe_by_key<R: Keyed>(rows: Vec<R>) -> Vec<R> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.into_iter()
        .filter(|row| seen.insert(row.key().clone()))
        .collect()
}

// Length plus first key only. Two pages that share a first key but differ
// further down are treated as the same page.
fn is_same_page<R: Keyed>(a: &[R], b: &[R]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    match (a.first(), b.first()) {
        (None, None) => true,
        (Some(x), Some(y)) => x.key() == y.key(),
        _ => false,
    }
}

fn is_duplicate_continuation<R: Keyed>(previous: &[R], incoming: &[R]) -> bool {
    match (previous.last(), incoming.first()) {
        (Some(last), Some(first)) => last.key() == first.key(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::LogRow;

    fn rows(keys: &[i64]) -> Vec<LogRow> {
        keys.iter().map(|k| LogRow::new(*k)).collect()
    }

    #[test]
    fn appended_count_ignores_keys_already_shown() {
        let merge = classify(&rows(&[1, 2, 3]), &rows(&[2, 4, 4, 5]), 3);
        assert_eq!(merge, Merge::Appended { added: 2 });
    }

    #[test]
    fn same_page_needs_equal_length() {
        assert!(!is_same_page(&rows(&[1]), &rows(&[1, 2])));
        assert!(is_same_page::<LogRow>(&[], &[]));
    }
}
