use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// A record with a stable identity. The key is the only thing the
/// reconciler ever looks at.
pub trait Keyed {
    type Key: Eq + Hash + Clone + fmt::Debug;

    fn key(&self) -> &Self::Key;
}

/// Ordered, shared row collection in rendered order.
///
/// Returning the previous `RowSet` untouched is observable with `Arc::ptr_eq`,
/// which lets the view skip re-rendering.
pub type RowSet<R> = Arc<[R]>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowKey {
    Text(String),
    Number(i64),
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Text(text) => f.write_str(text),
            RowKey::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for RowKey {
    fn from(value: &str) -> Self {
        RowKey::Text(value.to_string())
    }
}

impl From<String> for RowKey {
    fn from(value: String) -> Self {
        RowKey::Text(value)
    }
}

impl From<i64> for RowKey {
    fn from(value: i64) -> Self {
        RowKey::Number(value)
    }
}

/// One log line returned by a detail search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    pub key: RowKey,
    pub fields: BTreeMap<String, String>,
}

impl LogRow {
    pub fn new(key: impl Into<RowKey>) -> Self {
        Self {
            key: key.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

impl Keyed for LogRow {
    type Key = RowKey;

    fn key(&self) -> &RowKey {
        &self.key
    }
}
