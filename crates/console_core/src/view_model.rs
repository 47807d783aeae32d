use crate::highlight::Segment;
use crate::row::RowKey;
use crate::state::{ProcessId, TaskOutcome, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub module: Option<String>,
    pub rows: Vec<LogRowView>,
    pub total_count: u64,
    pub loading: bool,
    pub can_load_more: bool,
    pub auto_refresh_ms: Option<u64>,
    pub tasks: Vec<TaskRowView>,
    pub last_error: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRowView {
    pub key: RowKey,
    pub cells: Vec<CellView>,
}

/// One field of a row, already split around the search keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellView {
    pub field: String,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRowView {
    pub process_id: ProcessId,
    pub status: Option<TaskStatus>,
    pub outcome: Option<TaskOutcome>,
    pub watching: bool,
}
