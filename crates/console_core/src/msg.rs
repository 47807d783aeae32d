use crate::row::{LogRow, RowSet};
use crate::state::{FetchOrigin, ProcessId, SearchQuery, TaskOutcome, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User ran a new search; replaces whatever is on screen.
    SearchSubmitted(SearchQuery),
    /// User scrolled to the bottom of the table.
    LoadMoreRequested,
    /// User asked to reload the first page of the current search.
    RefreshRequested,
    /// Engine delivered a page of rows.
    PageLoaded {
        generation: u64,
        offset: usize,
        origin: FetchOrigin,
        rows: RowSet<LogRow>,
        total_count: u64,
    },
    /// A requested page could not be fetched.
    PageFailed {
        generation: u64,
        offset: usize,
        message: String,
    },
    /// User picked an auto refresh interval, or turned it off.
    AutoRefreshChanged { interval_ms: Option<u64> },
    /// Auto refresh for `generation` gave up after its retry budget ran out.
    AutoRefreshStopped { generation: u64, message: String },
    TaskWatchRequested { process_id: ProcessId },
    TaskWatchCancelled { process_id: ProcessId },
    /// A status check for a watched task came back.
    TaskProgress {
        process_id: ProcessId,
        watch: u64,
        status: TaskStatus,
    },
    TaskSettled {
        process_id: ProcessId,
        watch: u64,
        outcome: TaskOutcome,
    },
    /// UI/render tick to coalesce rendering.
    Tick,
    NoOp,
}
