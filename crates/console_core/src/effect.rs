use crate::state::{ProcessId, SearchQuery};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchPage {
        generation: u64,
        query: SearchQuery,
        offset: usize,
    },
    /// Start (or restart) polling the first page of `query`.
    StartAutoRefresh {
        generation: u64,
        query: SearchQuery,
        interval_ms: u64,
    },
    StopAutoRefresh,
    /// `watch` tags every event of this watch.
    WatchTask { process_id: ProcessId, watch: u64 },
    CancelTaskWatch { process_id: ProcessId },
}
