use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::highlight::highlight;
use crate::loading::LoadingTracker;
use crate::reconcile::{classify, reconcile, Merge};
use crate::row::{LogRow, RowSet};
use crate::view_model::{AppViewModel, CellView, LogRowView, TaskRowView};

pub type ProcessId = u64;

/// Default rows per detail page, matching the backend's default.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub module: String,
    pub keywords: Vec<String>,
    pub where_sqls: Vec<String>,
    pub time_range: Option<String>,
    pub page_size: u32,
}

impl SearchQuery {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            keywords: Vec::new(),
            where_sqls: Vec::new(),
            time_range: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Where a loaded page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrigin {
    Requested,
    AutoRefresh,
}

/// Status string reported by the backend for a Logstash task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    Other(String),
}

impl TaskStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" => TaskStatus::Pending,
            "RUNNING" => TaskStatus::Running,
            "COMPLETED" => TaskStatus::Completed,
            "FAILED" => TaskStatus::Failed,
            "CANCELLED" => TaskStatus::Cancelled,
            _ => TaskStatus::Other(raw.to_string()),
        }
    }

    /// Unknown statuses keep the watch going.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => f.write_str("PENDING"),
            TaskStatus::Running => f.write_str("RUNNING"),
            TaskStatus::Completed => f.write_str("COMPLETED"),
            TaskStatus::Failed => f.write_str("FAILED"),
            TaskStatus::Cancelled => f.write_str("CANCELLED"),
            TaskStatus::Other(raw) => f.write_str(raw),
        }
    }
}

/// How a task watch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Finished(TaskStatus),
    GaveUp { attempts: u32 },
    Cancelled,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct TaskEntry {
    /// Id of the latest watch; events from older watches are ignored.
    pub(crate) watch: u64,
    pub(crate) status: Option<TaskStatus>,
    pub(crate) outcome: Option<TaskOutcome>,
    pub(crate) watching: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    query: Option<SearchQuery>,
    generation: u64,
    rows: RowSet<LogRow>,
    total_count: u64,
    loading: LoadingTracker,
    auto_refresh_ms: Option<u64>,
    tasks: BTreeMap<ProcessId, TaskEntry>,
    next_watch: u64,
    last_error: Option<String>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            query: None,
            generation: 0,
            rows: Arc::from(Vec::new()),
            total_count: 0,
            loading: LoadingTracker::new(),
            auto_refresh_ms: None,
            tasks: BTreeMap::new(),
            next_watch: 0,
            last_error: None,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let keywords: &[String] = self
            .query
            .as_ref()
            .map(|q| q.keywords.as_slice())
            .unwrap_or(&[]);
        let rows = self
            .rows
            .iter()
            .map(|row| LogRowView {
                key: row.key.clone(),
                cells: row
                    .fields
                    .iter()
                    .map(|(field, value)| CellView {
                        field: field.clone(),
                        segments: highlight(value, keywords),
                    })
                    .collect(),
            })
            .collect();
        let tasks = self
            .tasks
            .iter()
            .map(|(process_id, entry)| TaskRowView {
                process_id: *process_id,
                status: entry.status.clone(),
                outcome: entry.outcome.clone(),
                watching: entry.watching,
            })
            .collect();

        AppViewModel {
            module: self.query.as_ref().map(|q| q.module.clone()),
            rows,
            total_count: self.total_count,
            loading: self.loading.is_loading(),
            can_load_more: self.can_load_more(),
            auto_refresh_ms: self.auto_refresh_ms,
            tasks,
            last_error: self.last_error.clone(),
            dirty: self.dirty,
        }
    }

    /// Rows in rendered order; the same allocation until a page changes them.
    pub fn rows(&self) -> &RowSet<LogRow> {
        &self.rows
    }

    pub fn query(&self) -> Option<&SearchQuery> {
        self.query.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn auto_refresh_ms(&self) -> Option<u64> {
        self.auto_refresh_ms
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    /// Returns whether the view changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn can_load_more(&self) -> bool {
        self.query.is_some()
            && !self.loading.is_loading()
            && (self.rows.len() as u64) < self.total_count
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn start_search(&mut self, query: SearchQuery) -> u64 {
        self.generation += 1;
        self.query = Some(query);
        self.last_error = None;
        self.mark_dirty();
        self.generation
    }

    pub(crate) fn begin_load(&mut self) {
        self.loading.begin();
        self.mark_dirty();
    }

    pub(crate) fn end_load(&mut self) {
        self.loading.end();
        self.mark_dirty();
    }

    /// Applies a page if it belongs to the current search. Returns the merge
    /// that was applied, or `None` for a stale page.
    pub(crate) fn apply_page(
        &mut self,
        generation: u64,
        offset: usize,
        rows: RowSet<LogRow>,
        total_count: u64,
    ) -> Option<Merge> {
        if generation != self.generation {
            return None;
        }
        let merge = classify(&self.rows, &rows, offset);
        self.rows = reconcile(&self.rows, rows, offset);
        if self.total_count != total_count {
            self.total_count = total_count;
            self.mark_dirty();
        }
        if merge != Merge::Unchanged {
            self.mark_dirty();
        }
        Some(merge)
    }

    pub(crate) fn set_error(&mut self, message: String) {
        self.last_error = Some(message);
        self.mark_dirty();
    }

    pub(crate) fn set_auto_refresh(&mut self, interval_ms: Option<u64>) {
        if self.auto_refresh_ms != interval_ms {
            self.auto_refresh_ms = interval_ms;
            self.mark_dirty();
        }
    }

    /// Starts a new watch for `process_id` and returns its id.
    pub(crate) fn watch_task(&mut self, process_id: ProcessId) -> u64 {
        self.next_watch += 1;
        let watch = self.next_watch;
        let entry = self.tasks.entry(process_id).or_default();
        entry.watch = watch;
        entry.watching = true;
        entry.outcome = None;
        self.mark_dirty();
        watch
    }

    pub(crate) fn is_watching(&self, process_id: ProcessId) -> bool {
        self.tasks
            .get(&process_id)
            .is_some_and(|entry| entry.watching)
    }

    /// True only for the live watch of `process_id`.
    pub(crate) fn is_current_watch(&self, process_id: ProcessId, watch: u64) -> bool {
        self.tasks
            .get(&process_id)
            .is_some_and(|entry| entry.watching && entry.watch == watch)
    }

    pub(crate) fn apply_task_progress(&mut self, process_id: ProcessId, status: TaskStatus) {
        let Some(entry) = self.tasks.get_mut(&process_id) else {
            return;
        };
        if entry.status.as_ref() != Some(&status) {
            entry.status = Some(status);
            self.dirty = true;
        }
    }

    pub(crate) fn apply_task_settled(&mut self, process_id: ProcessId, outcome: TaskOutcome) {
        let Some(entry) = self.tasks.get_mut(&process_id) else {
            return;
        };
        if let TaskOutcome::Finished(status) = &outcome {
            entry.status = Some(status.clone());
        }
        entry.watching = false;
        entry.outcome = Some(outcome);
        self.dirty = true;
    }
}
