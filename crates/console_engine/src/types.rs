use std::fmt;

use console_core::{FetchOrigin, LogRow, ProcessId, RowSet, SearchQuery, TaskStatus};
use serde::Serialize;

use crate::poll::PollError;

/// Body of a detail search, as the backend expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub module: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub where_sqls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<String>,
    pub page_size: u32,
    pub offset: usize,
}

impl SearchRequest {
    pub fn from_query(query: &SearchQuery, offset: usize) -> Self {
        Self {
            module: query.module.clone(),
            keywords: query.keywords.clone(),
            where_sqls: query.where_sqls.clone(),
            time_range: query.time_range.clone(),
            page_size: query.page_size,
            offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage {
    pub rows: RowSet<LogRow>,
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskStatusReport {
    pub task_id: String,
    pub name: Option<String>,
    pub status: TaskStatus,
    pub progress_percentage: Option<f64>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    PageLoaded {
        generation: u64,
        offset: usize,
        origin: FetchOrigin,
        result: Result<SearchPage, FetchError>,
    },
    /// Auto refresh exhausted its retry budget and will not run again.
    AutoRefreshStopped { generation: u64, error: FetchError },
    /// `watch` is the id the watch was started with.
    TaskProgress {
        process_id: ProcessId,
        watch: u64,
        report: TaskStatusReport,
    },
    TaskSettled {
        process_id: ProcessId,
        watch: u64,
        result: Result<TaskStatusReport, PollError<FetchError>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    /// The backend answered with a non-success envelope code.
    Api { code: String },
    Decode,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Api { code } => write!(f, "api error {code}"),
            FailureKind::Decode => write!(f, "malformed response"),
        }
    }
}
