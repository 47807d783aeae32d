//! Console engine: backend client, polling loops and the effect executor.
mod client;
mod engine;
mod poll;
mod types;

pub use client::{latest_task, row_from_json, ClientSettings, ConsoleBackend, HttpBackend};
pub use engine::{EngineHandle, EngineSettings};
pub use poll::{
    poll_task, start_polling, PollError, PollHandle, PollOptions, PollSettings, PollTask,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_RETRIES, DEFAULT_TASK_INTERVAL,
};
pub use types::{
    EngineEvent, FailureKind, FetchError, SearchPage, SearchRequest, TaskStatusReport,
};
