use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use console_core::{FetchOrigin, ProcessId, SearchQuery};
use console_logging::{console_debug, console_error, console_info};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::client::{latest_task, ConsoleBackend};
use crate::poll::{
    poll_task, start_polling, PollHandle, PollOptions, PollSettings, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_RETRIES, DEFAULT_TASK_INTERVAL,
};
use crate::{EngineEvent, FetchError, SearchPage, SearchRequest, TaskStatusReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Consecutive auto refresh failures tolerated before it stops.
    pub auto_refresh_max_retries: u32,
    pub task_interval: Duration,
    pub task_max_attempts: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            auto_refresh_max_retries: DEFAULT_MAX_RETRIES,
            task_interval: DEFAULT_TASK_INTERVAL,
            task_max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

enum EngineCommand {
    FetchPage {
        generation: u64,
        request: SearchRequest,
    },
    StartAutoRefresh {
        generation: u64,
        request: SearchRequest,
        interval: Duration,
    },
    StopAutoRefresh,
    WatchTask {
        process_id: ProcessId,
        watch: u64,
    },
    CancelTaskWatch {
        process_id: ProcessId,
    },
}

/// Runs backend calls on a private tokio runtime and reports back through
/// [`EngineEvent`]s. Dropping the handle stops every poll.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(backend: Arc<dyn ConsoleBackend>, settings: EngineSettings) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    console_error!("Could not start engine runtime: {}", err);
                    return;
                }
            };
            let _context = runtime.enter();
            let mut supervisor = Supervisor::new(backend, settings, event_tx);
            while let Ok(command) = cmd_rx.recv() {
                supervisor.handle(command);
            }
            supervisor.shutdown();
        });

        Self { cmd_tx, event_rx }
    }

    pub fn fetch_page(&self, generation: u64, query: &SearchQuery, offset: usize) {
        self.send(EngineCommand::FetchPage {
            generation,
            request: SearchRequest::from_query(query, offset),
        });
    }

    /// Replaces any auto refresh that is already running.
    pub fn start_auto_refresh(&self, generation: u64, query: &SearchQuery, interval: Duration) {
        self.send(EngineCommand::StartAutoRefresh {
            generation,
            request: SearchRequest::from_query(query, 0),
            interval,
        });
    }

    pub fn stop_auto_refresh(&self) {
        self.send(EngineCommand::StopAutoRefresh);
    }

    /// Replaces any watch already running for the same process. Events of
    /// this watch carry `watch`.
    pub fn watch_task(&self, process_id: ProcessId, watch: u64) {
        self.send(EngineCommand::WatchTask { process_id, watch });
    }

    pub fn cancel_task_watch(&self, process_id: ProcessId) {
        self.send(EngineCommand::CancelTaskWatch { process_id });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            console_error!("Engine thread is gone; command dropped");
        }
    }
}

/// Owns every running poll. Lives on the engine thread only.
struct Supervisor {
    backend: Arc<dyn ConsoleBackend>,
    settings: EngineSettings,
    event_tx: mpsc::Sender<EngineEvent>,
    auto_refresh: Option<PollHandle>,
    watches: HashMap<ProcessId, PollHandle>,
}

impl Supervisor {
    fn new(
        backend: Arc<dyn ConsoleBackend>,
        settings: EngineSettings,
        event_tx: mpsc::Sender<EngineEvent>,
    ) -> Self {
        Self {
            backend,
            settings,
            event_tx,
            auto_refresh: None,
            watches: HashMap::new(),
        }
    }

    fn handle(&mut self, command: EngineCommand) {
        self.watches.retain(|_, watch| watch.is_active());
        match command {
            EngineCommand::FetchPage {
                generation,
                request,
            } => self.fetch_page(generation, request),
            EngineCommand::StartAutoRefresh {
                generation,
                request,
                interval,
            } => self.start_auto_refresh(generation, request, interval),
            EngineCommand::StopAutoRefresh => {
                if let Some(handle) = self.auto_refresh.take() {
                    console_info!("Auto refresh stopped");
                    handle.cancel();
                }
            }
            EngineCommand::WatchTask { process_id, watch } => self.watch_task(process_id, watch),
            EngineCommand::CancelTaskWatch { process_id } => {
                if let Some(watch) = self.watches.remove(&process_id) {
                    console_info!("Cancelling task watch for process {}", process_id);
                    watch.cancel();
                }
            }
        }
    }

    fn fetch_page(&self, generation: u64, request: SearchRequest) {
        let backend = Arc::clone(&self.backend);
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            console_debug!(
                "Fetching module={} offset={} page_size={}",
                request.module,
                request.offset,
                request.page_size
            );
            let result = backend.search_details(&request).await;
            let _ = event_tx.send(EngineEvent::PageLoaded {
                generation,
                offset: request.offset,
                origin: FetchOrigin::Requested,
                result,
            });
        });
    }

    fn start_auto_refresh(&mut self, generation: u64, request: SearchRequest, interval: Duration) {
        if let Some(previous) = self.auto_refresh.take() {
            previous.cancel();
        }
        console_info!(
            "Auto refresh every {:?} for module={}",
            interval,
            request.module
        );

        let backend = Arc::clone(&self.backend);
        let fetch = move || -> BoxFuture<'static, Result<SearchPage, FetchError>> {
            let backend = Arc::clone(&backend);
            let request = request.clone();
            async move { backend.search_details(&request).await }.boxed()
        };
        let success_tx = self.event_tx.clone();
        let on_success = move |page: SearchPage| {
            let _ = success_tx.send(EngineEvent::PageLoaded {
                generation,
                offset: 0,
                origin: FetchOrigin::AutoRefresh,
                result: Ok(page),
            });
        };
        let error_tx = self.event_tx.clone();
        let on_error = move |error: FetchError| {
            let _ = error_tx.send(EngineEvent::AutoRefreshStopped { generation, error });
        };

        let settings = PollSettings {
            interval,
            max_retries: self.settings.auto_refresh_max_retries,
        };
        self.auto_refresh = Some(start_polling(settings, fetch, on_success, on_error));
    }

    fn watch_task(&mut self, process_id: ProcessId, watch: u64) {
        if let Some(previous) = self.watches.remove(&process_id) {
            previous.cancel();
        }
        console_info!("Watching tasks of process {} (watch {})", process_id, watch);

        let backend = Arc::clone(&self.backend);
        let check = move || -> BoxFuture<'static, Result<TaskStatusReport, FetchError>> {
            latest_task(Arc::clone(&backend), process_id).boxed()
        };
        let progress_tx = self.event_tx.clone();
        let options = PollOptions::new(|report: &TaskStatusReport| !report.status.is_terminal())
            .interval(self.settings.task_interval)
            .max_attempts(self.settings.task_max_attempts)
            .on_progress(move |report: &TaskStatusReport| {
                let _ = progress_tx.send(EngineEvent::TaskProgress {
                    process_id,
                    watch,
                    report: report.clone(),
                });
            });

        let task = poll_task(check, options);
        let handle = task.canceller();
        let finished = handle.clone();
        let settled_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = task.join().await;
            // Marks the watch inactive so the supervisor can forget it.
            finished.cancel();
            let _ = settled_tx.send(EngineEvent::TaskSettled {
                process_id,
                watch,
                result,
            });
        });
        self.watches.insert(process_id, handle);
    }

    fn shutdown(&mut self) {
        if let Some(handle) = self.auto_refresh.take() {
            handle.cancel();
        }
        for (_, watch) in self.watches.drain() {
            watch.cancel();
        }
    }
}
