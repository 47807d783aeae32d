use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use console_core::{FetchOrigin, LogRow, ProcessId, SearchQuery, TaskStatus};
use console_engine::{
    ConsoleBackend, EngineEvent, EngineHandle, EngineSettings, FailureKind, FetchError,
    PollError, SearchPage, SearchRequest, TaskStatusReport,
};

#[derive(Default)]
struct FakeBackend {
    requests: Mutex<Vec<SearchRequest>>,
    tasks: Mutex<VecDeque<Vec<TaskStatusReport>>>,
}

#[async_trait::async_trait]
impl ConsoleBackend for FakeBackend {
    async fn search_details(&self, request: &SearchRequest) -> Result<SearchPage, FetchError> {
        self.requests.lock().unwrap().push(request.clone());
        let rows: Vec<LogRow> = vec![LogRow::new("a"), LogRow::new("b")];
        Ok(SearchPage {
            rows: rows.into(),
            total_count: 2,
        })
    }

    async fn process_tasks(
        &self,
        _process_id: ProcessId,
    ) -> Result<Vec<TaskStatusReport>, FetchError> {
        Ok(self.tasks.lock().unwrap().pop_front().unwrap_or_default())
    }
}

fn report(status: TaskStatus) -> TaskStatusReport {
    TaskStatusReport {
        task_id: "t1".to_string(),
        name: Some("deploy".to_string()),
        status,
        progress_percentage: None,
        error_message: None,
    }
}

fn settings() -> EngineSettings {
    EngineSettings {
        task_interval: Duration::from_millis(10),
        task_max_attempts: 5,
        ..EngineSettings::default()
    }
}

/// Collects events until `done` says so or the deadline passes.
fn collect_until(
    engine: &EngineHandle,
    mut done: impl FnMut(&[EngineEvent]) -> bool,
) -> Vec<EngineEvent> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut events = Vec::new();
    while Instant::now() < deadline {
        while let Some(event) = engine.try_recv() {
            events.push(event);
        }
        if done(&events) {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    events
}

#[test]
fn fetch_page_reports_loaded_page() {
    let backend = Arc::new(FakeBackend::default());
    let engine = EngineHandle::new(backend.clone(), settings());

    engine.fetch_page(4, &SearchQuery::new("nginx"), 50);
    let events = collect_until(&engine, |events| !events.is_empty());

    match events.first() {
        Some(EngineEvent::PageLoaded {
            generation,
            offset,
            origin,
            result: Ok(page),
        }) => {
            assert_eq!(*generation, 4);
            assert_eq!(*offset, 50);
            assert_eq!(*origin, FetchOrigin::Requested);
            assert_eq!(page.rows.len(), 2);
        }
        other => panic!("unexpected events: {other:?}"),
    }
    let requests = backend.requests.lock().unwrap();
    assert_eq!(requests[0].module, "nginx");
    assert_eq!(requests[0].offset, 50);
}

#[test]
fn watch_reports_progress_then_settles_on_terminal_status() {
    let backend = Arc::new(FakeBackend::default());
    backend.tasks.lock().unwrap().extend([
        vec![report(TaskStatus::Pending)],
        vec![report(TaskStatus::Running)],
        vec![report(TaskStatus::Completed)],
    ]);
    let engine = EngineHandle::new(backend, settings());

    engine.watch_task(7, 1);
    let events = collect_until(&engine, |events| {
        events
            .iter()
            .any(|event| matches!(event, EngineEvent::TaskSettled { .. }))
    });

    let progress: Vec<TaskStatus> = events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::TaskProgress {
                process_id: 7,
                watch: 1,
                report,
            } => Some(report.status.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        progress,
        vec![TaskStatus::Pending, TaskStatus::Running, TaskStatus::Completed]
    );
    match events.last() {
        Some(EngineEvent::TaskSettled {
            process_id: 7,
            watch: 1,
            result: Ok(report),
        }) => assert_eq!(report.status, TaskStatus::Completed),
        other => panic!("unexpected last event: {other:?}"),
    }
}

#[test]
fn watch_of_process_without_tasks_fails() {
    let backend = Arc::new(FakeBackend::default());
    let engine = EngineHandle::new(backend, settings());

    engine.watch_task(9, 1);
    let events = collect_until(&engine, |events| !events.is_empty());

    match events.first() {
        Some(EngineEvent::TaskSettled {
            process_id: 9,
            result: Err(PollError::Task(err)),
            ..
        }) => assert_eq!(
            err.kind,
            FailureKind::Api {
                code: "TASK_NOT_FOUND".to_string()
            }
        ),
        other => panic!("unexpected events: {other:?}"),
    }
}

#[test]
fn cancelled_watch_settles_as_cancelled() {
    let backend = Arc::new(FakeBackend::default());
    backend
        .tasks
        .lock()
        .unwrap()
        .extend(std::iter::repeat_n(vec![report(TaskStatus::Running)], 100));
    let engine = EngineHandle::new(
        backend,
        EngineSettings {
            task_interval: Duration::from_secs(30),
            ..settings()
        },
    );

    engine.watch_task(3, 1);
    collect_until(&engine, |events| !events.is_empty());
    engine.cancel_task_watch(3);
    let events = collect_until(&engine, |events| {
        events
            .iter()
            .any(|event| matches!(event, EngineEvent::TaskSettled { .. }))
    });

    assert!(events.iter().any(|event| matches!(
        event,
        EngineEvent::TaskSettled {
            process_id: 3,
            watch: 1,
            result: Err(PollError::Cancelled)
        }
    )));
}

#[test]
fn rewatch_cancels_previous_watch_and_tags_its_events() {
    let backend = Arc::new(FakeBackend::default());
    backend
        .tasks
        .lock()
        .unwrap()
        .extend(std::iter::repeat_n(vec![report(TaskStatus::Running)], 100));
    let engine = EngineHandle::new(
        backend,
        EngineSettings {
            task_interval: Duration::from_secs(30),
            ..settings()
        },
    );

    engine.watch_task(5, 1);
    collect_until(&engine, |events| !events.is_empty());
    engine.watch_task(5, 2);
    let events = collect_until(&engine, |events| {
        let settled = events.iter().any(|event| {
            matches!(event, EngineEvent::TaskSettled { watch: 1, .. })
        });
        let progressed = events.iter().any(|event| {
            matches!(event, EngineEvent::TaskProgress { watch: 2, .. })
        });
        settled && progressed
    });

    assert!(events.iter().any(|event| matches!(
        event,
        EngineEvent::TaskSettled {
            process_id: 5,
            watch: 1,
            result: Err(PollError::Cancelled)
        }
    )));
    assert!(events.iter().any(|event| matches!(
        event,
        EngineEvent::TaskProgress {
            process_id: 5,
            watch: 2,
            ..
        }
    )));
    assert!(!events
        .iter()
        .any(|event| matches!(event, EngineEvent::TaskSettled { watch: 2, .. })));
}
