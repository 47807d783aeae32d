use std::time::Duration;

use console_core::{Effect, Msg, TaskOutcome};
use console_engine::{EngineEvent, EngineHandle, FetchError, PollError, TaskStatusReport};
use console_logging::{console_info, console_warn};

/// Turns core effects into engine commands and engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchPage {
                    generation,
                    query,
                    offset,
                } => self.engine.fetch_page(generation, &query, offset),
                Effect::StartAutoRefresh {
                    generation,
                    query,
                    interval_ms,
                } => {
                    console_info!("Auto refresh every {} ms", interval_ms);
                    self.engine.start_auto_refresh(
                        generation,
                        &query,
                        Duration::from_millis(interval_ms),
                    );
                }
                Effect::StopAutoRefresh => self.engine.stop_auto_refresh(),
                Effect::WatchTask { process_id, watch } => {
                    self.engine.watch_task(process_id, watch)
                }
                Effect::CancelTaskWatch { process_id } => {
                    self.engine.cancel_task_watch(process_id)
                }
            }
        }
    }

    /// Messages for every engine event that arrived since the last call.
    pub fn drain(&self) -> Vec<Msg> {
        std::iter::from_fn(|| self.engine.try_recv())
            .map(event_to_msg)
            .collect()
    }
}

pub fn event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::PageLoaded {
            generation,
            offset,
            origin,
            result,
        } => match result {
            Ok(page) => Msg::PageLoaded {
                generation,
                offset,
                origin,
                rows: page.rows,
                total_count: page.total_count,
            },
            Err(err) => {
                console_warn!("Page at offset {} failed: {}", offset, err);
                Msg::PageFailed {
                    generation,
                    offset,
                    message: err.to_string(),
                }
            }
        },
        EngineEvent::AutoRefreshStopped { generation, error } => Msg::AutoRefreshStopped {
            generation,
            message: format!("auto refresh stopped: {error}"),
        },
        EngineEvent::TaskProgress {
            process_id,
            watch,
            report,
        } => Msg::TaskProgress {
            process_id,
            watch,
            status: report.status,
        },
        EngineEvent::TaskSettled {
            process_id,
            watch,
            result,
        } => Msg::TaskSettled {
            process_id,
            watch,
            outcome: task_outcome(result),
        },
    }
}

fn task_outcome(result: Result<TaskStatusReport, PollError<FetchError>>) -> TaskOutcome {
    match result {
        Ok(report) => TaskOutcome::Finished(report.status),
        Err(PollError::Exhausted { attempts }) => TaskOutcome::GaveUp { attempts },
        Err(PollError::Cancelled) => TaskOutcome::Cancelled,
        Err(PollError::Task(err)) => TaskOutcome::Failed(err.to_string()),
        Err(PollError::Aborted) => TaskOutcome::Failed("watch stopped unexpectedly".to_string()),
    }
}
