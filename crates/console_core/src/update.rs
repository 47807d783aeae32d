use console_logging::{console_debug, console_info, console_warn};

use crate::reconcile::Merge;
use crate::{AppState, Effect, FetchOrigin, Msg, TaskOutcome};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::SearchSubmitted(query) => {
            if query.module.trim().is_empty() {
                state.set_error("module is required".to_string());
                return (state, Vec::new());
            }
            let generation = state.start_search(query.clone());
            state.begin_load();
            let mut effects = vec![Effect::FetchPage {
                generation,
                query: query.clone(),
                offset: 0,
            }];
            if let Some(interval_ms) = state.auto_refresh_ms() {
                effects.push(Effect::StartAutoRefresh {
                    generation,
                    query,
                    interval_ms,
                });
            }
            effects
        }
        Msg::LoadMoreRequested => {
            if !state.can_load_more() {
                return (state, Vec::new());
            }
            let Some(query) = state.query().cloned() else {
                return (state, Vec::new());
            };
            let offset = state.rows().len();
            state.begin_load();
            vec![Effect::FetchPage {
                generation: state.generation(),
                query,
                offset,
            }]
        }
        Msg::RefreshRequested => match state.query().cloned() {
            Some(query) => {
                state.begin_load();
                vec![Effect::FetchPage {
                    generation: state.generation(),
                    query,
                    offset: 0,
                }]
            }
            None => Vec::new(),
        },
        Msg::PageLoaded {
            generation,
            offset,
            origin,
            rows,
            total_count,
        } => {
            if origin == FetchOrigin::Requested {
                state.end_load();
            }
            let incoming = rows.len();
            match state.apply_page(generation, offset, rows, total_count) {
                Some(Merge::Unchanged) => {
                    console_debug!("Page at offset {} left rows unchanged", offset);
                }
                Some(merge) => {
                    console_debug!(
                        "Page at offset {} with {} rows merged as {:?}",
                        offset,
                        incoming,
                        merge
                    );
                }
                None => {
                    console_debug!(
                        "Dropped stale page generation={} current={}",
                        generation,
                        state.generation()
                    );
                }
            }
            Vec::new()
        }
        Msg::PageFailed {
            generation,
            offset,
            message,
        } => {
            state.end_load();
            if generation == state.generation() {
                console_warn!("Page at offset {} failed: {}", offset, message);
                state.set_error(message);
            }
            Vec::new()
        }
        Msg::AutoRefreshChanged { interval_ms } => {
            let interval_ms = interval_ms.filter(|ms| *ms > 0);
            state.set_auto_refresh(interval_ms);
            match (interval_ms, state.query().cloned()) {
                (Some(interval_ms), Some(query)) => vec![Effect::StartAutoRefresh {
                    generation: state.generation(),
                    query,
                    interval_ms,
                }],
                // Remembered until the first search.
                (Some(_), None) => Vec::new(),
                (None, _) => vec![Effect::StopAutoRefresh],
            }
        }
        Msg::AutoRefreshStopped {
            generation,
            message,
        } => {
            if generation != state.generation() {
                console_debug!(
                    "Ignored stop of superseded auto refresh generation={}",
                    generation
                );
                return (state, Vec::new());
            }
            console_info!("Auto refresh stopped: {}", message);
            state.set_auto_refresh(None);
            state.set_error(message);
            Vec::new()
        }
        Msg::TaskWatchRequested { process_id } => {
            let watch = state.watch_task(process_id);
            vec![Effect::WatchTask { process_id, watch }]
        }
        Msg::TaskWatchCancelled { process_id } => {
            if state.is_watching(process_id) {
                state.apply_task_settled(process_id, TaskOutcome::Cancelled);
                vec![Effect::CancelTaskWatch { process_id }]
            } else {
                Vec::new()
            }
        }
        Msg::TaskProgress {
            process_id,
            watch,
            status,
        } => {
            if state.is_current_watch(process_id, watch) {
                state.apply_task_progress(process_id, status);
            }
            Vec::new()
        }
        Msg::TaskSettled {
            process_id,
            watch,
            outcome,
        } => {
            if state.is_current_watch(process_id, watch) {
                if let TaskOutcome::Failed(message) = &outcome {
                    state.set_error(format!(
                        "task watch for process {process_id} failed: {message}"
                    ));
                }
                state.apply_task_settled(process_id, outcome);
            }
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
