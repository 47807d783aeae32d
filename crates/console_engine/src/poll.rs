//! Timer-driven polling on the tokio runtime.
//!
//! Two loops live here. [`start_polling`] keeps calling a fetch on a fixed
//! interval and only gives up after `max_retries` consecutive failures.
//! [`poll_task`] re-checks a task until a predicate says the awaited state
//! has been reached, failing fast on the first fetch error.
//!
//! Each loop runs as one spawned task, so iteration N+1 never starts before
//! iteration N has been processed. Cancellation is a flag checked at every
//! resumption point: an in-flight fetch is allowed to finish and its result
//! is thrown away.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use console_logging::{console_debug, console_error, console_trace, console_warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_TASK_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// Consecutive failures tolerated before the loop stops. Zero acts as one.
    pub max_retries: u32,
}

impl PollSettings {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Cancels a polling loop. Dropping the handle leaves the loop running.
#[derive(Debug, Clone)]
pub struct PollHandle {
    token: CancellationToken,
}

impl PollHandle {
    /// Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// False once cancelled or once the loop has stopped on its own.
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }
}

/// Poll `fetch` every `settings.interval`.
///
/// The first fetch runs on the spawned task without waiting an interval, so
/// it starts as soon as the caller yields to the runtime rather than inside
/// this call.
///
/// `on_success` runs for every successful fetch and resets the failure count.
/// `on_error` runs at most once, with the error that exhausted the budget;
/// the loop is finished after that. Cancellation never invokes either callback.
///
/// Must be called from within a tokio runtime.
pub fn start_polling<T, E, F, Fut, S, X>(
    settings: PollSettings,
    mut fetch: F,
    mut on_success: S,
    on_error: X,
) -> PollHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: fmt::Display + Send + 'static,
    S: FnMut(T) + Send + 'static,
    X: FnOnce(E) + Send + 'static,
{
    let token = CancellationToken::new();
    let loop_token = token.clone();
    let budget = settings.max_retries.max(1);

    tokio::spawn(async move {
        let mut failures = 0u32;
        loop {
            let outcome = fetch().await;
            if loop_token.is_cancelled() {
                console_debug!("Polling cancelled, discarding in-flight result");
                return;
            }
            match outcome {
                Ok(value) => {
                    failures = 0;
                    on_success(value);
                }
                Err(err) => {
                    failures += 1;
                    if failures >= budget {
                        console_error!(
                            "Polling stopped after {} consecutive failures: {}",
                            failures,
                            err
                        );
                        loop_token.cancel();
                        on_error(err);
                        return;
                    }
                    console_warn!("Poll failed ({}/{}): {}", failures, budget, err);
                }
            }

            tokio::select! {
                _ = loop_token.cancelled() => return,
                _ = tokio::time::sleep(settings.interval) => {}
            }
        }
    });

    PollHandle { token }
}

/// Why a [`poll_task`] loop did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollError<E> {
    #[error("polling cancelled")]
    Cancelled,
    #[error("max attempts reached ({attempts})")]
    Exhausted { attempts: u32 },
    #[error("task failed: {0}")]
    Task(E),
    /// The polling task panicked or its runtime shut down.
    #[error("polling task aborted")]
    Aborted,
}

type Predicate<T> = Box<dyn FnMut(&T) -> bool + Send>;
type Progress<T> = Box<dyn FnMut(&T) + Send>;

pub struct PollOptions<T> {
    pub interval: Duration,
    pub max_attempts: u32,
    /// `true` means "not ready yet, check again".
    pub should_continue: Predicate<T>,
    pub on_progress: Option<Progress<T>>,
}

impl<T> PollOptions<T> {
    pub fn new(should_continue: impl FnMut(&T) -> bool + Send + 'static) -> Self {
        Self {
            interval: DEFAULT_TASK_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            should_continue: Box::new(should_continue),
            on_progress: None,
        }
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn on_progress(mut self, on_progress: impl FnMut(&T) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(on_progress));
        self
    }
}

impl<T> fmt::Debug for PollOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollOptions")
            .field("interval", &self.interval)
            .field("max_attempts", &self.max_attempts)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// A running [`poll_task`] loop.
pub struct PollTask<T, E> {
    handle: JoinHandle<Result<T, PollError<E>>>,
    token: CancellationToken,
}

impl<T, E> PollTask<T, E> {
    /// Idempotent. Interrupts a pending interval timer right away.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// A detached handle that can cancel this loop after `join` took ownership.
    pub fn canceller(&self) -> PollHandle {
        PollHandle {
            token: self.token.clone(),
        }
    }

    pub async fn join(self) -> Result<T, PollError<E>> {
        match self.handle.await {
            Ok(result) => result,
            Err(err) => {
                console_error!("Polling task did not complete: {}", err);
                Err(PollError::Aborted)
            }
        }
    }
}

/// Call `task` until `should_continue` returns false, at most
/// `max_attempts` times, waiting `interval` between attempts.
///
/// Must be called from within a tokio runtime.
pub fn poll_task<T, E, F, Fut>(task: F, options: PollOptions<T>) -> PollTask<T, E>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let token = CancellationToken::new();
    let handle = tokio::spawn(run_attempts(task, options, token.clone()));
    PollTask { handle, token }
}

async fn run_attempts<T, E, F, Fut>(
    mut task: F,
    options: PollOptions<T>,
    token: CancellationToken,
) -> Result<T, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let PollOptions {
        interval,
        max_attempts,
        mut should_continue,
        mut on_progress,
    } = options;
    let mut remaining = max_attempts;

    loop {
        if token.is_cancelled() {
            return Err(PollError::Cancelled);
        }
        if remaining == 0 {
            console_debug!("Giving up after {} attempts", max_attempts);
            return Err(PollError::Exhausted {
                attempts: max_attempts,
            });
        }

        console_trace!("Attempt {}/{}", max_attempts - remaining + 1, max_attempts);
        let outcome = task().await;
        if token.is_cancelled() {
            return Err(PollError::Cancelled);
        }
        let result = outcome.map_err(PollError::Task)?;

        if let Some(on_progress) = on_progress.as_mut() {
            on_progress(&result);
        }
        if !should_continue(&result) {
            return Ok(result);
        }
        remaining -= 1;

        tokio::select! {
            _ = token.cancelled() => return Err(PollError::Cancelled),
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
