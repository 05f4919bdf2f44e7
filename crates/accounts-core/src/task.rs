//! Async operation state tracking.
//!
//! A [`Task`] wraps one kind of remote call (login, send code, ...) with
//! `in_progress`/`last_error` state. Nothing prevents a second `run` while one
//! is in flight; hosts disable the triggering control while
//! [`Task::is_running`] is true.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Observable state of a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskState {
    pub in_progress: bool,
    pub last_error: Option<String>,
}

/// Failure of a single `run`.
#[derive(Debug)]
pub enum TaskError<E> {
    /// The wrapped call failed; the message was recorded as `last_error`.
    Failed(E),
    /// The owner was torn down while the call was in flight. The result was
    /// discarded; `in_progress` is cleared and `last_error` left as is.
    Abandoned,
}

/// Remote operation with input `I` and output `O`.
pub struct Task<I, O> {
    name: &'static str,
    state: watch::Sender<TaskState>,
    alive: CancellationToken,
    _io: PhantomData<fn(I) -> O>,
}

impl<I, O> Task<I, O> {
    /// Creates a task bound to its owner's liveness token.
    pub fn new(name: &'static str, alive: CancellationToken) -> Self {
        Self {
            name,
            state: watch::Sender::new(TaskState::default()),
            alive,
            _io: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> TaskState {
        self.state.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().in_progress
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.borrow().last_error.clone()
    }

    /// Receiver that observes every state change, including while in flight.
    pub fn subscribe(&self) -> watch::Receiver<TaskState> {
        self.state.subscribe()
    }

    /// Runs `call` with `input`, tracking progress and recording failures.
    ///
    /// The error is handed back to the caller as well as recorded, so a step
    /// can stop on failure.
    pub async fn run<F, Fut, E>(&self, input: I, call: F) -> Result<O, TaskError<E>>
    where
        F: FnOnce(I) -> Fut,
        Fut: Future<Output = Result<O, E>>,
        E: fmt::Display,
    {
        self.state.send_replace(TaskState {
            in_progress: true,
            last_error: None,
        });
        tracing::debug!(task = self.name, "task started");

        let result = call(input).await;

        if self.alive.is_cancelled() {
            tracing::warn!(task = self.name, "discarding response after teardown");
            self.state.send_modify(|state| state.in_progress = false);
            return Err(TaskError::Abandoned);
        }

        match result {
            Ok(output) => {
                self.state.send_modify(|state| state.in_progress = false);
                tracing::debug!(task = self.name, "task succeeded");
                Ok(output)
            }
            Err(err) => {
                let message = err.to_string();
                tracing::debug!(task = self.name, error = %message, "task failed");
                self.state.send_modify(|state| {
                    state.in_progress = false;
                    state.last_error = Some(message);
                });
                Err(TaskError::Failed(err))
            }
        }
    }

    /// Records a failure that happened after the call itself succeeded, such
    /// as persisting its result.
    pub fn record_error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(task = self.name, error = %message, "task failed after call");
        self.state.send_modify(|state| {
            state.in_progress = false;
            state.last_error = Some(message);
        });
    }

    /// Clears `last_error`, leaving `in_progress` alone.
    pub fn clear_error(&self) {
        self.state.send_if_modified(|state| state.last_error.take().is_some());
    }

    /// Clears both fields unconditionally.
    pub fn reset(&self) {
        self.state.send_replace(TaskState::default());
    }
}

impl<I, O> fmt::Debug for Task<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn task() -> (Task<u32, u32>, CancellationToken) {
        let alive = CancellationToken::new();
        (Task::new("double", alive.clone()), alive)
    }

    #[tokio::test]
    async fn test_success_clears_progress() {
        let (task, _alive) = task();
        let out = task
            .run(21, |n| async move { Ok::<_, String>(n * 2) })
            .await
            .unwrap();

        assert_eq!(out, 42);
        assert_eq!(task.state(), TaskState::default());
    }

    #[tokio::test]
    async fn test_failure_records_and_resignals() {
        let (task, _alive) = task();
        let result = task
            .run(1, |_| async { Err::<u32, _>("boom".to_string()) })
            .await;

        assert!(matches!(result, Err(TaskError::Failed(ref e)) if e == "boom"));
        assert!(!task.is_running());
        assert_eq!(task.last_error().as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_run_clears_previous_error() {
        let (task, _alive) = task();
        let _ = task.run(1, |_| async { Err::<u32, _>("first") }).await;
        let mut rx = task.subscribe();

        let ok = task.run(2, |n| async move { Ok::<_, &str>(n) }).await;
        assert!(ok.is_ok());
        assert_eq!(task.last_error(), None);
        assert!(rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_in_progress_visible_while_in_flight() {
        let (task, _alive) = task();
        let rx = task.subscribe();

        let observer = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            rx.borrow().in_progress
        };
        let call = task.run(1, |n| async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, String>(n)
        });

        let (seen, result) = tokio::join!(observer, call);
        assert!(seen);
        assert!(result.is_ok());
        assert!(!task.is_running());
    }

    #[tokio::test]
    async fn test_teardown_discards_result() {
        let (task, alive) = task();
        let result = task
            .run(1, |_| async {
                alive.cancel();
                Err::<u32, _>("late failure")
            })
            .await;

        assert!(matches!(result, Err(TaskError::Abandoned)));
        assert_eq!(task.last_error(), None);
        assert!(!task.is_running());
    }

    #[tokio::test]
    async fn test_record_error_after_success() {
        let (task, _alive) = task();
        task.run(1, |n| async move { Ok::<_, String>(n) })
            .await
            .unwrap();

        task.record_error("Failed to save session: disk full");
        assert!(!task.is_running());
        assert_eq!(
            task.last_error().as_deref(),
            Some("Failed to save session: disk full")
        );
    }

    #[tokio::test]
    async fn test_clear_error_and_reset() {
        let (task, _alive) = task();
        let _ = task.run(1, |_| async { Err::<u32, _>("nope") }).await;

        task.clear_error();
        assert_eq!(task.last_error(), None);

        let _ = task.run(1, |_| async { Err::<u32, _>("again") }).await;
        task.reset();
        assert_eq!(task.state(), TaskState::default());
    }
}
