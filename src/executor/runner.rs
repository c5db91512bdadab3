// code that runs on each spawned task thread
use super::task::TaskId;
use crate::error::TaskError;
use crate::handle::{Outcome, Slot};
use crate::manager::{ManagerId, Tracker};
use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

thread_local! {
    static CURRENT_MANAGER: Cell<Option<ManagerId>> = const { Cell::new(None) };
}

/// The manager whose task is running on this thread, if any.
pub(crate) fn current_manager() -> Option<ManagerId> {
    CURRENT_MANAGER.try_with(Cell::get).ok().flatten()
}

/// Keeps one unit of a manager's live count until dropped.
pub(crate) struct LiveGuard {
    tracker: Arc<Tracker>,
}

impl LiveGuard {
    pub(crate) fn enter(tracker: Arc<Tracker>) -> (Self, usize) {
        let live = tracker.enter();
        (Self { tracker }, live)
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.tracker.leave();
    }
}

pub(crate) struct TaskRunner<T> {
    id: TaskId,
    slot: Arc<Slot<T>>,
    // Must stay the last field: the count drops only after the slot is filled.
    guard: LiveGuard,
}

impl<T> TaskRunner<T> {
    pub(crate) fn new(id: TaskId, slot: Arc<Slot<T>>, guard: LiveGuard) -> Self {
        Self { id, slot, guard }
    }

    pub(crate) fn run<F, E>(self, f: F)
    where
        F: FnOnce() -> Result<T, E>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let tracker = &self.guard.tracker;
        let _ = CURRENT_MANAGER.try_with(|current| current.set(Some(tracker.id())));

        let start = Instant::now();
        let outcome = match tracker.panic_handler().execute(f) {
            Ok(Ok(value)) => Outcome::Value(value),
            Ok(Err(err)) => {
                tracker.metrics().record_task_failed();
                tracing::debug!(task = %self.id, error = %err, "task returned an error");
                Outcome::Failure(TaskError::failed(err))
            }
            Err(info) => {
                tracker.metrics().record_task_panic();
                Outcome::Failure(TaskError::Panicked(info))
            }
        };
        let elapsed = start.elapsed();

        // Nothing above us can handle a failure from here on; swallow it.
        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _ = self.slot.publish(outcome);
        }));

        tracker.metrics().record_task_completed(elapsed.as_nanos() as u64);
        tracing::trace!(task = %self.id, elapsed_us = elapsed.as_micros() as u64, "task finished");
    }

    /// Give up on a task whose thread could not be created.
    pub(crate) fn abandon(self, err: &std::io::Error) {
        let _ = self
            .slot
            .publish(Outcome::Failure(TaskError::Spawn(err.to_string())));
        self.guard.tracker.metrics().record_task_not_started();
    }
}

impl<T> Drop for TaskRunner<T> {
    fn drop(&mut self) {
        // Only reachable unpublished when the closure never ran and
        // `abandon` was not called either.
        if !self.slot.is_published() {
            let _ = self.slot.publish(Outcome::Failure(TaskError::Spawn(
                "task thread was never started".to_string(),
            )));
        }
    }
}
