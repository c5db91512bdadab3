//! One-shot, shareable result handles.
//!
//! A [`ResultHandle`] is the caller's view of a task's eventual outcome.
//! Dropping it never blocks: the handle owns no thread, only a reference to
//! the slot the task publishes into.

use crate::error::TaskError;
use crate::executor::TaskId;
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What a wait on a [`ResultHandle`] observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    /// The task has published its outcome.
    Ready,
    /// The bound elapsed before the task finished.
    Timeout,
    /// The outcome was supplied up front by `spawn_with_result`.
    Deferred,
}

pub(crate) enum Outcome<T> {
    Value(T),
    Failure(TaskError),
}

impl<T: Clone> Outcome<T> {
    fn cloned(&self) -> Result<T, TaskError> {
        match self {
            Outcome::Value(value) => Ok(value.clone()),
            Outcome::Failure(err) => Err(err.clone()),
        }
    }
}

/// Single-assignment slot shared between a task and its observers.
pub(crate) struct Slot<T> {
    outcome: Mutex<Option<Outcome<T>>>,
    ready: Condvar,
    deferred: bool,
}

impl<T> Slot<T> {
    pub(crate) fn pending() -> Self {
        Self {
            outcome: Mutex::new(None),
            ready: Condvar::new(),
            deferred: false,
        }
    }

    fn completed(value: T) -> Self {
        Self {
            outcome: Mutex::new(Some(Outcome::Value(value))),
            ready: Condvar::new(),
            deferred: true,
        }
    }

    /// Store the outcome and wake every observer.
    ///
    /// A slot is written at most once; a second outcome is handed back.
    pub(crate) fn publish(&self, outcome: Outcome<T>) -> Result<(), Outcome<T>> {
        let mut slot = self.outcome.lock();
        if slot.is_some() {
            return Err(outcome);
        }
        *slot = Some(outcome);
        drop(slot);
        self.ready.notify_all();
        Ok(())
    }

    pub(crate) fn is_published(&self) -> bool {
        self.outcome.lock().is_some()
    }

    /// Block until published or until `deadline` passes. Returns readiness.
    fn wait_deadline(&self, deadline: Option<Instant>) -> bool {
        let mut slot = self.outcome.lock();
        while slot.is_none() {
            match deadline {
                Some(deadline) => {
                    if self.ready.wait_until(&mut slot, deadline).timed_out() {
                        return slot.is_some();
                    }
                }
                None => self.ready.wait(&mut slot),
            }
        }
        true
    }

    fn inspect<R>(&self, f: impl FnOnce(&Outcome<T>) -> R) -> R {
        let mut slot = self.outcome.lock();
        loop {
            if let Some(outcome) = slot.as_ref() {
                return f(outcome);
            }
            self.ready.wait(&mut slot);
        }
    }

    fn try_inspect<R>(&self, f: impl FnOnce(&Outcome<T>) -> R) -> Option<R> {
        self.outcome.lock().as_ref().map(f)
    }
}

/// Shareable handle to the eventual value or failure of a task.
///
/// Cloning is cheap and every clone observes the same outcome. A handle that
/// is dropped unread never blocks and never joins the task's thread.
pub struct ResultHandle<T> {
    id: Option<TaskId>,
    slot: Option<Arc<Slot<T>>>,
}

impl<T> ResultHandle<T> {
    pub(crate) fn from_slot(id: TaskId, slot: Arc<Slot<T>>) -> Self {
        Self {
            id: Some(id),
            slot: Some(slot),
        }
    }

    /// An already-completed handle holding `value`.
    pub(crate) fn ready(value: T) -> Self {
        Self {
            id: None,
            slot: Some(Arc::new(Slot::completed(value))),
        }
    }

    fn slot(&self) -> Result<&Slot<T>, TaskError> {
        self.slot.as_deref().ok_or(TaskError::InvalidHandle)
    }

    /// Identifier of the task feeding this handle, if any.
    pub fn id(&self) -> Option<TaskId> {
        self.id
    }

    /// Whether this handle refers to an outcome slot at all.
    pub fn valid(&self) -> bool {
        self.slot.is_some()
    }

    /// Non-blocking readiness check.
    pub fn is_ready(&self) -> bool {
        self.slot.as_ref().is_some_and(|slot| slot.is_published())
    }

    /// Move the slot out, leaving `self` invalid.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Block until the outcome is available.
    pub fn wait(&self) -> Result<WaitStatus, TaskError> {
        self.wait_deadline(None)
    }

    /// Block for at most `timeout`.
    pub fn wait_for(&self, timeout: Duration) -> Result<WaitStatus, TaskError> {
        // An unrepresentable deadline is as good as no deadline.
        self.wait_deadline(Instant::now().checked_add(timeout))
    }

    /// Block until `deadline` at the latest.
    pub fn wait_until(&self, deadline: Instant) -> Result<WaitStatus, TaskError> {
        self.wait_deadline(Some(deadline))
    }

    fn wait_deadline(&self, deadline: Option<Instant>) -> Result<WaitStatus, TaskError> {
        let slot = self.slot()?;
        if slot.deferred {
            return Ok(WaitStatus::Deferred);
        }
        if slot.wait_deadline(deadline) {
            Ok(WaitStatus::Ready)
        } else {
            Ok(WaitStatus::Timeout)
        }
    }

    /// Block until the outcome is available and borrow it.
    ///
    /// Useful when `T` is not `Clone`. The slot stays locked while `f` runs.
    pub fn inspect<R>(&self, f: impl FnOnce(Result<&T, &TaskError>) -> R) -> Result<R, TaskError> {
        let slot = self.slot()?;
        Ok(slot.inspect(|outcome| match outcome {
            Outcome::Value(value) => f(Ok(value)),
            Outcome::Failure(err) => f(Err(err)),
        }))
    }
}

impl<T: Clone> ResultHandle<T> {
    /// Block until the task finishes and return a copy of its value, or the
    /// failure it raised.
    pub fn get(&self) -> Result<T, TaskError> {
        self.slot()?.inspect(Outcome::cloned)
    }

    /// Return the outcome if it is already published.
    pub fn try_get(&self) -> Option<Result<T, TaskError>> {
        match self.slot() {
            Ok(slot) => slot.try_inspect(Outcome::cloned),
            Err(err) => Some(Err(err)),
        }
    }
}

impl<T> Clone for ResultHandle<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            slot: self.slot.clone(),
        }
    }
}

impl<T> Default for ResultHandle<T> {
    fn default() -> Self {
        Self { id: None, slot: None }
    }
}

impl<T> fmt::Debug for ResultHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.slot {
            None => "invalid",
            Some(slot) if slot.is_published() => "ready",
            Some(_) => "pending",
        };
        f.debug_struct("ResultHandle")
            .field("id", &self.id)
            .field("state", &state)
            .finish()
    }
}
