//! The task manager: detached spawning plus group-level wait.

use crate::config::ManagerConfig;
use crate::error::Result;
use crate::executor::runner::{self, LiveGuard, TaskRunner};
use crate::executor::{PanicHandler, TaskId};
use crate::handle::{ResultHandle, Slot};
use crate::telemetry::{Metrics, MetricsSnapshot};
use parking_lot::{Condvar, Mutex};
use std::convert::Infallible;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

static MANAGER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifies one [`TaskManager`] for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ManagerId(u64);

impl ManagerId {
    fn next() -> Self {
        ManagerId(MANAGER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ManagerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
struct TrackerState {
    live: usize,
    // bumped every time `live` reaches zero
    drained_epoch: u64,
    // tasks of this manager currently blocked in `wait_drained`
    waiting_own: usize,
}

/// Live-task counter shared between a manager and its running tasks.
pub(crate) struct Tracker {
    id: ManagerId,
    state: Mutex<TrackerState>,
    drained: Condvar,
    panic_handler: PanicHandler,
    metrics: Metrics,
}

impl Tracker {
    fn new(config: &ManagerConfig) -> Self {
        Self {
            id: ManagerId::next(),
            state: Mutex::new(TrackerState {
                live: 0,
                drained_epoch: 0,
                waiting_own: 0,
            }),
            drained: Condvar::new(),
            panic_handler: PanicHandler::new(config.panic_strategy),
            metrics: Metrics::new(),
        }
    }

    pub(crate) fn id(&self) -> ManagerId {
        self.id
    }

    pub(crate) fn panic_handler(&self) -> &PanicHandler {
        &self.panic_handler
    }

    pub(crate) fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub(crate) fn enter(&self) -> usize {
        let mut state = self.state.lock();
        state.live += 1;
        state.live
    }

    pub(crate) fn leave(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.live > 0, "live task count underflow");
        state.live = state.live.saturating_sub(1);
        if state.live == 0 {
            state.drained_epoch = state.drained_epoch.wrapping_add(1);
        }
        self.drained.notify_all();
    }

    fn live(&self) -> usize {
        self.state.lock().live
    }

    /// Block until the count drains, or until it has hit zero at least once
    /// since the call started.
    ///
    /// With `own_task` set the caller is one of this manager's tasks. Tasks
    /// blocked here cannot finish, so the predicate only asks for every
    /// remaining task to be such a waiter.
    ///
    /// Returns `false` only if `deadline` passed first.
    fn wait_drained(&self, own_task: bool, deadline: Option<Instant>) -> bool {
        let mut state = self.state.lock();
        let epoch = state.drained_epoch;

        if own_task {
            state.waiting_own += 1;
            // Our arrival may be what the other self-waiters were missing.
            self.drained.notify_all();
        }

        let floor = |state: &TrackerState| if own_task { state.waiting_own } else { 0 };
        let mut drained = true;
        while state.live > floor(&*state) && state.drained_epoch == epoch {
            match deadline {
                Some(deadline) => {
                    if self.drained.wait_until(&mut state, deadline).timed_out() {
                        drained = state.live <= floor(&*state) || state.drained_epoch != epoch;
                        break;
                    }
                }
                None => self.drained.wait(&mut state),
            }
        }

        if own_task {
            state.waiting_own -= 1;
        }
        drained
    }
}

/// Spawns each task on its own detached thread and tracks how many are
/// still running.
///
/// Dropping a `ResultHandle` never blocks. Dropping the manager does: it
/// waits for every task it spawned, exactly like [`TaskManager::wait_all`].
///
/// # Teardown hazard
///
/// Tasks that reach into state with a shorter lifetime than the manager
/// (for example through raw pointers or leaked references) must be waited
/// for explicitly before that state goes away.
pub struct TaskManager {
    tracker: Arc<Tracker>,
    config: ManagerConfig,
}

impl TaskManager {
    pub fn new() -> Self {
        Self::from_valid_config(ManagerConfig::default())
    }

    pub fn with_config(config: ManagerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: ManagerConfig) -> Self {
        Self {
            tracker: Arc::new(Tracker::new(&config)),
            config,
        }
    }

    pub fn id(&self) -> ManagerId {
        self.tracker.id()
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Run `f` on a new detached thread.
    ///
    /// Returns immediately. A panic inside `f` is delivered through the
    /// handle as [`TaskError::Panicked`](crate::TaskError::Panicked).
    pub fn spawn<F, T>(&self, f: F) -> ResultHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.launch(move || Ok::<T, Infallible>(f()))
    }

    /// Like [`spawn`](Self::spawn), for closures that report failure through
    /// `Err`. The error can be recovered with
    /// [`TaskError::downcast_ref`](crate::TaskError::downcast_ref).
    pub fn spawn_fallible<F, T, E>(&self, f: F) -> ResultHandle<T>
    where
        F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        self.launch(f)
    }

    /// Wrap an already-known value so it can be handled like a task result.
    /// No thread is started and the live count is untouched.
    pub fn spawn_with_result<T>(&self, value: T) -> ResultHandle<T> {
        ResultHandle::ready(value)
    }

    fn launch<F, T, E>(&self, f: F) -> ResultHandle<T>
    where
        F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        let id = TaskId::next();
        let slot = Arc::new(Slot::pending());
        let handle = ResultHandle::from_slot(id, slot.clone());

        let (guard, live) = LiveGuard::enter(self.tracker.clone());
        self.tracker.metrics().record_task_spawned();
        // Shared with the thread closure so a failed spawn leaves the runner
        // here, where the OS error can be published through it.
        let task = Arc::new(Mutex::new(Some(TaskRunner::new(id, slot, guard))));
        let thread_task = task.clone();

        let name = format!("{}-{}", self.config.thread_name_prefix, id);
        let mut builder = thread::Builder::new().name(name.clone());

        if let Some(stack_size) = self.config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        // The JoinHandle is dropped right away; the thread is detached.
        let spawned = builder.spawn(move || {
            let runner = thread_task.lock().take();
            if let Some(runner) = runner {
                runner.run(f);
            }
        });

        match spawned {
            Ok(_) => {
                tracing::debug!(manager = %self.id(), task = %id, thread = %name, live, "spawned task");
            }
            Err(err) => {
                tracing::error!(manager = %self.id(), task = %id, error = %err, "failed to spawn task thread");
                let runner = task.lock().take();
                if let Some(runner) = runner {
                    runner.abandon(&err);
                }
            }
        }

        handle
    }

    /// Number of tasks spawned through this manager that have not finished.
    pub fn live_count(&self) -> usize {
        self.tracker.live()
    }

    /// Block until every task spawned through this manager has finished.
    ///
    /// Any number of threads may wait at once; all of them are released when
    /// the count reaches zero. Tasks spawned after that point need a new call.
    pub fn wait_all(&self) {
        self.tracker.wait_drained(self.is_own_task(), None);
    }

    /// Bounded [`wait_all`](Self::wait_all). Returns `true` if the manager
    /// drained before `timeout` elapsed. Running tasks are unaffected either way.
    pub fn wait_all_timeout(&self, timeout: Duration) -> bool {
        let own_task = self.is_own_task();
        self.tracker
            .wait_drained(own_task, Instant::now().checked_add(timeout))
    }

    /// Total tasks spawned through this manager that panicked.
    pub fn panic_count(&self) -> usize {
        self.tracker.panic_handler().panic_count()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.tracker.metrics().snapshot()
    }

    // A task waiting on its own manager would wait for itself forever.
    fn is_own_task(&self) -> bool {
        let own_task = runner::current_manager() == Some(self.id());
        if own_task {
            tracing::warn!(
                manager = %self.id(),
                "waiting on a task manager from one of its own tasks; waiting tasks are excluded"
            );
        }
        own_task
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TaskManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskManager")
            .field("id", &self.id())
            .field("live", &self.live_count())
            .field("config", &self.config)
            .finish()
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        let outstanding = self.live_count();
        if outstanding > 0 {
            tracing::debug!(manager = %self.id(), outstanding, "waiting for tasks before dropping manager");
        }
        self.wait_all();
    }
}
