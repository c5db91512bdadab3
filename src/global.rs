//! The process-wide task manager.
//!
//! Explicit [`TaskManager`] instances are the primary API. This module offers
//! one lazily created instance for code that has no manager injected.
//!
//! Rust never runs destructors for statics, so the process-wide manager is
//! not waited on automatically at exit. Hold a [`TeardownGuard`] in `main`
//! (see [`teardown_guard`]); dropping it blocks until every task spawned
//! through this module has finished, delaying process exit accordingly.

use crate::config::ManagerConfig;
use crate::error::{Error, Result};
use crate::handle::ResultHandle;
use crate::manager::TaskManager;
use std::sync::OnceLock;

static GLOBAL_MANAGER: OnceLock<TaskManager> = OnceLock::new();

/// Create the process-wide manager with a custom config.
///
/// Fails with [`Error::AlreadyInitialized`] once the instance exists, whether
/// it was created here or lazily by [`global`].
pub fn init_global(config: ManagerConfig) -> Result<()> {
    if GLOBAL_MANAGER.get().is_some() {
        return Err(Error::AlreadyInitialized);
    }

    let manager = TaskManager::with_config(config)?;
    GLOBAL_MANAGER
        .set(manager)
        .map_err(|_| Error::AlreadyInitialized)
}

/// The process-wide manager, created with the default config on first use.
pub fn global() -> &'static TaskManager {
    GLOBAL_MANAGER.get_or_init(TaskManager::new)
}

/// [`TaskManager::spawn`] on the process-wide manager.
pub fn spawn<F, T>(f: F) -> ResultHandle<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    global().spawn(f)
}

/// [`TaskManager::spawn_fallible`] on the process-wide manager.
pub fn spawn_fallible<F, T, E>(f: F) -> ResultHandle<T>
where
    F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    global().spawn_fallible(f)
}

/// [`TaskManager::wait_all`] on the process-wide manager.
///
/// Returns immediately if the manager was never created.
pub fn wait_all() {
    if let Some(manager) = GLOBAL_MANAGER.get() {
        manager.wait_all();
    }
}

/// Waits for the process-wide manager when dropped.
#[must_use = "the guard waits for global tasks only when it is dropped"]
#[derive(Debug)]
pub struct TeardownGuard {
    _private: (),
}

impl Drop for TeardownGuard {
    fn drop(&mut self) {
        if let Some(manager) = GLOBAL_MANAGER.get() {
            let outstanding = manager.live_count();
            if outstanding > 0 {
                tracing::debug!(outstanding, "waiting for global tasks at teardown");
            }
            manager.wait_all();
        }
    }
}

pub fn teardown_guard() -> TeardownGuard {
    TeardownGuard { _private: () }
}
