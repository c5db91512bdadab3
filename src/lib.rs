//! strand - detached task threads with a group-level wait
//!
//! Every task runs on its own OS thread and reports back through a
//! [`ResultHandle`]. Unlike a joining thread handle, dropping a
//! `ResultHandle` never blocks. Blocking happens only where you ask for it:
//! reading a handle, calling [`TaskManager::wait_all`], or dropping the
//! [`TaskManager`] that spawned the tasks.
//!
//! # Quick Start
//!
//! ```no_run
//! use strand::prelude::*;
//!
//! let manager = TaskManager::new();
//!
//! let answer = manager.spawn(|| 21 * 2);
//! let failing = manager.spawn(|| -> u32 { panic!("boom") });
//!
//! // Fire and forget: the handle can be dropped right away.
//! let _ = manager.spawn(|| std::thread::sleep(std::time::Duration::from_millis(10)));
//!
//! assert_eq!(answer.get().unwrap(), 42);
//! assert_eq!(failing.get().unwrap_err().panic_message(), Some("boom"));
//!
//! manager.wait_all();
//! assert_eq!(manager.live_count(), 0);
//! ```
//!
//! # Features
//!
//! - **Non-blocking handles**: polling, bounded and unbounded waits, shared readers
//! - **Failure propagation**: panics and `Err` values surface from `get()`
//! - **Group wait**: `wait_all` from any number of threads, implicit on drop
//! - **Process-wide instance**: [`global`] with an explicit teardown guard
//! - **Telemetry**: per-manager counters and latency histogram (optional)

// Lint configuration
#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod executor;
pub mod global;
pub mod handle;
pub mod manager;
pub mod prelude;
pub mod telemetry;

// Re-export key types at crate root
pub use config::{ManagerConfig, ManagerConfigBuilder};
pub use error::{Error, Result, TaskError};
pub use executor::{PanicInfo, PanicStrategy, TaskId};
pub use global::{global, init_global, spawn, spawn_fallible, teardown_guard, wait_all, TeardownGuard};
pub use handle::{ResultHandle, WaitStatus};
pub use manager::{ManagerId, TaskManager};
