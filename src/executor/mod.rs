//! Task execution infrastructure.
//!
//! Task identity, panic capture, and the runner that executes a task on its
//! own thread and reports back to the manager.

pub mod panic_handler;
pub(crate) mod runner;
pub mod task;

pub use panic_handler::{PanicHandler, PanicInfo, PanicStrategy};
pub use task::TaskId;
