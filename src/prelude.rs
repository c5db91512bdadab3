pub use crate::config::{ManagerConfig, ManagerConfigBuilder};
pub use crate::error::{Error, Result, TaskError};
pub use crate::executor::PanicStrategy;
pub use crate::handle::{ResultHandle, WaitStatus};
pub use crate::manager::TaskManager;

pub use crate::global::{teardown_guard, TeardownGuard};

pub use crate::telemetry::MetricsSnapshot;
