use crate::executor::PanicInfo;
use std::fmt;
use std::sync::Arc;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the manager itself, never by a task.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("already initialized")]
    AlreadyInitialized,
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }
}

/// The failure side of a task outcome.
///
/// Cloned out to every observer of a [`ResultHandle`](crate::ResultHandle),
/// so user errors are kept behind an `Arc`.
#[derive(Clone, thiserror::Error)]
pub enum TaskError {
    #[error("task panicked: {0}")]
    Panicked(PanicInfo),

    #[error("task failed: {0}")]
    Failed(Arc<dyn std::error::Error + Send + Sync + 'static>),

    #[error("failed to spawn task thread: {0}")]
    Spawn(String),

    #[error("result handle does not refer to a task outcome")]
    InvalidHandle,
}

impl TaskError {
    pub(crate) fn failed<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        TaskError::Failed(Arc::new(err))
    }

    /// Recover the error a fallible task returned.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            TaskError::Failed(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, TaskError::Panicked(_))
    }

    pub fn panic_message(&self) -> Option<&str> {
        match self {
            TaskError::Panicked(info) => Some(&info.message),
            _ => None,
        }
    }
}

impl fmt::Debug for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::Panicked(info) => f.debug_tuple("Panicked").field(info).finish(),
            TaskError::Failed(err) => f.debug_tuple("Failed").field(&err.to_string()).finish(),
            TaskError::Spawn(msg) => f.debug_tuple("Spawn").field(msg).finish(),
            TaskError::InvalidHandle => f.write_str("InvalidHandle"),
        }
    }
}
