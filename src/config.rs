use crate::error::{Error, Result};
use crate::executor::PanicStrategy;

/// Smallest stack a task thread may request.
pub const MIN_STACK_SIZE: usize = 16 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    pub thread_name_prefix: String,
    /// `None` leaves the platform default in place.
    pub stack_size: Option<usize>,
    pub panic_strategy: PanicStrategy,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            thread_name_prefix: "strand-task".to_string(),
            stack_size: None,
            panic_strategy: PanicStrategy::default(),
        }
    }
}

impl ManagerConfig {
    pub fn builder() -> ManagerConfigBuilder {
        ManagerConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if self.thread_name_prefix.is_empty() {
            return Err(Error::config("thread_name_prefix must not be empty"));
        }

        if self.thread_name_prefix.contains('\0') {
            return Err(Error::config("thread_name_prefix must not contain NUL bytes"));
        }

        if let Some(size) = self.stack_size {
            if size < MIN_STACK_SIZE {
                return Err(Error::config(format!(
                    "stack_size must be at least {} bytes",
                    MIN_STACK_SIZE
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ManagerConfigBuilder {
    config: ManagerConfig,
}

impl ManagerConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ManagerConfig::default(),
        }
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn panic_strategy(mut self, strategy: PanicStrategy) -> Self {
        self.config.panic_strategy = strategy;
        self
    }

    pub fn build(self) -> Result<ManagerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
