use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe, Location};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanicStrategy {
    /// Capture the panic into the task outcome silently: no `tracing`
    /// event and no default panic message on stderr.
    Isolate,
    /// Capture the panic, emit a `warn` event, and leave the default panic
    /// output in place.
    #[default]
    LogAndContinue,
}

#[derive(Debug)]
pub struct PanicHandler {
    strategy: PanicStrategy,
    panic_count: AtomicUsize,
}

thread_local! {
    static LAST_LOCATION: RefCell<Option<String>> = const { RefCell::new(None) };
    // Set while an `Isolate` handler runs a closure on this thread.
    static SILENCED: Cell<bool> = const { Cell::new(false) };
}

fn silenced() -> bool {
    SILENCED.try_with(Cell::get).unwrap_or(false)
}

static LOCATION_HOOK: Once = Once::new();

// Chains onto the previous hook, which is skipped only for silenced threads.
fn install_location_hook() {
    LOCATION_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let location = info.location().map(Location::to_string);
            let _ = LAST_LOCATION.try_with(|slot| {
                if let Ok(mut slot) = slot.try_borrow_mut() {
                    *slot = location;
                }
            });
            if !silenced() {
                previous(info);
            }
        }));
    });
}

impl PanicHandler {
    pub fn new(strategy: PanicStrategy) -> Self {
        install_location_hook();
        Self {
            strategy,
            panic_count: AtomicUsize::new(0),
        }
    }

    pub fn execute<F, R>(&self, f: F) -> Result<R, PanicInfo>
    where
        F: FnOnce() -> R,
    {
        let silence = self.strategy == PanicStrategy::Isolate;
        let outer = SILENCED.try_with(|flag| flag.replace(silence)).unwrap_or(false);
        let caught = catch_unwind(AssertUnwindSafe(f));
        let _ = SILENCED.try_with(|flag| flag.set(outer));

        match caught {
            Ok(result) => Ok(result),
            Err(panic_payload) => {
                self.panic_count.fetch_add(1, Ordering::Relaxed);

                let panic_info = PanicInfo::from_payload(panic_payload);

                if self.strategy == PanicStrategy::LogAndContinue {
                    tracing::warn!(
                        panic = %panic_info.message,
                        location = panic_info.location.as_deref().unwrap_or("unknown"),
                        "task panicked"
                    );
                }

                Err(panic_info)
            }
        }
    }

    pub fn panic_count(&self) -> usize {
        self.panic_count.load(Ordering::Relaxed)
    }

    pub fn reset_count(&self) {
        self.panic_count.store(0, Ordering::Relaxed);
    }

    pub fn strategy(&self) -> PanicStrategy {
        self.strategy
    }
}

impl Default for PanicHandler {
    fn default() -> Self {
        Self::new(PanicStrategy::default())
    }
}

/// Message and source location recovered from a panic payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicInfo {
    pub message: String,
    pub location: Option<String>,
}

impl PanicInfo {
    fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        // A payload whose destructor panics must not take the thread down.
        let _ = catch_unwind(AssertUnwindSafe(move || drop(payload)));

        let location = LAST_LOCATION
            .try_with(|slot| slot.try_borrow_mut().ok().and_then(|mut s| s.take()))
            .ok()
            .flatten();

        Self { message, location }
    }
}

impl fmt::Display for PanicInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} (at {})", self.message, location),
            None => f.write_str(&self.message),
        }
    }
}
