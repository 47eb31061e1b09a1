//! Crash hook registration.
//!
//! The facade registers a callback during initialization so that an open
//! session can be closed as crashed. Native hosts can forward their own
//! uncaught-exception handler through a custom [`CrashHookRegistrar`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once, OnceLock, Weak};

use parking_lot::RwLock;

/// Callback invoked with a human-readable crash description.
pub type CrashCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Registration point for crash notification.
///
/// Implementations may hold `on_crash` weakly; the caller keeps its own
/// clone alive for as long as it wants to be notified.
pub trait CrashHookRegistrar: Send + Sync {
    fn register(&self, on_crash: CrashCallback);
}

/// Ignores registrations. For headless hosts that have no crash reporting.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCrashHookRegistrar;

impl CrashHookRegistrar for NoopCrashHookRegistrar {
    fn register(&self, _on_crash: CrashCallback) {
        tracing::trace!("[crash] Ignoring crash hook registration");
    }
}

static PANIC_HOOK: Once = Once::new();
static PANIC_CALLBACKS: OnceLock<RwLock<CallbackList>> = OnceLock::new();

fn panic_callbacks() -> &'static RwLock<CallbackList> {
    PANIC_CALLBACKS.get_or_init(|| RwLock::new(CallbackList::default()))
}

/// Weakly held callbacks. Entries whose owner is gone are pruned on the
/// next registration.
#[derive(Default)]
struct CallbackList {
    callbacks: Vec<Weak<dyn Fn(&str) + Send + Sync>>,
}

impl CallbackList {
    fn register(&mut self, on_crash: &CrashCallback) {
        self.callbacks.retain(|callback| callback.strong_count() > 0);
        self.callbacks.push(Arc::downgrade(on_crash));
    }

    fn live(&self) -> Vec<CrashCallback> {
        self.callbacks.iter().filter_map(Weak::upgrade).collect()
    }

    fn len(&self) -> usize {
        self.callbacks.len()
    }
}

/// Whether a panic on `thread_name` takes the process down with it.
///
/// Under `panic = "abort"` every panic does. Otherwise only an unwinding
/// main thread ends the process; other threads just die (or are caught by
/// `catch_unwind` / a task runtime) and the app keeps running.
fn panic_terminates_process(thread_name: Option<&str>) -> bool {
    cfg!(panic = "abort") || thread_name == Some("main")
}

/// Routes process-ending Rust panics to registered callbacks.
///
/// The process-wide panic hook is installed on first registration and
/// chains to whatever hook was installed before it. Panics on other
/// threads are left to the previous hook. A main-thread panic the host
/// catches with `catch_unwind` is still reported, since the hook runs
/// before unwinding starts.
///
/// Callbacks are held weakly.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanicHookRegistrar;

impl CrashHookRegistrar for PanicHookRegistrar {
    fn register(&self, on_crash: CrashCallback) {
        panic_callbacks().write().register(&on_crash);

        PANIC_HOOK.call_once(|| {
            let previous = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                let thread = std::thread::current();
                if panic_terminates_process(thread.name()) {
                    let description = info.to_string();
                    tracing::error!("[crash] Uncaught panic: {}", description);

                    // try_read: the panicking thread may be mid-registration
                    let callbacks = panic_callbacks()
                        .try_read()
                        .map(|callbacks| callbacks.live())
                        .unwrap_or_default();
                    for callback in callbacks {
                        callback(&description);
                    }
                } else {
                    tracing::debug!(
                        "[crash] Panic on thread {:?} does not end the process",
                        thread.name()
                    );
                }

                previous(info);
            }));
            tracing::debug!("[crash] Panic hook installed");
        });
    }
}

/// Keeps callbacks so a test (or a host with its own crash signal) can fire
/// them on demand.
#[derive(Default)]
pub struct ManualCrashHookRegistrar {
    callbacks: RwLock<Vec<CrashCallback>>,
    fired: AtomicUsize,
}

impl ManualCrashHookRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registered_count(&self) -> usize {
        self.callbacks.read().len()
    }

    /// Number of times [`trigger`](Self::trigger) has run.
    pub fn fired_count(&self) -> usize {
        self.fired.load(Ordering::SeqCst)
    }

    /// Invoke every registered callback with `description`.
    pub fn trigger(&self, description: &str) {
        self.fired.fetch_add(1, Ordering::SeqCst);
        let callbacks: Vec<CrashCallback> = self.callbacks.read().clone();
        for callback in callbacks {
            callback(description);
        }
    }
}

impl CrashHookRegistrar for ManualCrashHookRegistrar {
    fn register(&self, on_crash: CrashCallback) {
        self.callbacks.write().push(on_crash);
    }
}
