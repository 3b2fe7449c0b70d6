use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

type WakeHook = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct ShutdownInner {
    triggered: Mutex<bool>,
    changed: Condvar,
    hooks: Mutex<Vec<WakeHook>>,
}

/// External interrupt flag shared between a signal handler and run loops.
#[derive(Clone, Default)]
pub struct Shutdown {
    inner: Arc<ShutdownInner>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag, wakes sleepers and runs every registered hook once.
    pub fn trigger(&self) {
        {
            let mut triggered = self.inner.triggered.lock();
            if *triggered {
                return;
            }
            info!("Shutdown requested");
            *triggered = true;
            self.inner.changed.notify_all();
        }

        let hooks = std::mem::take(&mut *self.inner.hooks.lock());
        for hook in hooks {
            hook();
        }
    }

    /// Registers `hook` to run on the triggering thread. Runs it right away
    /// if shutdown already fired. Hooks must not block.
    pub fn on_trigger(&self, hook: impl FnOnce() + Send + 'static) {
        {
            let mut hooks = self.inner.hooks.lock();
            if !*self.inner.triggered.lock() {
                hooks.push(Box::new(hook));
                return;
            }
        }
        hook();
    }

    pub fn is_triggered(&self) -> bool {
        *self.inner.triggered.lock()
    }

    /// Sleeps up to `timeout`, returning early (with `true`) once triggered.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut triggered = self.inner.triggered.lock();
        while !*triggered {
            if self.inner.changed.wait_until(&mut triggered, deadline).timed_out() {
                break;
            }
        }
        *triggered
    }
}
