//! Shutdown signalling for a consumer instance, plus the per-thread
//! cancellation mark that blocked queue callers are left with when a shutdown
//! unparks them.

use std::cell::Cell;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, Sender, bounded};

thread_local! {
    static CANCELLED: Cell<bool> = const { Cell::new(false) };
}

/// Latch the calling thread's cancellation mark.
///
/// Queue operations call this on the thread they unpark when a shutdown
/// signal interrupts a blocking `put` or `take`, so loops driven by that
/// thread can consult [`current_thread_cancelled`] and wind down.
pub fn cancel_current_thread() {
    CANCELLED.with(|flag| flag.set(true));
}

/// Whether the calling thread's cancellation mark has been latched.
///
/// The mark never clears for the lifetime of the thread.
#[must_use]
pub fn current_thread_cancelled() -> bool {
    CANCELLED.with(Cell::get)
}

/// One-shot shutdown latch owned by a consumer instance.
///
/// Combines an atomic flag with a "done" channel whose only sender is dropped
/// when the latch is raised. The disconnect wakes every thread parked in a
/// select against [`ShutdownSignal::done`], producers and worker alike.
pub(crate) struct ShutdownSignal {
    raised: AtomicBool,
    guard: Mutex<Option<Sender<()>>>,
    done: Receiver<()>,
}

impl ShutdownSignal {
    pub(crate) fn new() -> Self {
        // Rendezvous channel: nothing is ever sent, receivers only observe
        // the disconnect.
        let (tx, rx) = bounded(0);
        Self {
            raised: AtomicBool::new(false),
            guard: Mutex::new(Some(tx)),
            done: rx,
        }
    }

    /// Raise the latch. Idempotent; the flag only ever moves false to true.
    pub(crate) fn raise(&self) {
        if !self.raised.swap(true, Ordering::SeqCst) {
            let mut guard = self.guard.lock().expect("shutdown latch mutex poisoned");
            guard.take();
        }
    }

    pub(crate) fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Channel that disconnects once the latch is raised. Select against it
    /// to make a blocking queue operation shutdown-aware.
    pub(crate) fn done(&self) -> &Receiver<()> {
        &self.done
    }
}
