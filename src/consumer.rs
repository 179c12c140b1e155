//! Single-consumer bounded-queue worker.
//!
//! A [`Consumer`] accepts items from any number of producer threads, buffers
//! them in a bounded FIFO, and processes them one at a time on a dedicated
//! worker thread using the handler supplied at construction. Items may be
//! queued before [`Consumer::start`] is called; they are processed once the
//! worker is running. [`Consumer::interrupt`] stops admissions immediately
//! and winds the worker down, by default after draining whatever is still
//! queued.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::queue::Fifo;
use crate::shutdown::{self, ShutdownSignal};

type Handler<T> = Box<dyn FnMut(T) + Send>;

struct Shared<T> {
    queue: Fifo<T>,
    signal: ShutdownSignal,
    drain_on_shutdown: AtomicBool,
}

/// Bounded-queue consumer with cooperative shutdown.
///
/// The handler runs serially on the worker thread; invocations never overlap
/// for one instance. A handler that panics is logged and skipped, and the
/// worker continues with the next item.
pub struct Consumer<T> {
    shared: Arc<Shared<T>>,
    handler: Mutex<Option<Handler<T>>>,
    started: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Consumer<T> {
    /// Create a consumer with a queue of the given capacity.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize, handler: impl FnMut(T) + Send + 'static) -> Self {
        assert!(capacity >= 1, "queue capacity must be at least 1");
        Self {
            shared: Arc::new(Shared {
                queue: Fifo::with_capacity(capacity),
                signal: ShutdownSignal::new(),
                drain_on_shutdown: AtomicBool::new(true),
            }),
            handler: Mutex::new(Some(Box::new(handler))),
            started: AtomicBool::new(false),
            worker: Mutex::new(None),
        }
    }

    /// Spawn the worker thread.
    ///
    /// # Panics
    /// Panics if called more than once.
    pub fn start(&self) {
        assert!(
            !self.started.swap(true, Ordering::SeqCst),
            "consumer already started"
        );
        let handler = self
            .handler
            .lock()
            .expect("handler mutex poisoned")
            .take()
            .expect("handler should be available until first start");
        let shared = Arc::clone(&self.shared);
        let handle = thread::spawn(move || run_worker(&shared, handler));
        *self.worker.lock().expect("worker mutex poisoned") = Some(handle);
    }

    /// Add an item to the queue, blocking while the queue is full.
    ///
    /// If this consumer has been interrupted, whether before the call or
    /// while it was blocked, the item is discarded without error and the
    /// calling thread's cancellation mark is latched before the call returns,
    /// so a producer loop checking
    /// [`crate::shutdown::current_thread_cancelled`] terminates naturally.
    pub fn add_item(&self, item: T) {
        if self.shared.signal.is_raised() {
            shutdown::cancel_current_thread();
            return;
        }
        let _ = self.shared.queue.put(item, &self.shared.signal);
    }

    /// Raise the shutdown signal. Idempotent; returns immediately.
    ///
    /// Admissions stop as soon as the signal is raised. The worker keeps
    /// running until it finishes the item in hand and, when the drain policy
    /// is set, the items still queued.
    pub fn interrupt(&self) {
        debug!(queued = self.shared.queue.len(), "consumer interrupted");
        self.shared.signal.raise();
    }

    /// Whether the shutdown signal has been raised.
    pub fn is_interrupted(&self) -> bool {
        self.shared.signal.is_raised()
    }

    /// Set whether items still queued when the worker observes the shutdown
    /// signal are processed before it stops. Defaults to true. Changes made
    /// after the worker has observed the signal have no effect.
    pub fn set_drain_on_shutdown(&self, drain: bool) {
        self.shared.drain_on_shutdown.store(drain, Ordering::SeqCst);
    }

    /// Current drain policy.
    pub fn drain_on_shutdown(&self) -> bool {
        self.shared.drain_on_shutdown.load(Ordering::SeqCst)
    }

    /// Block until the worker thread has stopped. Returns immediately if the
    /// worker was never started or has already been joined.
    pub fn join(&self) {
        let handle = self.worker.lock().expect("worker mutex poisoned").take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("consumer worker thread panicked");
            }
        }
    }
}

/// Worker loop. Runs until the shutdown signal is observed, then drains the
/// queue or stops immediately depending on the policy at that moment.
fn run_worker<T>(shared: &Shared<T>, mut handler: Handler<T>) {
    loop {
        if shared.signal.is_raised() {
            break;
        }
        match shared.queue.take(&shared.signal) {
            Some(item) => invoke(&mut handler, item),
            None => break,
        }
    }
    // Policy is read once here; later changes are not honored.
    if shared.drain_on_shutdown.load(Ordering::SeqCst) {
        let mut drained = 0usize;
        while let Some(item) = shared.queue.remove_if_any() {
            invoke(&mut handler, item);
            drained += 1;
        }
        if drained > 0 {
            debug!(drained, "processed items queued at shutdown");
        }
    }
    debug!("consumer worker stopped");
}

fn invoke<T>(handler: &mut Handler<T>, item: T) {
    if catch_unwind(AssertUnwindSafe(|| handler(item))).is_err() {
        warn!("item handler panicked; continuing with the next item");
    }
}
