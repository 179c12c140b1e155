//! Fixed-capacity FIFO buffer whose blocking operations race against a
//! consumer's shutdown signal.

use crossbeam_channel::{Receiver, Sender, bounded, select_biased};

use crate::shutdown::{self, ShutdownSignal};

/// Bounded FIFO over a crossbeam channel. `put` and `take` park the caller
/// when the queue is full or empty and are unparked either by the queue
/// operation completing or by the shutdown signal being raised.
pub(crate) struct Fifo<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> Fifo<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self { tx, rx }
    }

    /// Blocking enqueue. Returns the item back if the shutdown signal was
    /// raised instead, after latching the calling thread's cancellation mark.
    ///
    /// The shutdown branch is listed first so that a raised latch wins over a
    /// simultaneously available slot.
    pub(crate) fn put(&self, item: T, signal: &ShutdownSignal) -> Result<(), T> {
        select_biased! {
            recv(signal.done()) -> _ => {
                shutdown::cancel_current_thread();
                Err(item)
            }
            send(self.tx, item) -> res => {
                match res {
                    Ok(()) => Ok(()),
                    // The receiver lives as long as self; treat a disconnect
                    // the same as a shutdown anyway.
                    Err(err) => {
                        shutdown::cancel_current_thread();
                        Err(err.into_inner())
                    }
                }
            }
        }
    }

    /// Blocking dequeue. `None` means the shutdown signal was raised while
    /// waiting; the calling thread's cancellation mark is latched on that
    /// path.
    pub(crate) fn take(&self, signal: &ShutdownSignal) -> Option<T> {
        select_biased! {
            recv(signal.done()) -> _ => {
                shutdown::cancel_current_thread();
                None
            }
            recv(self.rx) -> msg => {
                msg.ok()
            }
        }
    }

    /// Non-blocking dequeue of the head, if any. Used during drain, once the
    /// raised signal forbids further admissions.
    pub(crate) fn remove_if_any(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Advisory snapshot; may race with concurrent producers.
    pub(crate) fn len(&self) -> usize {
        self.rx.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Fifo;
    use crate::shutdown::{self, ShutdownSignal};

    #[test]
    fn put_then_take_is_fifo() {
        let fifo = Fifo::with_capacity(4);
        let signal = ShutdownSignal::new();
        for n in 1..=4 {
            assert!(fifo.put(n, &signal).is_ok());
        }
        assert_eq!(fifo.len(), 4);
        for n in 1..=4 {
            assert_eq!(fifo.take(&signal), Some(n));
        }
        assert!(fifo.is_empty());
    }

    #[test]
    fn remove_if_any_never_blocks() {
        let fifo = Fifo::<u32>::with_capacity(2);
        assert_eq!(fifo.remove_if_any(), None);

        let signal = ShutdownSignal::new();
        fifo.put(7, &signal).unwrap();
        assert_eq!(fifo.remove_if_any(), Some(7));
        assert_eq!(fifo.remove_if_any(), None);
    }

    #[test]
    fn put_on_raised_signal_hands_item_back_and_marks_thread() {
        let result = std::thread::spawn(|| {
            let fifo = Fifo::with_capacity(1);
            let signal = ShutdownSignal::new();
            fifo.put("first", &signal).unwrap();
            signal.raise();
            // Queue is full and the latch is up; the shutdown branch fires.
            let rejected = fifo.put("second", &signal);
            (rejected, shutdown::current_thread_cancelled())
        })
        .join()
        .unwrap();
        assert_eq!(result.0, Err("second"));
        assert!(result.1);
    }

    #[test]
    fn take_on_raised_signal_reports_shutdown() {
        let reported = std::thread::spawn(|| {
            let fifo = Fifo::<u32>::with_capacity(1);
            let signal = ShutdownSignal::new();
            signal.raise();
            (fifo.take(&signal), shutdown::current_thread_cancelled())
        })
        .join()
        .unwrap();
        assert_eq!(reported, (None, true));
    }

    #[test]
    fn raised_signal_wins_over_available_item() {
        let result = std::thread::spawn(|| {
            let fifo = Fifo::with_capacity(2);
            let signal = ShutdownSignal::new();
            fifo.put(1, &signal).unwrap();
            signal.raise();
            // Both select branches are ready; the biased order prefers the
            // shutdown branch, leaving the item for the drain path.
            (fifo.take(&signal), fifo.remove_if_any())
        })
        .join()
        .unwrap();
        assert_eq!(result, (None, Some(1)));
    }
}
