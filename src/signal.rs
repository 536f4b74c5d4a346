//! Cooperative cancellation shared by every long-lived activity.
//!
//! A [`CancelToken`] is cheap to clone. Cancelling it flips an atomic flag
//! and drops the only sender of an internal channel, which wakes every
//! thread parked in [`CancelToken::sleep`] or [`CancelToken::wait`] at once.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct Inner {
    cancelled: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    wakeup: Receiver<()>,
}

/// A cloneable, cooperative cancellation signal.
///
/// Activities poll [`is_cancelled`](Self::is_cancelled) or pace themselves
/// with [`sleep`](Self::sleep); nothing is ever forcibly stopped.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    /// Create a new, uncancelled token.
    pub fn new() -> Self {
        // Nothing is ever sent; the channel only reports disconnection.
        let (trigger, wakeup) = bounded(0);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                wakeup,
            }),
        }
    }

    /// Signal cancellation. Calling this more than once has no further effect.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::AcqRel) {
            self.inner.trigger.lock().take();
        }
    }

    /// Check whether cancellation has been signaled.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Sleep for up to `duration`, waking early on cancellation.
    ///
    /// Returns `true` if the full duration elapsed and the token is still
    /// live, `false` if cancellation was observed.
    pub fn sleep(&self, duration: Duration) -> bool {
        if self.is_cancelled() {
            return false;
        }
        match self.inner.wakeup.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => !self.is_cancelled(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Block until cancellation is signaled.
    pub fn wait(&self) {
        if self.is_cancelled() {
            return;
        }
        let _ = self.inner.wakeup.recv();
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
