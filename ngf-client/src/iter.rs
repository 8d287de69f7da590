//! Sync iterator for consuming client notifications.
//!
//! Provides blocking, non-blocking and timeout-bounded access to
//! [`ClientEvent`] notifications without requiring async/await.

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::event::ClientEvent;

/// Iterator over client notifications.
///
/// Blocks on `next()` until a notification is available. Iterators are
/// cheap to clone and share one underlying channel, so each
/// notification is observed by exactly one consumer; delivery order
/// matches the order the client processed the corresponding traffic.
pub struct ClientEventIterator {
    rx: Arc<Mutex<mpsc::Receiver<ClientEvent>>>,
}

impl ClientEventIterator {
    pub(crate) fn new(rx: Arc<Mutex<mpsc::Receiver<ClientEvent>>>) -> Self {
        Self { rx }
    }

    /// Block until a notification is available.
    ///
    /// Returns `None` once the client has been dropped.
    pub fn recv(&self) -> Option<ClientEvent> {
        self.rx.lock().recv().ok()
    }

    /// Receive a notification without blocking.
    ///
    /// Returns `None` when nothing is pending.
    pub fn try_recv(&self) -> Option<ClientEvent> {
        self.rx.lock().try_recv().ok()
    }

    /// Block until a notification is available or the timeout expires.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ClientEvent> {
        self.rx.lock().recv_timeout(timeout).ok()
    }

    /// Non-blocking iterator over currently pending notifications.
    pub fn try_iter(&self) -> TryIterator<'_> {
        TryIterator { inner: self }
    }

    /// Blocking iterator that waits up to `timeout` per notification.
    pub fn timeout_iter(&self, timeout: Duration) -> TimeoutIterator<'_> {
        TimeoutIterator {
            inner: self,
            timeout,
        }
    }
}

impl Iterator for ClientEventIterator {
    type Item = ClientEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv()
    }
}

impl Clone for ClientEventIterator {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
        }
    }
}

/// Non-blocking iterator over currently pending notifications.
pub struct TryIterator<'a> {
    inner: &'a ClientEventIterator,
}

impl Iterator for TryIterator<'_> {
    type Item = ClientEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.try_recv()
    }
}

/// Blocking iterator with a per-item timeout.
pub struct TimeoutIterator<'a> {
    inner: &'a ClientEventIterator,
    timeout: Duration,
}

impl Iterator for TimeoutIterator<'_> {
    type Item = ClientEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.recv_timeout(self.timeout)
    }
}
