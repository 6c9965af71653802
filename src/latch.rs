//! A one-shot latch.

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

/// Nothing is ever sent through a latch channel; it only ever disconnects.
enum Never {}

/// Blocks waiters until the matching [`Signal`] is dropped.
///
/// Any number of threads may wait on the same latch, and all of them are released at once. Since
/// releasing is tied to dropping the signal, it happens on every exit path of whoever owns it,
/// including unwinding.
#[derive(Clone)]
pub(crate) struct Latch {
    recv: Receiver<Never>,
}

/// Releases its [`Latch`] when dropped.
pub(crate) struct Signal {
    _sender: Sender<Never>,
}

impl Latch {
    pub fn new() -> (Latch, Signal) {
        let (sender, recv) = channel::bounded(0);
        (Latch { recv }, Signal { _sender: sender })
    }

    /// Blocks until the latch is released.
    pub fn wait(&self) {
        match self.recv.recv() {
            Ok(never) => match never {},
            Err(_) => (),
        }
    }

    /// Blocks until the latch is released or `timeout` has passed. Returns whether it was
    /// released.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match self.recv.recv_timeout(timeout) {
            Ok(never) => match never {},
            Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => false,
        }
    }

    pub fn is_released(&self) -> bool {
        match self.recv.try_recv() {
            Ok(never) => match never {},
            Err(TryRecvError::Disconnected) => true,
            Err(TryRecvError::Empty) => false,
        }
    }
}
