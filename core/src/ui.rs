//! Dispatching work onto the UI thread.

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use core::fmt;
use std::thread::{self, ThreadId};
use tracing::warn;

/// A unit of work to be run on the UI thread.
pub type UiTask = Box<dyn FnOnce() + Send>;

/// The UI thread’s end of the dispatch queue.
///
/// Must be created on the UI thread; whichever thread creates it is considered the UI thread by
/// all of its handles.
pub struct UiQueue {
    recv: Receiver<UiTask>,
    handle: UiHandle,
}

impl UiQueue {
    pub fn new() -> UiQueue {
        let (sender, recv) = channel::unbounded();

        UiQueue {
            recv,
            handle: UiHandle {
                sender,
                thread: thread::current().id(),
            },
        }
    }

    /// Returns a handle for dispatching work onto this queue.
    pub fn handle(&self) -> UiHandle {
        self.handle.clone()
    }

    /// Runs all queued tasks and returns how many ran.
    pub fn poll(&self) -> usize {
        let mut count = 0;
        loop {
            match self.recv.try_recv() {
                Ok(task) => {
                    task();
                    count += 1;
                }
                Err(TryRecvError::Empty) => break,
                // the queue holds a sender itself
                Err(TryRecvError::Disconnected) => unreachable!("ui queue has been disconnected"),
            }
        }
        count
    }
}

impl Default for UiQueue {
    fn default() -> UiQueue {
        UiQueue::new()
    }
}

impl fmt::Debug for UiQueue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("UiQueue")
            .field("pending", &self.recv.len())
            .field("thread", &self.handle.thread)
            .finish()
    }
}

/// A cloneable handle to a [`UiQueue`].
#[derive(Clone)]
pub struct UiHandle {
    sender: Sender<UiTask>,
    thread: ThreadId,
}

impl UiHandle {
    /// Returns true if called on the UI thread.
    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.thread
    }

    /// Queues a task; it will run during the next [`UiQueue::poll`].
    pub fn post(&self, task: UiTask) {
        if self.sender.send(task).is_err() {
            warn!("dropped ui task: ui queue is gone");
        }
    }

    /// Runs a task right away if called on the UI thread, and queues it otherwise.
    pub fn dispatch(&self, task: UiTask) {
        if self.is_ui_thread() {
            task();
        } else {
            self.post(task);
        }
    }
}

impl fmt::Debug for UiHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("UiHandle").field("thread", &self.thread).finish()
    }
}
