//! Background worker threads for initialization jobs.

use crossbeam::channel::{self, Sender};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, warn, Span};

type Job = Box<dyn FnOnce() + Send>;

/// A job plus the span it was submitted in, so worker logs nest under the caller’s span.
struct Envelope {
    job: Job,
    span: Span,
}

/// A fixed set of named threads draining one job queue.
///
/// A panicking job is logged and doesn’t take its worker down. Dropping the pool lets the workers
/// finish every job already queued, then joins them.
pub struct WorkerPool {
    sender: Option<Sender<Envelope>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `threads` workers (at least one) named `name-0`, `name-1`, and so on.
    pub fn new(threads: usize, name: &str) -> io::Result<WorkerPool> {
        let (sender, recv) = channel::unbounded::<Envelope>();

        let mut workers = Vec::new();
        for i in 0..threads.max(1) {
            let recv = recv.clone();
            let worker = thread::Builder::new()
                .name(format!("{}-{}", name, i))
                .spawn(move || {
                    while let Ok(Envelope { job, span }) = recv.recv() {
                        let _guard = span.enter();
                        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
                            error!(panic = panic_message(&*payload), "worker job panicked");
                        }
                    }
                })?;
            workers.push(worker);
        }
        debug!(threads = workers.len(), name, "started worker pool");

        Ok(WorkerPool {
            sender: Some(sender),
            workers,
        })
    }

    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    /// Queues a job. If every worker has died, the job is dropped without running.
    pub fn execute<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let envelope = Envelope {
            job: Box::new(job),
            span: Span::current(),
        };
        let sent = match &self.sender {
            Some(sender) => sender.send(envelope).is_ok(),
            None => false,
        };
        if !sent {
            warn!("worker pool is gone; dropping job");
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "(non-string panic payload)"
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.sender.take();

        let current = thread::current().id();
        for worker in self.workers.drain(..) {
            // the last reference may be dropped by one of our own jobs
            if worker.thread().id() == current {
                continue;
            }
            if worker.join().is_err() {
                warn!("worker thread exited abnormally");
            }
        }
    }
}
