//! Dedicated thread that frame listeners can be marshalled onto.
//!
//! A `FrameExecutor` owns one named worker thread draining a crossbeam
//! channel of jobs in FIFO order. Surfaces hold [`ExecutorHandle`]s, which
//! only post; they never keep the worker alive.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use tracing::{debug, trace, warn};

type Job = Box<dyn FnOnce() + Send>;

enum Message {
    Run(Job),
    Shutdown,
}

/// Owner of a worker thread for frame callbacks.
///
/// Dropping it lets already queued jobs finish, then joins the thread.
pub struct FrameExecutor {
    handle: ExecutorHandle,
    worker: Option<JoinHandle<()>>,
}

/// Cheap, clonable poster onto a [`FrameExecutor`].
#[derive(Clone)]
pub struct ExecutorHandle {
    name: Arc<str>,
    sender: Sender<Message>,
    /// Set when the owning `FrameExecutor` starts shutting down.
    closed: Arc<AtomicBool>,
}

impl FrameExecutor {
    pub fn spawn(name: impl Into<String>) -> io::Result<Self> {
        let name: Arc<str> = Arc::from(name.into());
        let (sender, receiver) = channel::unbounded();

        let worker = {
            let name = name.clone();
            thread::Builder::new()
                .name(name.to_string())
                .spawn(move || run_worker(&name, receiver))?
        };

        debug!(executor = %name, "Frame executor started");
        Ok(Self {
            handle: ExecutorHandle {
                name,
                sender,
                closed: Arc::new(AtomicBool::new(false)),
            },
            worker: Some(worker),
        })
    }

    pub fn name(&self) -> &str {
        &self.handle.name
    }

    pub fn handle(&self) -> ExecutorHandle {
        self.handle.clone()
    }

    /// Queue `job` on the worker. See [`ExecutorHandle::post`].
    pub fn post(&self, job: impl FnOnce() + Send + 'static) -> bool {
        self.handle.post(job)
    }
}

impl ExecutorHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue `job` on the worker.
    ///
    /// Returns `false`, dropping the job, once the executor has started
    /// shutting down. A job posted concurrently with the shutdown can still
    /// return `true` and then be discarded by the worker without running.
    pub fn post(&self, job: impl FnOnce() + Send + 'static) -> bool {
        let posted = !self.closed.load(Ordering::Acquire)
            && self.sender.send(Message::Run(Box::new(job))).is_ok();
        if !posted {
            trace!(executor = %self.name, "Dropping job posted after shutdown");
        }
        posted
    }
}

fn run_worker(name: &str, receiver: Receiver<Message>) {
    for message in receiver.iter() {
        match message {
            Message::Run(job) => job(),
            Message::Shutdown => break,
        }
    }

    let discarded = receiver
        .try_iter()
        .filter(|message| matches!(message, Message::Run(_)))
        .count();
    if discarded > 0 {
        trace!(executor = %name, discarded, "Discarding jobs posted during shutdown");
    }
}

impl Drop for FrameExecutor {
    fn drop(&mut self) {
        self.handle.closed.store(true, Ordering::Release);
        let _ = self.handle.sender.send(Message::Shutdown);

        let Some(worker) = self.worker.take() else {
            return;
        };
        // A job that drops the last owner runs on the worker itself.
        if worker.thread().id() == thread::current().id() {
            return;
        }
        if worker.join().is_err() {
            warn!(executor = %self.handle.name, "Frame executor worker panicked");
        } else {
            debug!(executor = %self.handle.name, "Frame executor stopped");
        }
    }
}

impl fmt::Debug for FrameExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameExecutor")
            .field("name", &self.handle.name)
            .field("queued", &self.handle.sender.len())
            .finish()
    }
}

impl fmt::Debug for ExecutorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorHandle")
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn runs_jobs_in_order_on_named_thread() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let executor = FrameExecutor::spawn("frame-worker").unwrap();

        for i in 0..5 {
            let seen = seen.clone();
            assert!(executor.post(move || {
                let name = thread::current().name().map(str::to_owned);
                seen.lock().push((i, name));
            }));
        }
        drop(executor);

        let seen = seen.lock();
        assert_eq!(seen.len(), 5);
        for (i, (n, name)) in seen.iter().enumerate() {
            assert_eq!(*n, i);
            assert_eq!(name.as_deref(), Some("frame-worker"));
        }
    }

    #[test]
    fn handle_post_fails_after_shutdown() {
        let executor = FrameExecutor::spawn("short-lived").unwrap();
        let handle = executor.handle();
        assert_eq!(handle.name(), "short-lived");
        drop(executor);
        assert!(!handle.post(|| {}));
    }

    #[test]
    fn jobs_posted_during_shutdown_never_run() {
        let executor = FrameExecutor::spawn("closing").unwrap();
        let handle = executor.handle();
        let ran = Arc::new(AtomicBool::new(false));
        let (entered_tx, entered_rx) = crossbeam::channel::bounded(0);
        let (resume_tx, resume_rx) = crossbeam::channel::bounded::<()>(0);

        // Park the worker inside a job, then drop the owner from another
        // thread so the shutdown is requested while the job is running.
        assert!(executor.post(move || {
            let _ = entered_tx.send(());
            let _ = resume_rx.recv();
        }));
        entered_rx.recv().unwrap();
        let closer = thread::spawn(move || drop(executor));
        while !handle.closed.load(Ordering::Acquire) {
            thread::yield_now();
        }

        let late = {
            let ran = ran.clone();
            handle.post(move || ran.store(true, Ordering::SeqCst))
        };
        resume_tx.send(()).unwrap();
        closer.join().unwrap();

        assert!(!late);
        assert!(!ran.load(Ordering::SeqCst));
    }
}
