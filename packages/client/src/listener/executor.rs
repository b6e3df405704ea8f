//! Single-threaded callback execution context.
//!
//! All listener callbacks run on one dedicated thread, one job at a time, in
//! submission order. Network tasks only enqueue; they never wait for a
//! callback to finish.

use std::{
    panic::{self, AssertUnwindSafe},
    thread::{self, ThreadId},
};

use tokio::sync::{mpsc, oneshot};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Default name of the callback thread.
pub const DEFAULT_THREAD_NAME: &str = "chatwire-callbacks";

/// Handle to the callback thread.
///
/// The thread exits once the executor is dropped and the queue has drained.
#[derive(Debug)]
pub struct CallbackExecutor {
    jobs: mpsc::UnboundedSender<Job>,
    thread_id: ThreadId,
}

impl CallbackExecutor {
    /// Start the callback thread with the default name.
    pub fn spawn() -> std::io::Result<Self> {
        Self::spawn_named(DEFAULT_THREAD_NAME)
    }

    /// Start the callback thread with `name`.
    pub fn spawn_named(name: &str) -> std::io::Result<Self> {
        let (jobs, mut queue) = mpsc::unbounded_channel::<Job>();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while let Some(job) = queue.blocking_recv() {
                    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                        tracing::error!("Callback job panicked; continuing with the next one");
                    }
                }
                tracing::debug!("Callback executor stopped");
            })?;

        Ok(Self {
            jobs,
            thread_id: handle.thread().id(),
        })
    }

    /// Queue `job` to run on the callback thread.
    pub fn execute(&self, job: impl FnOnce() + Send + 'static) {
        if self.jobs.send(Box::new(job)).is_err() {
            tracing::warn!("Callback executor is gone; dropping callback");
        }
    }

    /// Wait until every job queued before this call has run.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        self.execute(move || {
            let _ = done_tx.send(());
        });
        let _ = done_rx.await;
    }

    /// Whether the caller is running on the callback thread.
    pub fn is_current_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }
}
