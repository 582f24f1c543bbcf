//! Dedicated worker thread running a current-thread Tokio runtime

use std::future::Future;
use std::pin::Pin;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;

use crate::logging::Logger;

use super::error::{BridgeError, BridgeResult};

/// Default bound on waiting for the worker to exit
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Result handle for one scheduled unit of work
#[must_use = "dropping a ticket discards the result, not the work"]
pub struct Ticket<T> {
    rx: Receiver<T>,
}

impl<T> Ticket<T> {
    /// Block until the work finishes
    pub fn wait(self) -> BridgeResult<T> {
        self.rx.recv().map_err(|_| BridgeError::Abandoned)
    }

    /// Block for at most `timeout`
    ///
    /// The work keeps running after a timeout; only the result is lost.
    pub fn wait_timeout(self, timeout: Duration) -> BridgeResult<T> {
        self.rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => BridgeError::Timeout(timeout),
            RecvTimeoutError::Disconnected => BridgeError::Abandoned,
        })
    }
}

struct Worker {
    thread: JoinHandle<()>,
    done: Receiver<()>,
}

/// The single asynchronous execution context shared by every session
///
/// Synchronous callers hand futures to [`schedule`](Self::schedule) and get a
/// [`Ticket`] back without blocking. Each future runs as its own task, so
/// unrelated sessions make progress concurrently.
pub struct Bridge {
    sender: Mutex<Option<UnboundedSender<Job>>>,
    worker: Mutex<Option<Worker>>,
    shutdown_timeout: Duration,
    logger: Arc<dyn Logger>,
}

impl Bridge {
    /// Start the worker with the default shutdown bound
    pub fn start(logger: Arc<dyn Logger>) -> BridgeResult<Self> {
        Self::start_with_timeout(logger, DEFAULT_SHUTDOWN_TIMEOUT)
    }

    pub fn start_with_timeout(logger: Arc<dyn Logger>, shutdown_timeout: Duration) -> BridgeResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| BridgeError::Startup(e.to_string()))?;

        let (tx, rx) = unbounded_channel::<Job>();
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let worker_logger = Arc::clone(&logger);

        let thread = thread::Builder::new()
            .name("toolbridge-worker".to_string())
            .spawn(move || {
                runtime.block_on(run_jobs(rx, Arc::clone(&worker_logger)));
                drop(runtime);
                worker_logger.debug("[Bridge] Worker loop exited");
                let _ = done_tx.send(());
            })
            .map_err(|e| BridgeError::Startup(e.to_string()))?;

        logger.info("[Bridge] Execution context started");

        Ok(Self {
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(Worker {
                thread,
                done: done_rx,
            })),
            shutdown_timeout,
            logger,
        })
    }

    /// Submit work; returns immediately
    pub fn schedule<F, T>(&self, work: F) -> BridgeResult<Ticket<T>>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx): (SyncSender<T>, Receiver<T>) = mpsc::sync_channel(1);
        let job: Job = Box::pin(async move {
            // The ticket may already be gone; the work still ran
            let _ = tx.send(work.await);
        });

        let sender = self.sender.lock();
        let sender = sender.as_ref().ok_or(BridgeError::Stopped)?;
        sender.send(job).map_err(|_| BridgeError::Stopped)?;
        Ok(Ticket { rx })
    }

    /// Submit work and block for its result
    pub fn run<F, T>(&self, work: F, timeout: Option<Duration>) -> BridgeResult<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let ticket = self.schedule(work)?;
        match timeout {
            Some(timeout) => ticket.wait_timeout(timeout),
            None => ticket.wait(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.sender.lock().is_some()
    }

    /// Stop accepting work and wait (bounded) for the worker to finish
    ///
    /// Work already submitted is allowed to complete. A worker that does not
    /// exit in time is logged and left behind. Safe to call more than once.
    pub fn shutdown(&self) {
        let Some(sender) = self.sender.lock().take() else {
            return;
        };
        drop(sender);
        self.logger.info("[Bridge] Shutting down execution context");

        let Some(worker) = self.worker.lock().take() else {
            return;
        };
        if worker.thread.thread().id() == thread::current().id() {
            self.logger
                .warn("[Bridge] Shutdown requested from the worker itself; not waiting");
            return;
        }

        match worker.done.recv_timeout(self.shutdown_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => match worker.thread.join() {
                Ok(()) => self.logger.info("[Bridge] Execution context stopped"),
                Err(_) => self.logger.error("[Bridge] Worker thread panicked"),
            },
            Err(RecvTimeoutError::Timeout) => self.logger.warn(&format!(
                "[Bridge] Worker did not stop within {:?}; detaching",
                self.shutdown_timeout
            )),
        }
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_jobs(mut jobs: UnboundedReceiver<Job>, logger: Arc<dyn Logger>) {
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            job = jobs.recv() => match job {
                Some(job) => {
                    tasks.spawn(job);
                }
                None => break,
            },
            Some(finished) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = finished {
                    logger.error(&format!("[Bridge] Task failed: {}", e));
                }
            }
        }
    }

    // Let submitted work finish
    while let Some(finished) = tasks.join_next().await {
        if let Err(e) = finished {
            logger.error(&format!("[Bridge] Task failed: {}", e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Instant;

    fn bridge() -> Bridge {
        Bridge::start_with_timeout(NoOpLogger::shared(), Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_schedule_and_wait() {
        let bridge = bridge();
        let ticket = bridge.schedule(async { 40 + 2 }).unwrap();
        assert_eq!(ticket.wait().unwrap(), 42);
        assert_eq!(bridge.run(async { "done" }, None).unwrap(), "done");
    }

    #[test]
    fn test_tasks_run_concurrently() {
        let bridge = bridge();
        let (tx, rx) = tokio::sync::oneshot::channel::<u32>();

        // The first task can only finish once the second one has run
        let waiting = bridge.schedule(async move { rx.await.unwrap_or(0) }).unwrap();
        let sending = bridge.schedule(async move { tx.send(7).is_ok() }).unwrap();

        assert!(sending.wait_timeout(Duration::from_secs(2)).unwrap());
        assert_eq!(waiting.wait_timeout(Duration::from_secs(2)).unwrap(), 7);
    }

    #[test]
    fn test_timeout_does_not_drop_work() {
        let bridge = bridge();
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);

        let ticket = bridge
            .schedule(async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                flag.store(true, Ordering::SeqCst);
            })
            .unwrap();
        assert_eq!(
            ticket.wait_timeout(Duration::from_millis(10)),
            Err(BridgeError::Timeout(Duration::from_millis(10)))
        );

        // Shutdown lets the pending task run to completion
        bridge.shutdown();
        assert!(finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_panicking_work_is_abandoned() {
        let bridge = bridge();
        let ticket = bridge
            .schedule(async {
                panic!("boom");
            })
            .unwrap();
        let result: BridgeResult<()> = ticket.wait();
        assert_eq!(result, Err(BridgeError::Abandoned));

        // The worker survives
        assert_eq!(bridge.run(async { 1 }, None).unwrap(), 1);
    }

    #[test]
    fn test_schedule_after_shutdown() {
        let bridge = bridge();
        bridge.shutdown();
        bridge.shutdown();
        assert!(!bridge.is_running());
        assert!(matches!(bridge.schedule(async {}), Err(BridgeError::Stopped)));
    }

    #[test]
    fn test_shutdown_is_bounded() {
        let bridge =
            Bridge::start_with_timeout(NoOpLogger::shared(), Duration::from_millis(100)).unwrap();
        let _ticket = bridge
            .schedule(async { tokio::time::sleep(Duration::from_secs(3600)).await })
            .unwrap();

        let started = Instant::now();
        bridge.shutdown();
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
