//! Background thread pool for frame decoding
//!
//! Uses work-stealing deques:
//! - Jobs are pushed to a global injector
//! - Idle workers pull batches from the injector into their local deque
//! - Workers steal from each other when both are empty
//!
//! There is no cancellation. Dropping the pool signals shutdown; workers finish
//! the jobs already queued, then exit.

use crossbeam::deque::{Injector, Stealer, Worker};
use log::trace;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Worker pool with work-stealing.
///
/// # Example
/// ```ignore
/// let workers = Workers::new(4)?;
///
/// workers.execute(move || {
///     let result = frame::decode(&path);
///     tx.send(LoadCompletion { index, result }).ok();
/// });
/// ```
pub struct Workers {
    injector: Arc<Injector<Job>>,         // Global queue for external tasks
    handles: Vec<thread::JoinHandle<()>>, // Thread handles for proper shutdown
    shutdown: Arc<AtomicBool>,            // Shutdown signal
}

impl Workers {
    /// Create worker pool with `num_threads` threads (at least one).
    ///
    /// Recommended: `num_cpus::get() * 3 / 4` (leave room for the event thread).
    pub fn new(num_threads: usize) -> std::io::Result<Self> {
        let num_threads = num_threads.max(1);
        let injector: Arc<Injector<Job>> = Arc::new(Injector::new());
        let shutdown = Arc::new(AtomicBool::new(false));

        let locals: Vec<Worker<Job>> = (0..num_threads).map(|_| Worker::new_fifo()).collect();
        let stealers: Arc<Vec<Stealer<Job>>> =
            Arc::new(locals.iter().map(Worker::stealer).collect());

        let mut handles = Vec::with_capacity(num_threads);
        for (worker_id, local) in locals.into_iter().enumerate() {
            let injector = Arc::clone(&injector);
            let shutdown = Arc::clone(&shutdown);
            let stealers = Arc::clone(&stealers);

            let handle = thread::Builder::new()
                .name(format!("scrollreel-decode-{}", worker_id))
                .spawn(move || {
                    trace!("Worker {} started", worker_id);
                    loop {
                        if let Some(job) = find_job(&local, &injector, &stealers) {
                            job();
                            continue;
                        }
                        if shutdown.load(Ordering::Relaxed) {
                            break;
                        }
                        // No work - short sleep to avoid CPU spin
                        thread::sleep(Duration::from_millis(1));
                    }
                    trace!("Worker {} stopped", worker_id);
                })?;

            handles.push(handle);
        }

        trace!("Workers initialized: {} threads (work-stealing)", num_threads);

        Ok(Self {
            injector,
            handles,
            shutdown,
        })
    }

    /// Execute closure on a worker thread.
    ///
    /// Closure runs asynchronously, no return value. Report results through a
    /// channel.
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.injector.push(Box::new(f));
    }

    pub fn num_threads(&self) -> usize {
        self.handles.len()
    }
}

/// Own deque first, then a batch from the injector, then steal from peers
fn find_job(local: &Worker<Job>, injector: &Injector<Job>, stealers: &[Stealer<Job>]) -> Option<Job> {
    local.pop().or_else(|| {
        std::iter::repeat_with(|| {
            injector
                .steal_batch_and_pop(local)
                .or_else(|| stealers.iter().map(|s| s.steal()).collect())
        })
        .find(|s| !s.is_retry())
        .and_then(|s| s.success())
    })
}

impl Drop for Workers {
    fn drop(&mut self) {
        let num_threads = self.handles.len();
        trace!("Workers shutting down ({} threads)...", num_threads);

        self.shutdown.store(true, Ordering::SeqCst);

        // Queued decodes may still be running; give them a bounded window
        let deadline = Instant::now() + Duration::from_millis(2000);

        let handles = std::mem::take(&mut self.handles);
        for handle in handles {
            while !handle.is_finished() {
                if Instant::now() >= deadline {
                    trace!("Shutdown timeout reached, detaching remaining workers");
                    return;
                }
                thread::sleep(Duration::from_millis(1));
            }
            let _ = handle.join();
        }

        trace!("All {} workers stopped gracefully", num_threads);
    }
}
