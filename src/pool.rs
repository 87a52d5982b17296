use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::config::{IDLE_POLL_INTERVAL, IDLE_TIMEOUT, PoolConfig, PoolMode, SUBMIT_TIMEOUT};
use crate::error::PoolError;
use crate::result::{Completion, TaskHandle};
use crate::task::{ClosureTask, Task, WorkItem};
use crate::worker::{Worker, WorkerState};

/// Snapshot of pool state for monitoring.
///
/// Read from atomic counters without taking the pool lock, so the fields
/// are individually accurate but not mutually consistent.
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    /// Number of live workers.
    pub workers: usize,

    /// Number of workers currently waiting for work.
    pub idle_workers: usize,

    /// Number of work items waiting in the queue.
    pub queued_tasks: usize,

    /// Whether the pool is running.
    pub running: bool,
}

/// Registry entry for a live worker.
struct WorkerHandle {
    /// Worker status shared with the worker's own thread.
    state: Arc<AtomicUsize>,

    /// Held for ownership only; dropped on the worker's self-removal,
    /// detaching the thread. Shutdown synchronizes on registry emptiness,
    /// not on joins.
    #[allow(dead_code)]
    join: thread::JoinHandle<()>,
}

/// State mutated only under the pool lock: the pending queue, the worker
/// registry, the identifier counter, and the configuration.
struct PoolState {
    queue: VecDeque<WorkItem>,
    workers: HashMap<usize, WorkerHandle>,
    next_worker_id: usize,
    mode: PoolMode,
    queue_capacity: usize,
    max_threads: usize,
    initial_threads: usize,
}

/// State shared between the pool handle and every worker thread.
///
/// # Thread Safety
/// - One pool-wide lock protects the queue, the worker registry, the
///   identifier counter, and the configuration
/// - The not-empty / not-full / all-retired condition variables pair with
///   that lock
/// - Counters read outside the lock (metrics fast paths, growth checks)
///   are atomics maintained alongside the locked mutations
pub(crate) struct PoolShared {
    state: Mutex<PoolState>,
    not_empty: Condvar,
    not_full: Condvar,
    all_retired: Condvar,
    running: AtomicBool,
    started: AtomicBool,
    queued: AtomicUsize,
    worker_count: AtomicUsize,
    idle_workers: AtomicUsize,
}

impl PoolShared {
    /// Hands out the next work item, blocking while the queue is empty.
    ///
    /// Returns `None` to signal retirement: the pool has stopped, or — in
    /// elastic mode — this worker has been idle past the idle timeout while
    /// the worker count is above the initial floor. The caller's idle slot
    /// is released before an item is returned.
    pub(crate) fn next_work(&self, worker_id: usize, idle_since: Instant) -> Option<WorkItem> {
        let mut state = self.state.lock().unwrap();
        loop {
            // Checked on entry and after every wake. Once the running flag
            // is down no further items are handed out, so work still queued
            // at shutdown is never executed.
            if !self.running.load(Ordering::Acquire) {
                debug!(worker = worker_id, "pool stopped");
                return None;
            }

            if let Some(item) = state.queue.pop_front() {
                self.queued.fetch_sub(1, Ordering::AcqRel);
                self.idle_workers.fetch_sub(1, Ordering::AcqRel);
                if !state.queue.is_empty() {
                    self.not_empty.notify_all();
                }
                self.not_full.notify_all();
                return Some(item);
            }

            match state.mode {
                PoolMode::Fixed => {
                    state = self.not_empty.wait(state).unwrap();
                }
                PoolMode::Elastic => {
                    // Wake periodically to measure idle time; retirement
                    // never drops the pool below its initial floor.
                    let (guard, timeout) = self
                        .not_empty
                        .wait_timeout(state, IDLE_POLL_INTERVAL)
                        .unwrap();
                    state = guard;
                    if timeout.timed_out()
                        && idle_since.elapsed() >= IDLE_TIMEOUT
                        && self.worker_count.load(Ordering::Acquire) > state.initial_threads
                    {
                        debug!(worker = worker_id, "idle timeout reached, retiring");
                        return None;
                    }
                }
            }
        }
    }

    /// Returns a worker to the idle set after it finishes an item.
    pub(crate) fn mark_idle(&self) {
        self.idle_workers.fetch_add(1, Ordering::AcqRel);
    }

    /// Removes a worker's own registry entry, called from that worker's
    /// thread as the last act of its retirement path.
    pub(crate) fn deregister(&self, worker_id: usize, busy: bool) {
        let mut state = self.state.lock().unwrap();
        state.workers.remove(&worker_id);
        self.worker_count.fetch_sub(1, Ordering::AcqRel);
        if !busy {
            self.idle_workers.fetch_sub(1, Ordering::AcqRel);
        }
        self.all_retired.notify_all();
    }
}

/// A bounded worker pool executing heterogeneous tasks on OS threads.
///
/// The pool owns a FIFO work queue with capacity-based backpressure and a
/// registry of worker threads. In [`PoolMode::Fixed`] the worker count is
/// constant; in [`PoolMode::Elastic`] it grows by one per submission that
/// observes more pending work than idle workers (up to the ceiling) and
/// shrinks back to the initial floor after sustained idleness.
///
/// Submissions return a [`TaskHandle`]; a rejected submission (queue full
/// past the submission timeout, or pool already shut down) returns an
/// invalid handle whose `get` resolves immediately to an empty payload.
///
/// Dropping the pool shuts it down: in-flight items finish, queued items
/// are discarded, and the drop blocks until every worker has deregistered.
///
/// # Examples
///
/// ```
/// use workpool::ThreadPool;
///
/// let pool = ThreadPool::new();
/// pool.start().unwrap();
///
/// let handle = pool.submit_fn(|| 6 * 7);
/// assert_eq!(handle.get().extract::<i32>().unwrap(), 42);
/// ```
pub struct ThreadPool {
    shared: Arc<PoolShared>,
}

impl ThreadPool {
    /// Creates an idle pool with [`PoolConfig::default`].
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Creates an idle pool from `config`.
    pub fn with_config(config: PoolConfig) -> Self {
        let shared = Arc::new(PoolShared {
            state: Mutex::new(PoolState {
                queue: VecDeque::new(),
                workers: HashMap::new(),
                next_worker_id: 0,
                mode: config.mode,
                queue_capacity: config.queue_capacity,
                max_threads: config.max_threads,
                initial_threads: config.initial_threads,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            all_retired: Condvar::new(),
            running: AtomicBool::new(false),
            started: AtomicBool::new(false),
            queued: AtomicUsize::new(0),
            worker_count: AtomicUsize::new(0),
            idle_workers: AtomicUsize::new(0),
        });
        Self { shared }
    }

    // --- Configuration ---

    /// Sets the growth mode. Rejected once the pool has started.
    pub fn set_mode(&self, mode: PoolMode) -> Result<(), PoolError> {
        let mut state = self.lock_for_configure()?;
        state.mode = mode;
        Ok(())
    }

    /// Sets the queue capacity ceiling. Rejected once the pool has started.
    pub fn set_queue_capacity(&self, capacity: usize) -> Result<(), PoolError> {
        let mut state = self.lock_for_configure()?;
        state.queue_capacity = capacity;
        Ok(())
    }

    /// Sets the worker-count ceiling for elastic growth. Rejected once the
    /// pool has started, and outside [`PoolMode::Elastic`].
    pub fn set_max_threads(&self, ceiling: usize) -> Result<(), PoolError> {
        let mut state = self.lock_for_configure()?;
        if state.mode != PoolMode::Elastic {
            return Err(PoolError::ConfigurationRejected(
                "thread ceiling applies only in elastic mode",
            ));
        }
        state.max_threads = ceiling;
        Ok(())
    }

    /// Sets the worker count spawned by [`ThreadPool::start`]. Rejected once
    /// the pool has started.
    pub fn set_initial_threads(&self, count: usize) -> Result<(), PoolError> {
        let mut state = self.lock_for_configure()?;
        state.initial_threads = count;
        Ok(())
    }

    fn lock_for_configure(&self) -> Result<std::sync::MutexGuard<'_, PoolState>, PoolError> {
        let state = self.shared.state.lock().unwrap();
        if self.shared.started.load(Ordering::SeqCst) {
            return Err(PoolError::ConfigurationRejected("pool already started"));
        }
        Ok(state)
    }

    // --- Lifecycle ---

    /// Starts the pool: spawns the configured initial worker count and
    /// begins accepting work.
    ///
    /// # Errors
    /// [`PoolError::AlreadyStarted`] on any call after the first, including
    /// after shutdown; [`PoolError::ThreadSetup`] if the OS refuses a
    /// worker thread.
    pub fn start(&self) -> Result<(), PoolError> {
        let mut state = self.shared.state.lock().unwrap();
        if self.shared.started.swap(true, Ordering::SeqCst) {
            return Err(PoolError::AlreadyStarted);
        }
        self.shared.running.store(true, Ordering::SeqCst);

        let initial = state.initial_threads;
        for _ in 0..initial {
            self.spawn_worker(&mut state)?;
        }
        info!(mode = ?state.mode, workers = initial, "thread pool started");
        Ok(())
    }

    /// Stops the pool and blocks until every worker has deregistered.
    ///
    /// Items already picked up by workers run to completion; items still
    /// queued are dropped unexecuted and their handles resolve to empty
    /// payloads. Safe to call while workers are mid-execution. Also invoked
    /// on drop.
    ///
    /// # Errors
    /// [`PoolError::NotRunning`] if the pool never started or was already
    /// shut down.
    pub fn shutdown(&self) -> Result<(), PoolError> {
        let mut state = self.shared.state.lock().unwrap();
        // Flipped under the pool lock so a worker that just observed
        // `running == true` cannot miss the wakeup below.
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return Err(PoolError::NotRunning);
        }
        self.shared.not_empty.notify_all();

        while !state.workers.is_empty() {
            for (id, handle) in state.workers.iter() {
                debug!(
                    worker = id,
                    state = ?WorkerState::from_code(handle.state.load(Ordering::Relaxed)),
                    "awaiting retirement"
                );
            }
            state = self.shared.all_retired.wait(state).unwrap();
        }

        let dropped = state.queue.len();
        state.queue.clear();
        self.shared.queued.store(0, Ordering::Release);
        if dropped > 0 {
            warn!(dropped, "queued tasks dropped at shutdown");
        }
        info!("thread pool shut down");
        Ok(())
    }

    // --- Submission ---

    /// Submits a unit of work, returning the handle its result will arrive
    /// on.
    ///
    /// Blocks for at most the submission timeout (1 s) waiting for queue
    /// space; past that the submission is rejected and the returned handle
    /// is invalid — no retry is attempted and the work is never executed.
    /// Work submitted before `start` queues up until workers exist.
    pub fn submit<T: Task>(&self, task: T) -> TaskHandle {
        self.submit_boxed(Box::new(task))
    }

    /// Submits a closure; its return value becomes the handle's payload.
    pub fn submit_fn<T, F>(&self, f: F) -> TaskHandle
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        self.submit(ClosureTask::new(f))
    }

    /// [`ThreadPool::submit`] for an already-boxed task.
    pub fn submit_boxed(&self, task: Box<dyn Task>) -> TaskHandle {
        let state = self.shared.state.lock().unwrap();
        if self.shared.started.load(Ordering::SeqCst) && !self.shared.running.load(Ordering::SeqCst)
        {
            warn!("pool is shut down, submission rejected");
            return TaskHandle::invalid();
        }

        let (mut state, timeout) = self
            .shared
            .not_full
            .wait_timeout_while(state, SUBMIT_TIMEOUT, |s| {
                s.queue.len() >= s.queue_capacity
            })
            .unwrap();
        if timeout.timed_out() && state.queue.len() >= state.queue_capacity {
            warn!(
                capacity = state.queue_capacity,
                "work queue full, submission rejected"
            );
            return TaskHandle::invalid();
        }

        let completion = Arc::new(Completion::new());
        state.queue.push_back(WorkItem::new(task, completion.clone()));
        self.shared.queued.fetch_add(1, Ordering::AcqRel);
        self.shared.not_empty.notify_all();

        self.maybe_grow(&mut state);
        TaskHandle::new(completion)
    }

    /// Elastic growth, evaluated under the same lock as the enqueue so the
    /// decision is consistent with the queue at that instant. Spawns at
    /// most one worker per qualifying submission.
    fn maybe_grow(&self, state: &mut PoolState) {
        if state.mode != PoolMode::Elastic {
            return;
        }
        let queued = self.shared.queued.load(Ordering::Acquire);
        let idle = self.shared.idle_workers.load(Ordering::Acquire);
        let current = self.shared.worker_count.load(Ordering::Acquire);
        if queued > idle && current < state.max_threads {
            match self.spawn_worker(state) {
                Ok(()) => debug!(workers = current + 1, "worker pool grown"),
                // The submission itself already succeeded; growth is only
                // an optimization here.
                Err(e) => error!(error = %e, "failed to grow worker pool"),
            }
        }
    }

    /// Registers and launches one worker. Caller holds the pool lock.
    fn spawn_worker(&self, state: &mut PoolState) -> Result<(), PoolError> {
        let id = state.next_worker_id;
        state.next_worker_id += 1;

        let worker_state = Arc::new(AtomicUsize::new(WorkerState::Spawned as usize));
        let worker = Worker::new(id, self.shared.clone(), worker_state.clone());
        let join = worker
            .spawn()
            .map_err(|e| PoolError::ThreadSetup(e.to_string()))?;

        state.workers.insert(
            id,
            WorkerHandle {
                state: worker_state,
                join,
            },
        );
        self.shared.worker_count.fetch_add(1, Ordering::AcqRel);
        self.shared.idle_workers.fetch_add(1, Ordering::AcqRel);
        debug!(worker = id, "worker spawned");
        Ok(())
    }

    // --- Introspection ---

    /// Whether the pool is currently running.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Number of live workers.
    pub fn worker_count(&self) -> usize {
        self.shared.worker_count.load(Ordering::Acquire)
    }

    /// Number of workers currently waiting for work.
    pub fn idle_workers(&self) -> usize {
        self.shared.idle_workers.load(Ordering::Acquire)
    }

    /// Number of work items waiting in the queue.
    pub fn queued_tasks(&self) -> usize {
        self.shared.queued.load(Ordering::Acquire)
    }

    /// Snapshot of the pool's counters.
    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            workers: self.worker_count(),
            idle_workers: self.idle_workers(),
            queued_tasks: self.queued_tasks(),
            running: self.is_running(),
        }
    }
}

impl Default for ThreadPool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPool")
            .field("workers", &self.worker_count())
            .field("idle_workers", &self.idle_workers())
            .field("queued_tasks", &self.queued_tasks())
            .field("running", &self.is_running())
            .finish()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        if self.shared.running.load(Ordering::Acquire) {
            let _ = self.shutdown();
        }
    }
}
