use std::cell::Cell;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use tracing::debug;

use crate::pool::PoolShared;

/// Status codes for worker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Worker has been registered but its loop has not begun.
    Spawned = 0,

    /// Worker is looping on the queue: pulling, executing, waiting.
    Running = 1,

    /// Worker has deregistered itself and its thread is terminating.
    Retired = 2,
}

impl WorkerState {
    pub(crate) fn from_code(code: usize) -> WorkerState {
        match code {
            0 => WorkerState::Spawned,
            1 => WorkerState::Running,
            _ => WorkerState::Retired,
        }
    }
}

/// # Worker Thread Implementation
///
/// An individual worker in the pool. Each worker owns a unique identifier
/// and runs an independent OS thread that pulls work items from the shared
/// queue and executes them.
///
/// ## Core Algorithm
/// 1. Ask the pool for the next work item, blocking while the queue is empty
/// 2. Execute the item through its `execute` wrapper
/// 3. Update idle bookkeeping and repeat
/// 4. On a retirement signal (pool stopped, or idle timeout in elastic
///    mode), deregister from the pool's registry and terminate
///
/// ## Safety Considerations
/// - Deregistration always reacquires the pool lock, including on the panic
///   path (a drop guard), so the registry the pool's shutdown waits on is
///   never left with a dead worker's entry
/// - Retirement decisions are made only while idle-waiting, never while a
///   work item is executing
pub(crate) struct Worker {
    /// Unique identifier for this worker.
    id: usize,

    /// State shared with the owning pool.
    shared: Arc<PoolShared>,

    /// Current worker status, also visible from the pool's registry.
    state: Arc<AtomicUsize>,
}

impl Worker {
    pub(crate) fn new(id: usize, shared: Arc<PoolShared>, state: Arc<AtomicUsize>) -> Self {
        Self { id, shared, state }
    }

    /// Launches the worker's loop on a dedicated named OS thread.
    pub(crate) fn spawn(self) -> io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("workpool-worker-{}", self.id))
            .spawn(move || self.run())
    }

    /// Main worker loop. Runs until a retirement signal arrives.
    fn run(self) {
        self.state
            .store(WorkerState::Running as usize, Ordering::SeqCst);
        debug!(worker = self.id, "worker started");

        let guard = RetireGuard::new(self.id, &self.shared, &self.state);
        let mut idle_since = Instant::now();

        loop {
            // A `None` is the retirement signal; the idle count for this
            // worker was already released under the pool lock when an item
            // was handed out.
            let Some(item) = self.shared.next_work(self.id, idle_since) else {
                break;
            };
            guard.busy.set(true);
            item.execute();
            guard.busy.set(false);
            self.shared.mark_idle();
            idle_since = Instant::now();
        }
    }
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field(
                "state",
                &WorkerState::from_code(self.state.load(Ordering::Relaxed)),
            )
            .finish()
    }
}

/// Deregisters the worker when its loop ends, whether by a retirement
/// signal or by a panic unwinding out of user work.
struct RetireGuard<'a> {
    id: usize,
    shared: &'a Arc<PoolShared>,
    state: &'a Arc<AtomicUsize>,
    busy: Cell<bool>,
}

impl<'a> RetireGuard<'a> {
    fn new(id: usize, shared: &'a Arc<PoolShared>, state: &'a Arc<AtomicUsize>) -> Self {
        Self {
            id,
            shared,
            state,
            busy: Cell::new(false),
        }
    }
}

impl Drop for RetireGuard<'_> {
    fn drop(&mut self) {
        // A worker interrupted mid-task (panic) already released its idle
        // slot when the item was handed out.
        self.shared.deregister(self.id, self.busy.get());
        self.state
            .store(WorkerState::Retired as usize, Ordering::SeqCst);
        debug!(worker = self.id, "worker retired");
    }
}
