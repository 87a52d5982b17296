use std::time::Duration;

/// Capacity sentinel for the work queue; effectively unbounded in practice.
pub const DEFAULT_QUEUE_CAPACITY: usize = i32::MAX as usize;

/// Ceiling on the worker count in elastic mode.
pub const DEFAULT_THREAD_CEILING: usize = 100;

/// Longest a submitter may block waiting for queue space before the
/// submission is rejected.
pub const SUBMIT_TIMEOUT: Duration = Duration::from_secs(1);

/// Idle duration after which a surplus elastic-mode worker retires.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Interval at which an idle elastic-mode worker re-checks the queue and
/// its own idle time.
pub const IDLE_POLL_INTERVAL: Duration = Duration::from_secs(1);

// --- Configuration Enums ---

/// Determines how the pool manages its worker count over time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolMode {
    /// The worker count stays at the initial count for the pool's lifetime.
    Fixed,
    /// The worker count grows under backlog, bounded by the thread ceiling,
    /// and shrinks back toward the initial count after sustained idleness.
    Elastic,
}

// --- Pool Configuration ---

/// Configuration for a [`ThreadPool`](crate::pool::ThreadPool).
///
/// All values can also be adjusted through the pool's setter methods before
/// `start` is called; once the pool has started, changes are rejected.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// The growth mode for the worker set.
    pub mode: PoolMode,

    /// Maximum number of pending work items held in the queue.
    pub queue_capacity: usize,

    /// Maximum number of workers; meaningful only in [`PoolMode::Elastic`].
    pub max_threads: usize,

    /// Number of workers spawned by `start`. In elastic mode this is also
    /// the floor the pool shrinks back to.
    pub initial_threads: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            mode: PoolMode::Fixed,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_threads: DEFAULT_THREAD_CEILING,
            initial_threads: num_cpus::get(),
        }
    }
}
