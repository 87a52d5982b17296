//! A bounded worker pool executing heterogeneous tasks on OS threads.
//!
//! Submitted work implements the [`Task`] contract (or is a plain closure
//! via [`ThreadPool::submit_fn`]); each submission returns a [`TaskHandle`]
//! whose blocking `get` yields the task's type-erased [`Payload`]. The pool
//! runs with a constant worker count ([`PoolMode::Fixed`]) or grows under
//! backlog and shrinks after sustained idleness ([`PoolMode::Elastic`]).

pub mod config;
pub mod error;
pub mod logging;
pub mod payload;
pub mod pool;
pub mod result;
pub mod task;
pub mod worker;

// Re-export key types for easier usage
pub use config::{PoolConfig, PoolMode};
pub use error::{ExtractError, PoolError};
pub use payload::Payload;
pub use pool::{PoolMetrics, ThreadPool};
pub use result::TaskHandle;
pub use task::{ClosureTask, Task};
pub use worker::WorkerState;
