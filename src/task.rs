use std::fmt;
use std::sync::Arc;

use crate::payload::Payload;
use crate::result::Completion;

/// A unit of work executable on the pool.
///
/// Implement `run` to perform the work and wrap its output in a
/// [`Payload`]; the submitter recovers the concrete value from the handle
/// returned at submission time. Failures are not caught by the pool —
/// encode them into the produced payload (an `Option`, a `Result`, etc.),
/// or accept that a panic terminates the executing worker.
///
/// Closures can be submitted without a hand-written impl via
/// [`ThreadPool::submit_fn`](crate::pool::ThreadPool::submit_fn).
pub trait Task: Send + 'static {
    /// Performs the work, consuming the task.
    fn run(self: Box<Self>) -> Payload;
}

/// Adapter lifting any `FnOnce() -> T` closure into the [`Task`] contract.
pub struct ClosureTask {
    f: Box<dyn FnOnce() -> Payload + Send>,
}

impl ClosureTask {
    pub fn new<T, F>(f: F) -> Self
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        Self {
            f: Box::new(move || Payload::new(f())),
        }
    }
}

impl Task for ClosureTask {
    fn run(self: Box<Self>) -> Payload {
        (self.f)()
    }
}

impl fmt::Debug for ClosureTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosureTask").finish()
    }
}

/// A queued pairing of a task with the completion slot its result is
/// delivered into.
///
/// `execute` is the only entry point workers use — never `run` directly —
/// so that delivery is guaranteed whenever a slot is attached. The handle
/// side holds the other `Arc` to the slot; neither end owns the other.
pub(crate) struct WorkItem {
    task: Option<Box<dyn Task>>,
    completion: Option<Arc<Completion>>,
}

impl WorkItem {
    pub(crate) fn new(task: Box<dyn Task>, completion: Arc<Completion>) -> Self {
        Self {
            task: Some(task),
            completion: Some(completion),
        }
    }

    /// Runs the task and forwards the produced value into the completion
    /// slot. With no slot attached the work still runs and the result is
    /// discarded.
    pub(crate) fn execute(mut self) {
        let task = match self.task.take() {
            Some(task) => task,
            None => return,
        };
        let payload = task.run();
        if let Some(completion) = self.completion.take() {
            completion.post(payload);
        }
    }
}

impl Drop for WorkItem {
    fn drop(&mut self) {
        // Reached only when execute never delivered: the item was dropped
        // unexecuted (shutdown) or the task panicked mid-run. Post an empty
        // payload so a blocked `get` is not stranded.
        if let Some(completion) = self.completion.take() {
            completion.post(Payload::empty());
        }
    }
}

impl fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem")
            .field("task", &"<boxed-task>")
            .field("pending", &self.completion.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::TaskHandle;
    use std::panic::{self, AssertUnwindSafe};

    struct Doubler(u64);

    impl Task for Doubler {
        fn run(self: Box<Self>) -> Payload {
            Payload::new(self.0 * 2)
        }
    }

    #[test]
    fn execute_forwards_result_to_completion() {
        let completion = Arc::new(Completion::new());
        let handle = TaskHandle::new(completion.clone());

        WorkItem::new(Box::new(Doubler(21)), completion).execute();
        assert_eq!(handle.get().extract::<u64>().unwrap(), 42);
    }

    #[test]
    fn closure_task_wraps_return_value() {
        let completion = Arc::new(Completion::new());
        let handle = TaskHandle::new(completion.clone());

        let task = ClosureTask::new(|| "hello".to_string());
        WorkItem::new(Box::new(task), completion).execute();
        assert_eq!(handle.get().extract::<String>().unwrap(), "hello");
    }

    #[test]
    fn dropped_unexecuted_item_posts_empty() {
        let completion = Arc::new(Completion::new());
        let handle = TaskHandle::new(completion.clone());

        drop(WorkItem::new(Box::new(Doubler(1)), completion));
        assert!(handle.get().is_empty());
    }

    #[test]
    fn panicking_task_still_resolves_handle() {
        let completion = Arc::new(Completion::new());
        let handle = TaskHandle::new(completion.clone());

        let item = WorkItem::new(
            Box::new(ClosureTask::new(|| -> u64 { panic!("boom") })),
            completion,
        );
        let result = panic::catch_unwind(AssertUnwindSafe(move || item.execute()));
        assert!(result.is_err());
        assert!(handle.get().is_empty());
    }
}
