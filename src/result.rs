use std::fmt;
use std::sync::{Arc, Condvar, Mutex};

use crate::payload::Payload;

/// One-shot completion slot shared between a queued work item and the handle
/// returned to the submitter.
///
/// `post` is called at most once, by the worker that executed the paired
/// item (or by the abandonment path when the item is dropped unexecuted).
/// The slot's lock is independent of the pool lock: this is a point-to-point
/// handoff unrelated to pool bookkeeping.
pub(crate) struct Completion {
    slot: Mutex<Option<Payload>>,
    ready: Condvar,
}

impl Completion {
    pub(crate) fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    /// Stores the produced value and wakes the waiting submitter.
    pub(crate) fn post(&self, payload: Payload) {
        let mut slot = self.slot.lock().unwrap();
        debug_assert!(slot.is_none(), "completion posted twice");
        *slot = Some(payload);
        self.ready.notify_one();
    }

    /// Blocks until a value has been posted, then takes it.
    fn wait(&self) -> Payload {
        let mut slot = self.slot.lock().unwrap();
        loop {
            if let Some(payload) = slot.take() {
                return payload;
            }
            slot = self.ready.wait(slot).unwrap();
        }
    }
}

/// Handle for retrieving the result of one submitted task.
///
/// Returned by [`ThreadPool::submit`](crate::pool::ThreadPool::submit). A
/// handle is invalid when the submission itself was rejected (queue full or
/// pool shut down); check [`TaskHandle::is_valid`] before trusting the value
/// from [`TaskHandle::get`].
pub struct TaskHandle {
    completion: Option<Arc<Completion>>,
}

impl TaskHandle {
    pub(crate) fn new(completion: Arc<Completion>) -> Self {
        Self {
            completion: Some(completion),
        }
    }

    pub(crate) fn invalid() -> Self {
        Self { completion: None }
    }

    /// Whether the submission behind this handle was accepted.
    pub fn is_valid(&self) -> bool {
        self.completion.is_some()
    }

    /// Blocks the calling thread until the paired task has produced a value,
    /// then returns it, consuming the handle.
    ///
    /// An invalid handle returns [`Payload::empty`] immediately without
    /// blocking. A task dropped unexecuted at shutdown also resolves to an
    /// empty payload.
    pub fn get(self) -> Payload {
        match self.completion {
            Some(completion) => completion.wait(),
            None => Payload::empty(),
        }
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("valid", &self.is_valid())
            .finish()
    }
}
