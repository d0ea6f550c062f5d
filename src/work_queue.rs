//! Unbounded FIFO work queue.
//!
//! Clients hand request handles to [`WorkQueue::enqueue`]; worker threads
//! block in [`WorkQueue::dequeue`] until one is available. One mutex guards
//! the queue and one condition variable announces that it became non-empty.
//!
//! The queue never looks inside a request. `R` is whatever the caller uses
//! as a handle, including an `Option` whose `None` acts as a stop sentinel.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::telemetry::metrics;

const COMPONENT: &str = "work_queue";

/// Slots reserved up front so the first enqueues never hit the allocator.
const INITIAL_SLOTS: usize = 16;

pub struct WorkQueue<R> {
    requests: Mutex<VecDeque<R>>,
    /// Signalled (broadcast) whenever a request is appended.
    work_ready: Condvar,
}

impl<R> WorkQueue<R> {
    /// Create an empty queue together with its lock and condition variable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`] if the initial slot block cannot be
    /// allocated. This is the only recoverable allocation failure; later
    /// failures inside [`enqueue`](Self::enqueue) are fatal.
    pub fn setup() -> Result<Self> {
        let mut requests = VecDeque::new();
        requests
            .try_reserve(INITIAL_SLOTS)
            .map_err(|e| Error::OutOfMemory(format!("work queue setup: {e}")))?;

        metrics::record_operation(COMPONENT, "setup");
        debug!(slots = INITIAL_SLOTS, "work queue set up");

        Ok(Self {
            requests: Mutex::new(requests),
            work_ready: Condvar::new(),
        })
    }

    /// Append `req` at the tail and wake every waiting worker.
    ///
    /// All waiters are woken because a faster worker may drain the queue
    /// before a slower one reacquires the lock; the slower one re-checks and
    /// goes back to sleep.
    ///
    /// # Panics
    ///
    /// Panics if the queue cannot grow. A request that has been handed over
    /// is never dropped silently.
    pub fn enqueue(&self, req: R) {
        let mut requests = self.lock();
        if let Err(e) = requests.try_reserve(1) {
            panic!("failed to allocate work queue slot: {e}");
        }
        requests.push_back(req);
        trace!(queued = requests.len(), "request enqueued");

        self.work_ready.notify_all();
        drop(requests);

        metrics::record_operation(COMPONENT, "enqueue");
    }

    /// Remove and return the request at the head, blocking while the queue
    /// is empty.
    ///
    /// Requests come out in exact global insertion order. There is no
    /// timeout: a worker with no matching client waits forever.
    pub fn dequeue(&self) -> R {
        let mut requests = self.lock();
        let req = loop {
            if let Some(req) = requests.pop_front() {
                break req;
            }
            metrics::record_wait(COMPONENT, "not_empty");
            requests = self
                .work_ready
                .wait(requests)
                .unwrap_or_else(PoisonError::into_inner);
        };
        trace!(queued = requests.len(), "request dequeued");
        drop(requests);

        metrics::record_operation(COMPONENT, "dequeue");
        req
    }

    /// Number of requests currently waiting.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Tear the queue down once every client and worker has exited.
    ///
    /// Remaining slots are released without handing their requests back;
    /// what happens to undelivered work is the caller's business. Returns
    /// how many requests were discarded.
    pub fn shutdown(self) -> usize {
        let requests = self
            .requests
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        let discarded = requests.len();
        drop(requests);

        metrics::record_operation(COMPONENT, "shutdown");
        debug!(discarded, "work queue shut down");
        discarded
    }

    // A panic while holding the lock cannot leave the deque half-updated,
    // so a poisoned guard is still consistent.
    fn lock(&self) -> MutexGuard<'_, VecDeque<R>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R> std::fmt::Debug for WorkQueue<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkQueue")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
