//! Fixed-capacity circular buffer between producers and consumers.
//!
//! The ring has `capacity + 1` slots. `head` is the next slot to write and
//! `tail` the next slot to read; `head == tail` means empty and
//! `head + 1 == tail` (mod slots) means full, so no separate counter is
//! needed and at most `capacity` items are ever resident.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::telemetry::metrics;

const COMPONENT: &str = "bounded_buffer";

struct Ring<T> {
    slots: Vec<Option<T>>,
    head: usize,
    tail: usize,
}

impl<T> Ring<T> {
    fn with_capacity(capacity: usize) -> Self {
        let Some(len) = capacity.checked_add(1) else {
            panic!("bounded buffer capacity {capacity} is too large");
        };
        let mut slots = Vec::new();
        if let Err(e) = slots.try_reserve_exact(len) {
            panic!("failed to allocate bounded buffer of {len} slots: {e}");
        }
        slots.resize_with(len, || None);
        Self {
            slots,
            head: 0,
            tail: 0,
        }
    }

    fn advance(&self, index: usize) -> usize {
        (index + 1) % self.slots.len()
    }

    fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    fn is_full(&self) -> bool {
        self.advance(self.head) == self.tail
    }

    fn len(&self) -> usize {
        (self.head + self.slots.len() - self.tail) % self.slots.len()
    }

    fn push(&mut self, item: T) {
        self.slots[self.head] = Some(item);
        self.head = self.advance(self.head);
    }

    fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.slots[self.tail].take();
        self.tail = self.advance(self.tail);
        item
    }
}

pub struct BoundedBuffer<T> {
    ring: Mutex<Ring<T>>,
    capacity: usize,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T> BoundedBuffer<T> {
    /// Create an empty buffer that holds up to `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or the slot array cannot be allocated.
    /// Setup failure is treated as unrecoverable.
    pub fn startup(capacity: usize) -> Self {
        assert!(capacity >= 1, "bounded buffer capacity must be at least 1");
        let ring = Ring::with_capacity(capacity);

        metrics::record_operation(COMPONENT, "startup");
        debug!(capacity, "bounded buffer started");

        Self {
            ring: Mutex::new(ring),
            capacity,
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    /// Store `item`, blocking while the buffer is full.
    ///
    /// The first `capacity` outstanding items never block.
    pub fn send(&self, item: T) {
        let mut ring = self.lock();
        while ring.is_full() {
            metrics::record_wait(COMPONENT, "not_full");
            ring = self
                .not_full
                .wait(ring)
                .unwrap_or_else(PoisonError::into_inner);
        }
        ring.push(item);
        trace!(resident = ring.len(), "item sent");

        self.not_empty.notify_all();
        drop(ring);

        metrics::record_operation(COMPONENT, "send");
    }

    /// Take the oldest item, blocking while the buffer is empty.
    pub fn receive(&self) -> T {
        let mut ring = self.lock();
        let item = loop {
            if let Some(item) = ring.pop() {
                break item;
            }
            metrics::record_wait(COMPONENT, "not_empty");
            ring = self
                .not_empty
                .wait(ring)
                .unwrap_or_else(PoisonError::into_inner);
        };
        trace!(resident = ring.len(), "item received");

        self.not_full.notify_all();
        drop(ring);

        metrics::record_operation(COMPONENT, "receive");
        item
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of items sent but not yet received.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.lock().is_full()
    }

    /// Tear the buffer down once every producer and consumer has exited.
    ///
    /// Items still resident are abandoned, not returned. Returns how many.
    pub fn shutdown(self) -> usize {
        let ring = self.ring.into_inner().unwrap_or_else(PoisonError::into_inner);
        let abandoned = ring.len();
        drop(ring);

        metrics::record_operation(COMPONENT, "shutdown");
        debug!(abandoned, "bounded buffer shut down");
        abandoned
    }

    fn lock(&self) -> MutexGuard<'_, Ring<T>> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> std::fmt::Debug for BoundedBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedBuffer")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_reserves_one_slot_to_tell_full_from_empty() {
        let mut ring = Ring::with_capacity(3);
        assert_eq!(ring.slots.len(), 4);
        assert!(ring.is_empty());

        for i in 0..3 {
            ring.push(i);
        }
        assert!(ring.is_full());
        assert_eq!(ring.len(), 3);

        assert_eq!(ring.pop(), Some(0));
        ring.push(3);
        assert!(ring.is_full());
        assert_eq!(ring.head, 0, "head wraps around");

        assert_eq!(ring.pop(), Some(1));
        assert_eq!(ring.pop(), Some(2));
        assert_eq!(ring.pop(), Some(3));
        assert!(ring.is_empty());
        assert_eq!(ring.len(), 0);
        assert_eq!(ring.pop(), None);
    }
}
