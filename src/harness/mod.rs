//! Load-driving scenarios for the two primitives.
//!
//! Each scenario spins up real threads against a fresh instance, checks
//! that every handle handed in came out exactly once, and returns a report.

pub mod client_server;
pub mod producer_consumer;

use crate::error::{Error, Result};
use std::collections::HashSet;
use std::hash::Hash;
use std::thread::JoinHandle;

pub use client_server::{ClientServerReport, Request};
pub use producer_consumer::{DataItem, ProducerConsumerReport};

/// Lost and duplicated handles compared to an expected set of distinct ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct Tally {
    pub received: usize,
    pub lost: usize,
    pub duplicated: usize,
}

impl Tally {
    fn count<T, I>(expected: usize, received: I) -> Self
    where
        T: Hash + Eq,
        I: IntoIterator<Item = T>,
    {
        let mut seen = HashSet::new();
        let mut tally = Self::default();
        for handle in received {
            tally.received += 1;
            if !seen.insert(handle) {
                tally.duplicated += 1;
            }
        }
        tally.lost = expected.saturating_sub(seen.len());
        tally
    }

    pub fn is_clean(&self) -> bool {
        self.lost == 0 && self.duplicated == 0
    }
}

/// Join every handle, even after one has panicked, so no thread is left
/// running unobserved. Fails listing every thread that panicked.
fn join_all<T>(role: &str, handles: Vec<JoinHandle<T>>) -> Result<Vec<T>> {
    let mut results = Vec::with_capacity(handles.len());
    let mut panicked = Vec::new();
    for (index, handle) in handles.into_iter().enumerate() {
        match handle.join() {
            Ok(result) => results.push(result),
            Err(_) => panicked.push(index.to_string()),
        }
    }

    if panicked.is_empty() {
        Ok(results)
    } else {
        Err(Error::Harness(format!(
            "{role} threads panicked: {}",
            panicked.join(", ")
        )))
    }
}
