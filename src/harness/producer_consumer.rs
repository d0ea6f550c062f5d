//! Producers stream data items through a [`BoundedBuffer`] to consumers.
//!
//! Consumers stop when they receive a `None` sentinel. One sentinel per
//! consumer is sent after every producer has been joined, including ones
//! that panicked, so consumers are always released. Because the buffer is
//! FIFO, every consumer must see each producer's items in increasing
//! sequence order; gaps are fine, inversions are counted.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use opentelemetry::KeyValue;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::{Tally, join_all};
use crate::bounded_buffer::BoundedBuffer;
use crate::config::HarnessConfig;
use crate::error::{Error, Result};
use crate::telemetry::metrics;
use crate::telemetry::worker::{record_handoff, start_worker_span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DataItem {
    pub producer: usize,
    pub seq: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProducerConsumerReport {
    pub run_id: Uuid,
    pub capacity: usize,
    pub sent: usize,
    pub tally: Tally,
    /// Items a consumer saw out of order relative to their producer.
    pub order_violations: usize,
    /// Items still resident at shutdown.
    pub abandoned: usize,
    pub elapsed_ms: f64,
}

impl ProducerConsumerReport {
    pub fn is_clean(&self) -> bool {
        self.tally.is_clean() && self.order_violations == 0 && self.abandoned == 0
    }
}

pub fn run(config: &HarnessConfig) -> Result<ProducerConsumerReport> {
    let total = config.validate_producer_consumer()?;

    let run_id = Uuid::new_v4();
    let buffer: Arc<BoundedBuffer<Option<DataItem>>> =
        Arc::new(BoundedBuffer::startup(config.buffer_capacity));
    let started = Instant::now();
    info!(
        %run_id,
        producers = config.producers,
        consumers = config.consumers,
        capacity = config.buffer_capacity,
        "producer/consumer run started"
    );

    let consumers = (0..config.consumers)
        .map(|index| {
            let buffer = Arc::clone(&buffer);
            thread::Builder::new()
                .name(format!("consumer-{index}"))
                .spawn(move || consume(&buffer, &run_id, index))
        })
        .collect::<std::io::Result<Vec<_>>>()?;

    let producers = (0..config.producers)
        .map(|index| {
            let buffer = Arc::clone(&buffer);
            let items = config.items_per_producer;
            thread::Builder::new()
                .name(format!("producer-{index}"))
                .spawn(move || produce(&buffer, &run_id, index, items))
        })
        .collect::<std::io::Result<Vec<_>>>()?;

    let received = drain(&buffer, producers, consumers)?;

    let buffer = Arc::try_unwrap(buffer)
        .map_err(|_| Error::Harness("bounded buffer still shared after join".to_string()))?;
    let abandoned = buffer.shutdown();

    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    metrics::harness_duration_ms().record(
        elapsed_ms,
        &[KeyValue::new("scenario", "producer_consumer")],
    );

    let order_violations: usize = received.iter().map(|items| order_violations(items)).sum();
    let tally = Tally::count(total, received.into_iter().flatten());
    let report = ProducerConsumerReport {
        run_id,
        capacity: config.buffer_capacity,
        sent: total,
        tally,
        order_violations,
        abandoned,
        elapsed_ms,
    };
    info!(
        %run_id,
        received = report.tally.received,
        lost = report.tally.lost,
        duplicated = report.tally.duplicated,
        order_violations,
        elapsed_ms,
        "producer/consumer run finished"
    );
    Ok(report)
}

/// Join the producers, release every consumer with a sentinel, then join
/// the consumers. A producer failure is reported only once all consumers
/// have exited.
fn drain(
    buffer: &BoundedBuffer<Option<DataItem>>,
    producers: Vec<JoinHandle<()>>,
    consumers: Vec<JoinHandle<Vec<DataItem>>>,
) -> Result<Vec<Vec<DataItem>>> {
    let producers_joined = join_all("producer", producers);
    for _ in 0..consumers.len() {
        buffer.send(None);
    }
    let received = join_all("consumer", consumers)?;
    producers_joined?;
    Ok(received)
}

fn produce(
    buffer: &BoundedBuffer<Option<DataItem>>,
    run_id: &Uuid,
    producer: usize,
    items: usize,
) {
    let span = start_worker_span(run_id, "producer", producer);
    for seq in 0..items {
        buffer.send(Some(DataItem { producer, seq }));
    }
    record_handoff(&span, items);
}

fn consume(
    buffer: &BoundedBuffer<Option<DataItem>>,
    run_id: &Uuid,
    consumer: usize,
) -> Vec<DataItem> {
    let span = start_worker_span(run_id, "consumer", consumer);
    let mut received = Vec::new();
    while let Some(item) = buffer.receive() {
        received.push(item);
    }
    record_handoff(&span, received.len());
    received
}

fn order_violations(items: &[DataItem]) -> usize {
    let mut last_seq = HashMap::new();
    items
        .iter()
        .filter(|item| {
            let previous = last_seq.insert(item.producer, item.seq);
            previous.is_some_and(|seq| seq >= item.seq)
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_violations_ignore_gaps_but_count_inversions() {
        let items = [
            DataItem { producer: 0, seq: 0 },
            DataItem { producer: 1, seq: 0 },
            DataItem { producer: 0, seq: 3 },
            DataItem { producer: 0, seq: 2 },
            DataItem { producer: 1, seq: 1 },
        ];
        assert_eq!(order_violations(&items), 1);
        assert_eq!(order_violations(&items[..3]), 0);
    }

    fn send_one_then_fail(buffer: &BoundedBuffer<Option<DataItem>>) {
        buffer.send(Some(DataItem { producer: 1, seq: 0 }));
        panic!("producer 1 failed");
    }

    #[test]
    fn drain_releases_consumers_when_a_producer_panics() {
        let run_id = Uuid::new_v4();
        let buffer = Arc::new(BoundedBuffer::startup(2));

        let consumers: Vec<_> = (0..3)
            .map(|index| {
                let buffer = Arc::clone(&buffer);
                thread::spawn(move || consume(&buffer, &run_id, index))
            })
            .collect();
        let producers = vec![
            {
                let buffer = Arc::clone(&buffer);
                thread::spawn(move || produce(&buffer, &run_id, 0, 5))
            },
            {
                let buffer = Arc::clone(&buffer);
                thread::spawn(move || send_one_then_fail(&buffer))
            },
        ];

        let result = drain(&buffer, producers, consumers);
        assert!(matches!(result, Err(Error::Harness(_))));

        // Every consumer exited and took exactly one sentinel.
        let buffer = Arc::try_unwrap(buffer).expect("consumers still hold the buffer");
        assert_eq!(buffer.shutdown(), 0);
    }
}
