//! Clients submit requests to a shared [`WorkQueue`]; a pool of servers
//! processes them.
//!
//! Servers stop when they dequeue a `None` sentinel. One sentinel per
//! server is enqueued after every client has finished, so FIFO order
//! guarantees all real requests are drained first.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use opentelemetry::KeyValue;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::{Tally, join_all};
use crate::config::HarnessConfig;
use crate::error::{Error, Result};
use crate::telemetry::metrics;
use crate::telemetry::worker::{record_handoff, start_worker_span};
use crate::work_queue::WorkQueue;

/// A request as seen by the harness. The queue itself never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Request {
    pub client: usize,
    pub seq: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientServerReport {
    pub run_id: Uuid,
    pub submitted: usize,
    /// Requests handled by each server, indexed by server.
    pub per_server: Vec<usize>,
    pub tally: Tally,
    /// Requests still queued at shutdown.
    pub discarded: usize,
    pub elapsed_ms: f64,
}

impl ClientServerReport {
    pub fn is_clean(&self) -> bool {
        self.tally.is_clean() && self.discarded == 0
    }
}

pub fn run(config: &HarnessConfig) -> Result<ClientServerReport> {
    let total = config.validate_client_server()?;

    let run_id = Uuid::new_v4();
    let queue: Arc<WorkQueue<Option<Request>>> = Arc::new(WorkQueue::setup()?);
    let started = Instant::now();
    info!(
        %run_id,
        clients = config.clients,
        servers = config.servers,
        "client/server run started"
    );

    let servers = (0..config.servers)
        .map(|index| {
            let queue = Arc::clone(&queue);
            thread::Builder::new()
                .name(format!("server-{index}"))
                .spawn(move || serve(&queue, &run_id, index))
        })
        .collect::<std::io::Result<Vec<_>>>()?;

    let clients = (0..config.clients)
        .map(|index| {
            let queue = Arc::clone(&queue);
            let requests = config.requests_per_client;
            thread::Builder::new()
                .name(format!("client-{index}"))
                .spawn(move || submit(&queue, &run_id, index, requests))
        })
        .collect::<std::io::Result<Vec<_>>>()?;

    // Servers get their sentinels even if a client died, or they would never exit.
    let clients_joined = join_all("client", clients);
    for _ in 0..config.servers {
        queue.enqueue(None);
    }
    let handled = join_all("server", servers)?;
    clients_joined?;

    let queue = Arc::try_unwrap(queue)
        .map_err(|_| Error::Harness("work queue still shared after join".to_string()))?;
    let discarded = queue.shutdown();

    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    metrics::harness_duration_ms().record(
        elapsed_ms,
        &[KeyValue::new("scenario", "client_server")],
    );

    let per_server = handled.iter().map(Vec::len).collect();
    let tally = Tally::count(total, handled.into_iter().flatten());
    let report = ClientServerReport {
        run_id,
        submitted: total,
        per_server,
        tally,
        discarded,
        elapsed_ms,
    };
    info!(
        %run_id,
        processed = report.tally.received,
        lost = report.tally.lost,
        duplicated = report.tally.duplicated,
        elapsed_ms,
        "client/server run finished"
    );
    Ok(report)
}

fn submit(queue: &WorkQueue<Option<Request>>, run_id: &Uuid, client: usize, requests: usize) {
    let span = start_worker_span(run_id, "client", client);
    for seq in 0..requests {
        queue.enqueue(Some(Request { client, seq }));
    }
    record_handoff(&span, requests);
}

fn serve(queue: &WorkQueue<Option<Request>>, run_id: &Uuid, server: usize) -> Vec<Request> {
    let span = start_worker_span(run_id, "server", server);
    let mut handled = Vec::new();
    while let Some(request) = queue.dequeue() {
        handled.push(request);
    }
    record_handoff(&span, handled.len());
    handled
}
