//! workbuf CLI: run the hand-off scenarios and report what came out.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use workbuf::config::{Config, HarnessConfig};
use workbuf::harness::{self, ClientServerReport, ProducerConsumerReport};
use workbuf::telemetry::{TelemetryConfig, init_telemetry};

#[derive(Parser)]
#[command(name = "workbuf", about = "Blocking work queue and bounded buffer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Common {
    /// TOML file with a [harness] table (otherwise WORKBUF_* env vars)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Clients submit requests to a work queue drained by a server pool
    ClientServer {
        #[command(flatten)]
        common: Common,
        /// Client threads
        #[arg(long)]
        clients: Option<usize>,
        /// Server threads
        #[arg(long)]
        servers: Option<usize>,
        /// Requests submitted by each client
        #[arg(long)]
        requests: Option<usize>,
    },
    /// Producers stream items through a bounded buffer to consumers
    ProducerConsumer {
        #[command(flatten)]
        common: Common,
        /// Producer threads
        #[arg(long)]
        producers: Option<usize>,
        /// Consumer threads
        #[arg(long)]
        consumers: Option<usize>,
        /// Items sent by each producer
        #[arg(long)]
        items: Option<usize>,
        /// Buffer capacity
        #[arg(long)]
        capacity: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "workbuf".to_string(),
        log_level: config.log_level.clone(),
    })?;

    match cli.command {
        Command::ClientServer {
            common,
            clients,
            servers,
            requests,
        } => {
            let mut settings = load_harness(&common)?;
            apply(&mut settings.clients, clients);
            apply(&mut settings.servers, servers);
            apply(&mut settings.requests_per_client, requests);

            let report = tokio::task::spawn_blocking(move || harness::client_server::run(&settings))
                .await
                .context("client/server harness did not complete")??;
            print_client_server(&report, common.json)?;
            if !report.is_clean() {
                bail!("client/server run lost or duplicated requests");
            }
        }
        Command::ProducerConsumer {
            common,
            producers,
            consumers,
            items,
            capacity,
        } => {
            let mut settings = load_harness(&common)?;
            apply(&mut settings.producers, producers);
            apply(&mut settings.consumers, consumers);
            apply(&mut settings.items_per_producer, items);
            apply(&mut settings.buffer_capacity, capacity);

            let report =
                tokio::task::spawn_blocking(move || harness::producer_consumer::run(&settings))
                    .await
                    .context("producer/consumer harness did not complete")??;
            print_producer_consumer(&report, common.json)?;
            if !report.is_clean() {
                bail!("producer/consumer run lost, duplicated or reordered items");
            }
        }
    }
    Ok(())
}

fn load_harness(common: &Common) -> anyhow::Result<HarnessConfig> {
    let settings = match &common.config {
        Some(path) => HarnessConfig::from_toml_file(path)?,
        None => HarnessConfig::from_env()?,
    };
    Ok(settings)
}

fn apply(slot: &mut usize, value: Option<usize>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn print_json<T: Serialize>(report: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

fn print_client_server(report: &ClientServerReport, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(report);
    }
    println!("Run:        {}", report.run_id);
    println!("Submitted:  {}", report.submitted);
    println!("Processed:  {}", report.tally.received);
    for (server, handled) in report.per_server.iter().enumerate() {
        println!("  server {server:<3} {handled}");
    }
    println!("Lost:       {}", report.tally.lost);
    println!("Duplicated: {}", report.tally.duplicated);
    println!("Discarded:  {}", report.discarded);
    println!("Elapsed:    {:.2} ms", report.elapsed_ms);
    Ok(())
}

fn print_producer_consumer(report: &ProducerConsumerReport, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(report);
    }
    println!("Run:        {}", report.run_id);
    println!("Capacity:   {}", report.capacity);
    println!("Sent:       {}", report.sent);
    println!("Received:   {}", report.tally.received);
    println!("Lost:       {}", report.tally.lost);
    println!("Duplicated: {}", report.tally.duplicated);
    println!("Reordered:  {}", report.order_violations);
    println!("Abandoned:  {}", report.abandoned);
    println!("Elapsed:    {:.2} ms", report.elapsed_ms);
    Ok(())
}
