//! End-to-end runs of the client/server and producer/consumer scenarios.

use workbuf::config::HarnessConfig;
use workbuf::error::Error;
use workbuf::harness::{client_server, producer_consumer};

#[test]
fn client_server_run_with_defaults_is_clean() {
    let config = HarnessConfig::default();
    let report = client_server::run(&config).unwrap();

    assert!(report.is_clean(), "unclean report: {report:?}");
    assert_eq!(report.submitted, config.total_requests().unwrap());
    assert_eq!(report.per_server.len(), config.servers);
    assert_eq!(report.per_server.iter().sum::<usize>(), report.submitted);
    assert_eq!(report.discarded, 0);
}

#[test]
fn client_server_with_single_server_handles_everything() {
    let config = HarnessConfig {
        clients: 4,
        servers: 1,
        requests_per_client: 50,
        ..HarnessConfig::default()
    };
    let report = client_server::run(&config).unwrap();

    assert!(report.is_clean());
    assert_eq!(report.per_server, vec![200]);
}

#[test]
fn producer_consumer_run_with_defaults_is_clean() {
    let config = HarnessConfig::default();
    let report = producer_consumer::run(&config).unwrap();

    assert!(report.is_clean(), "unclean report: {report:?}");
    assert_eq!(report.sent, config.total_items().unwrap());
    assert_eq!(report.tally.received, config.total_items().unwrap());
    assert_eq!(report.capacity, config.buffer_capacity);
}

#[test]
fn producer_consumer_through_a_single_slot() {
    let config = HarnessConfig {
        producers: 3,
        consumers: 3,
        items_per_producer: 100,
        buffer_capacity: 1,
        ..HarnessConfig::default()
    };
    let report = producer_consumer::run(&config).unwrap();

    assert!(report.is_clean(), "unclean report: {report:?}");
    assert_eq!(report.order_violations, 0);
    assert_eq!(report.abandoned, 0);
}

#[test]
fn consumers_need_not_divide_the_item_count() {
    let config = HarnessConfig {
        producers: 1,
        consumers: 3,
        items_per_producer: 10,
        ..HarnessConfig::default()
    };
    let report = producer_consumer::run(&config).unwrap();

    assert!(report.is_clean(), "unclean report: {report:?}");
    assert_eq!(report.tally.received, 10);
}

#[test]
fn client_server_ignores_producer_consumer_settings() {
    let config = HarnessConfig {
        clients: 2,
        servers: 2,
        requests_per_client: 5,
        producers: 1,
        consumers: 3,
        items_per_producer: 10,
        buffer_capacity: 0,
    };
    let report = client_server::run(&config).unwrap();

    assert!(report.is_clean());
    assert_eq!(report.submitted, 10);
}

#[test]
fn producer_consumer_ignores_client_server_settings() {
    let config = HarnessConfig {
        clients: 0,
        servers: 0,
        requests_per_client: usize::MAX,
        producers: 2,
        consumers: 1,
        items_per_producer: 8,
        buffer_capacity: 3,
    };
    let report = producer_consumer::run(&config).unwrap();

    assert!(report.is_clean());
    assert_eq!(report.sent, 16);
}

#[test]
fn overflowing_totals_are_rejected_before_any_thread_starts() {
    let config = HarnessConfig {
        producers: 2,
        items_per_producer: usize::MAX,
        ..HarnessConfig::default()
    };
    assert!(matches!(
        producer_consumer::run(&config),
        Err(Error::Config(_))
    ));
}

#[test]
fn zero_servers_is_rejected() {
    let config = HarnessConfig {
        servers: 0,
        ..HarnessConfig::default()
    };
    assert!(matches!(client_server::run(&config), Err(Error::Config(_))));
}
