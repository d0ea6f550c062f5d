use workbuf::config::{Config, HarnessConfig};

#[test]
fn config_from_env_defaults_log_level() {
    unsafe {
        std::env::remove_var("LOG_LEVEL");
    }

    let config = Config::from_env().unwrap();
    assert_eq!(config.log_level, "info");
}

// All WORKBUF_* manipulation lives in one test so parallel tests never race on it.
#[test]
fn harness_config_from_env_overrides_and_rejects_garbage() {
    unsafe {
        std::env::set_var("WORKBUF_CLIENTS", "7");
        std::env::set_var("WORKBUF_BUFFER_CAPACITY", " 3 ");
    }

    let config = HarnessConfig::from_env().unwrap();
    assert_eq!(config.clients, 7);
    assert_eq!(config.buffer_capacity, 3);
    assert_eq!(config.servers, HarnessConfig::default().servers);

    unsafe {
        std::env::set_var("WORKBUF_SERVERS", "many");
    }
    let result = HarnessConfig::from_env();
    assert!(result.is_err());

    // Clean up
    unsafe {
        std::env::remove_var("WORKBUF_CLIENTS");
        std::env::remove_var("WORKBUF_BUFFER_CAPACITY");
        std::env::remove_var("WORKBUF_SERVERS");
    }
}

#[test]
fn harness_config_from_toml_keeps_defaults_for_missing_keys() {
    let config = HarnessConfig::from_toml_str(
        r#"
        [harness]
        producers = 2
        consumers = 5
        items_per_producer = 10
        "#,
    )
    .unwrap();

    assert_eq!(config.producers, 2);
    assert_eq!(config.consumers, 5);
    assert_eq!(config.items_per_producer, 10);
    assert_eq!(config.clients, HarnessConfig::default().clients);
    assert_eq!(config.validate_producer_consumer().unwrap(), 20);
}

#[test]
fn harness_config_from_toml_file() {
    let path = std::env::temp_dir().join(format!("workbuf-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(&path, "[harness]\nbuffer_capacity = 1\n").unwrap();

    let config = HarnessConfig::from_toml_file(&path).unwrap();
    assert_eq!(config.buffer_capacity, 1);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn harness_config_missing_file_is_a_config_error() {
    let path = std::env::temp_dir().join(format!("workbuf-missing-{}.toml", uuid::Uuid::new_v4()));
    let result = HarnessConfig::from_toml_file(&path);
    assert!(matches!(result, Err(workbuf::error::Error::Config(_))));
}

#[test]
fn validate_rejects_zero_capacity() {
    let config = HarnessConfig {
        buffer_capacity: 0,
        ..HarnessConfig::default()
    };
    assert!(config.validate_producer_consumer().is_err());
    assert!(config.validate_client_server().is_ok());
}

#[test]
fn validate_rejects_overflowing_totals() {
    let config = HarnessConfig {
        producers: 2,
        items_per_producer: usize::MAX,
        clients: usize::MAX,
        requests_per_client: 3,
        ..HarnessConfig::default()
    };

    let err = config.validate_producer_consumer().unwrap_err();
    assert!(err.to_string().contains("overflows"), "{err}");
    let err = config.validate_client_server().unwrap_err();
    assert!(err.to_string().contains("overflows"), "{err}");
    assert!(config.total_items().is_err());
}

#[test]
fn validate_returns_the_scenario_total() {
    let config = HarnessConfig::default();
    assert_eq!(config.validate_client_server().unwrap(), 100);
    assert_eq!(config.validate_producer_consumer().unwrap(), 100);
}
