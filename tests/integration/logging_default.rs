//! Integration test for file logging.
//!
//! Only one test in this binary may install the global subscriber.

use normcache::logging::{init_logging, LoggingConfig};
use normcache::testing::QueueTransport;
use normcache::Client;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_file_logging_records_client_events() {
    // An explicit output override would redirect the subscriber away from the file.
    if std::env::var("NORMCACHE_LOG_OUTPUT").is_ok() {
        return;
    }
    let temp_dir = TempDir::new().unwrap();
    let log_file = temp_dir.path().join("logs").join("normcache.log");
    let config = LoggingConfig {
        level: "info".to_string(),
        format: "json".to_string(),
        output: "file".to_string(),
        file: log_file.clone(),
        color: false,
        ..LoggingConfig::default()
    };
    init_logging(Some(&config)).unwrap();

    Client::builder()
        .transport(Arc::new(QueueTransport::new()))
        .build()
        .unwrap();

    let contents = std::fs::read_to_string(&log_file).unwrap();
    let line = contents
        .lines()
        .find(|line| line.contains("Client built"))
        .expect("client construction is logged");
    let event: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(event["level"], "INFO");
    assert_eq!(event["target"], "normcache::client");
    assert_eq!(event["fields"]["fetch_policy"], "cache_first");
}
