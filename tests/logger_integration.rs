//! tee_log 集成测试
//!
//! 通过公开 API 验证端到端行为：工厂校验、网络 sink、字段隔离、tracing 桥接。

use serde_json::Value;
use std::collections::HashSet;
use std::io::{BufRead, BufReader};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tee_log::sinks::{Encoder, LogSink, SinkError, SinkResult};
use tee_log::{fields, new_logger, Level, LoggerBuilder, LoggingConfig, Record, TeeLogError};
use tracing_subscriber::layer::SubscriberExt;

/// 把每条记录编码为 JSON 并保存，便于断言完整的输出形态
#[derive(Debug, Default)]
struct JsonCapture {
    lines: Mutex<Vec<Value>>,
}

impl JsonCapture {
    fn snapshot(&self) -> Vec<Value> {
        self.lines.lock().unwrap().clone()
    }
}

#[derive(Debug)]
struct JsonCaptureSink {
    threshold: Level,
    capture: Arc<JsonCapture>,
}

impl LogSink for JsonCaptureSink {
    fn threshold(&self) -> Level {
        self.threshold
    }

    fn write_record(&self, record: &Record, static_fields: &[(String, Value)]) -> SinkResult<()> {
        let line = Encoder::Json.encode(record, &[static_fields])?;
        let value: Value =
            serde_json::from_str(line.trim_end()).map_err(|e| SinkError::Serialization(e.to_string()))?;
        self.capture.lines.lock().unwrap().push(value);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "json-capture"
    }
}

#[derive(Debug)]
struct BrokenSink;

impl LogSink for BrokenSink {
    fn threshold(&self) -> Level {
        Level::Debug
    }

    fn write_record(&self, _record: &Record, _static_fields: &[(String, Value)]) -> SinkResult<()> {
        Err(SinkError::Network("connection reset by peer".to_string()))
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

fn capture_builder(threshold: Level) -> (LoggerBuilder, Arc<JsonCapture>) {
    let capture = Arc::new(JsonCapture::default());
    let builder = LoggerBuilder::new()
        .service("integration")
        .namespace("default")
        .sink(JsonCaptureSink {
            threshold,
            capture: Arc::clone(&capture),
        });
    (builder, capture)
}

#[test]
fn test_bogus_level_returns_config_error() {
    let config = LoggingConfig {
        level: "bogus".to_string(),
        disable_stdout: true,
        ..Default::default()
    };
    match new_logger(&config) {
        Err(err) => {
            assert!(err.is_config_error());
            assert!(err.to_string().contains("bogus"));
        }
        Ok(_) => panic!("logger must not be created for an unknown level"),
    }
}

#[test]
fn test_env_config_feeds_factory() {
    let vars = vec![
        ("LOGGER_SERVICE".to_string(), "env-service".to_string()),
        ("LOGGER_LEVEL".to_string(), "bogus".to_string()),
        ("LOGGER_DISABLE_STDOUT".to_string(), "true".to_string()),
        ("PATH".to_string(), "/usr/bin".to_string()),
    ];
    let config = LoggingConfig::from_env_vars(vars).unwrap();
    assert_eq!(config.service, "env-service");
    assert!(config.disable_stdout);
    assert!(matches!(
        new_logger(&config),
        Err(TeeLogError::InvalidLogLevel(_))
    ));
}

#[test]
fn test_disabled_output_never_errors() {
    let config = LoggingConfig {
        service: "silent".to_string(),
        disable_stdout: true,
        ..Default::default()
    };
    let logger = new_logger(&config).unwrap();

    logger.debug("nothing");
    logger.infof(format_args!("{} {}", "still", "nothing"));
    logger.with(fields! { "k" => "v" }).error("nothing at all");
    logger.trace(Some(std::io::Error::other("ignored")));
    assert_eq!(logger.write_failures(), 0);
}

#[test]
fn test_network_sink_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let config = LoggingConfig {
        service: "shipper".to_string(),
        level: "info".to_string(),
        namespace: "net".to_string(),
        disable_stdout: true,
        logstash_uri: addr.to_string(),
        logstash_protocol: "tcp".to_string(),
        ..Default::default()
    };
    let logger = new_logger(&config).unwrap();
    let (stream, _) = listener.accept().unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();

    logger.debug("below threshold");
    logger
        .with(fields! { "order" => 17, "message" => "shadowed" })
        .warn("payment retried");

    let mut line = String::new();
    BufReader::new(stream).read_line(&mut line).unwrap();
    let record: Value = serde_json::from_str(line.trim_end()).unwrap();

    assert_eq!(record["level"], "warn");
    assert_eq!(record["message"], "payment retried");
    assert_eq!(record["service"], "shipper");
    assert_eq!(record["namespace"], "net");
    assert_eq!(record["order"], 17);
    assert_eq!(record["@version"], "1");
    assert_eq!(record["type"], "log");

    let timestamp = record["@timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    assert!(timestamp.ends_with('Z'));
}

#[test]
fn test_network_dial_failure_is_transport_error() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let config = LoggingConfig {
        disable_stdout: true,
        logstash_uri: addr.to_string(),
        logstash_protocol: "tcp".to_string(),
        logstash_timeout_ms: 1000,
        ..Default::default()
    };
    let err = new_logger(&config).unwrap_err();
    assert_eq!(err.category(), "transport");
}

#[test]
fn test_invalid_protocol_is_config_error() {
    let config = LoggingConfig {
        disable_stdout: true,
        logstash_uri: "127.0.0.1:5000".to_string(),
        logstash_protocol: "carrier-pigeon".to_string(),
        ..Default::default()
    };
    assert!(new_logger(&config).unwrap_err().is_config_error());
}

#[test]
fn test_sibling_loggers_are_isolated() {
    let (builder, capture) = capture_builder(Level::Debug);
    let logger = builder.build();

    let l2 = logger.with(fields! { "a" => 1 });
    let l3 = logger.with(fields! { "b" => 2 });
    l2.info("from l2");
    l3.info("from l3");
    logger.info("from root");

    assert!(l2.get_field("b").is_none());
    assert!(l3.get_field("a").is_none());
    assert!(logger.get_field("a").is_none());
    assert!(logger.get_field("b").is_none());

    let lines = capture.snapshot();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["a"], 1);
    assert!(lines[0].get("b").is_none());
    assert_eq!(lines[1]["b"], 2);
    assert!(lines[1].get("a").is_none());
    assert!(lines[2].get("a").is_none() && lines[2].get("b").is_none());
}

#[test]
fn test_namespace_called_twice_keeps_last() {
    let (builder, capture) = capture_builder(Level::Debug);
    let logger = builder.build().namespace("x").namespace("y");
    logger.info("namespaced");

    let lines = capture.snapshot();
    assert_eq!(lines[0]["namespace"], "y");
}

#[test]
fn test_reserved_context_keys_never_override_record() {
    let (builder, capture) = capture_builder(Level::Debug);
    let logger = builder.build().with(fields! {
        "service" => "spoofed",
        "level" => "spoofed",
        "@timestamp" => "spoofed",
        "message" => "spoofed",
    });
    logger.error("real message");

    let line = &capture.snapshot()[0];
    assert_eq!(line["service"], "integration");
    assert_eq!(line["level"], "error");
    assert_eq!(line["message"], "real message");
    assert_ne!(line["@timestamp"], "spoofed");
}

#[test]
fn test_failing_sink_does_not_block_others() {
    let (builder, capture) = capture_builder(Level::Debug);
    let logger = LoggerBuilder::new()
        .service("integration")
        .sink(BrokenSink)
        .build();
    // 独立的 logger 验证失败被吞掉
    logger.error("swallowed");
    assert_eq!(logger.write_failures(), 1);

    let logger = builder.boxed_sink(Box::new(BrokenSink)).build();
    logger.info("still delivered");
    assert_eq!(capture.snapshot().len(), 1);
    assert_eq!(logger.write_failures(), 1);
}

#[test]
fn test_recover_logs_before_unwinding() {
    let (builder, capture) = capture_builder(Level::Debug);
    let logger = builder.build();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        logger.recover::<_, ()>("batch job", || panic!("index {} out of range", 9))
    }));
    assert!(result.is_err());

    let lines = capture.snapshot();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["level"], "error");
    assert_eq!(lines[0]["message"], "index 9 out of range");
    assert!(lines[0]["stacktrace"].is_string());
    assert_eq!(lines[1]["level"], "panic");
    assert_eq!(
        lines[1]["message"],
        "recovered batch job from index 9 out of range"
    );
}

#[test]
fn test_tracing_events_share_the_tee() {
    let (builder, capture) = capture_builder(Level::Info);
    let logger = builder.build().with(fields! { "component" => "bridge" });
    let subscriber = tracing_subscriber::registry().with(logger.dispatcher_layer());

    tracing::subscriber::with_default(subscriber, || {
        tracing::debug!("filtered by threshold");
        tracing::info!(user_id = 42, "user signed in");
    });

    let lines = capture.snapshot();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["message"], "user signed in");
    assert_eq!(lines[0]["user_id"], 42);
    assert_eq!(lines[0]["component"], "bridge");
    assert_eq!(lines[0]["service"], "integration");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_with_keeps_fields_isolated() {
    const WORKERS: usize = 16;
    const CALLS: usize = 100;

    let (builder, capture) = capture_builder(Level::Debug);
    let logger = builder.build();

    let mut handles = Vec::with_capacity(WORKERS);
    for worker in 0..WORKERS {
        let logger = logger.clone();
        handles.push(tokio::spawn(async move {
            for call in 0..CALLS {
                let scoped = logger.with(fields! {
                    "worker" => worker,
                    format!("only_{}", worker) => call,
                });
                scoped.infof(format_args!("{}:{}", worker, call));
                tokio::task::yield_now().await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let lines = capture.snapshot();
    assert_eq!(lines.len(), WORKERS * CALLS);

    let mut seen = HashSet::new();
    for line in &lines {
        let message = line["message"].as_str().unwrap();
        let (worker, call) = message.split_once(':').unwrap();
        let worker: usize = worker.parse().unwrap();
        let call: usize = call.parse().unwrap();

        assert_eq!(line["worker"], worker);
        assert_eq!(line[format!("only_{}", worker).as_str()], call);
        let object = line.as_object().unwrap();
        let foreign = object
            .keys()
            .filter(|k| k.starts_with("only_"))
            .count();
        assert_eq!(foreign, 1, "record {} carries another worker's field", message);
        assert!(seen.insert((worker, call)));
    }
    assert!(logger.get_field("worker").is_none());
}
