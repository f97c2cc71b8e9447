//! Logger 工厂
//!
//! [`new_logger`] 根据 [`LoggingConfig`] 校验配置、创建 sink、连接 tee，
//! 返回可直接使用的 [`Logger`]。遇到第一个错误立即返回，不会产生半成品。
//!
//! [`LoggerBuilder`] 用于直接组装自定义 sink。

use crate::config::{validate_config, LoggingConfig};
use crate::core::emitter::Emitter;
use crate::core::fields::{FlattenPool, Fields, DEFAULT_POOL_CAPACITY};
use crate::error::Result;
use crate::logger::{Logger, NAMESPACE_FIELD};
use crate::sinks::console::ConsoleSink;
use crate::sinks::network::NetworkSink;
use crate::sinks::tee::SinkTee;
use crate::sinks::traits::LogSink;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// `service` 静态字段名
pub const SERVICE_FIELD: &str = "service";

/// Logger 构建器
#[derive(Debug)]
pub struct LoggerBuilder {
    service: Option<String>,
    namespace: Option<String>,
    static_fields: Vec<(String, Value)>,
    sinks: Vec<Box<dyn LogSink>>,
    pool_capacity: usize,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            service: None,
            namespace: None,
            static_fields: Vec::new(),
            sinks: Vec::new(),
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置服务名，作为 `service` 静态字段附加到每条记录
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// 设置 `namespace` 上下文字段的初始值
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// 添加静态字段；同名时先添加的优先
    pub fn static_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.static_fields.push((key.into(), value.into()));
        self
    }

    /// 追加一个 sink，记录按追加顺序写入
    pub fn sink<S: LogSink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn boxed_sink(mut self, sink: Box<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// 扁平化缓冲池保留的空闲缓冲区上限
    pub fn pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }

    pub fn build(self) -> Logger {
        let mut static_fields = Vec::with_capacity(self.static_fields.len() + 1);
        if let Some(service) = self.service {
            static_fields.push((SERVICE_FIELD.to_string(), Value::String(service)));
        }
        static_fields.extend(self.static_fields);

        let mut fields = Fields::new();
        if let Some(namespace) = self.namespace {
            fields = fields.with_field(NAMESPACE_FIELD, namespace);
        }

        let tee = SinkTee::new(self.sinks, static_fields);
        let emitter = Emitter::with_pool(tee, FlattenPool::new(self.pool_capacity));
        Logger::from_parts(Arc::new(emitter), fields)
    }
}

/// 根据配置创建 logger
///
/// - 级别未设置时使用 info 并发出警告；格式未设置时使用 json
/// - 级别或格式名称无法识别时返回配置错误
/// - 除非禁用，否则创建控制台 sink；`logstash_uri` 非空时创建网络 sink，
///   连接失败返回传输错误
pub fn new_logger(config: &LoggingConfig) -> Result<Logger> {
    validate_config(config)?;

    if !config.has_level() {
        warn!("logging level not set, using 'info'");
    }
    let level = config.resolved_level()?;
    let format = config.resolved_format()?;

    let mut builder = LoggerBuilder::new()
        .service(config.service.clone())
        .namespace(config.namespace.clone());

    if !config.disable_stdout {
        builder = builder.sink(ConsoleSink::stdout(level, format, config.color_stdout));
    }

    if config.network_enabled() {
        info!(
            "using logstash at {}, should not be used in production",
            config.logstash_uri
        );
        let sink = NetworkSink::connect(
            level,
            config.resolved_protocol()?,
            config.logstash_uri.trim(),
            Duration::from_millis(config.logstash_timeout_ms),
        )?;
        builder = builder.sink(sink);
    }

    Ok(builder.build())
}
