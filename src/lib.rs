//! tee_log - 结构化日志门面
//!
//! tee_log 把带有上下文字段的分级日志调用广播到多个独立配置的输出端
//! （控制台、TCP/UDP 日志收集端），每个输出端有自己的编码格式和最低级别。
//!
//! # 快速开始
//!
//! ```rust
//! use tee_log::{fields, new_logger, LoggingConfig};
//!
//! fn main() -> tee_log::Result<()> {
//!     let config = LoggingConfig {
//!         service: "checkout".to_string(),
//!         level: "debug".to_string(),
//!         namespace: "http".to_string(),
//!         ..Default::default()
//!     };
//!     let logger = new_logger(&config)?;
//!
//!     let request = logger.with(fields! { "request_id" => "r-1", "user" => 7 });
//!     request.info("order accepted");
//!     request.namespace("db").warnf(format_args!("slow query: {}ms", 350));
//!     Ok(())
//! }
//! ```
//!
//! # 从环境变量加载
//!
//! ```rust,no_run
//! use tee_log::{new_logger, LoggingConfig};
//!
//! // LOGGER_SERVICE=checkout LOGGER_LEVEL=info LOGGER_LOGSTASH_URI=127.0.0.1:5000
//! let config = LoggingConfig::from_env()?;
//! let logger = new_logger(&config)?;
//! logger.info("started");
//! # Ok::<(), tee_log::TeeLogError>(())
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod error;
pub mod logger;
pub mod sinks;

// 重新导出主要类型
pub use builder::{new_logger, LoggerBuilder, SERVICE_FIELD};
pub use config::{
    load_config_from_file, load_config_from_str, validate_config, LoggingConfig, NetworkProtocol,
    OutputFormat,
};
pub use error::{Result, TeeLogError};
pub use logger::{Logger, NAMESPACE_FIELD, STACKTRACE_FIELD};

// 重新导出核心功能
pub use crate::core::fields::{FlatFields, FlattenPool, Fields, RESERVED_KEYS};
pub use crate::core::layers::DispatcherLayer;
pub use crate::core::level::Level;
pub use crate::core::record::Record;

/// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
