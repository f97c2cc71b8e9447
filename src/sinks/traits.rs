//! tee_log Sink Traits
//!
//! 定义了统一的 sink 接口。sink 是 (阈值, 编码器, 写入器) 三元组：
//! 每条记录由 sink 自己决定是否输出，输出时完成编码并写入目标。
//!
//! # 使用示例
//!
//! ```rust
//! use tee_log::sinks::traits::{LogSink, SinkMetadata, SinkResult};
//! use tee_log::{Level, Record};
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! #[derive(Debug, Default)]
//! struct CountingSink {
//!     seen: AtomicU64,
//! }
//!
//! impl LogSink for CountingSink {
//!     fn threshold(&self) -> Level {
//!         Level::Warn
//!     }
//!
//!     fn write_record(
//!         &self,
//!         _record: &Record,
//!         _static_fields: &[(String, serde_json::Value)],
//!     ) -> SinkResult<()> {
//!         self.seen.fetch_add(1, Ordering::Relaxed);
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "counting"
//!     }
//! }
//!
//! let sink = CountingSink::default();
//! assert!(sink.enabled(Level::Error));
//! assert!(!sink.enabled(Level::Info));
//! ```

use crate::core::level::Level;
use crate::core::record::Record;
use serde_json::Value;
use std::fmt::Debug;

/// 基础 Sink trait
///
/// 实现必须能被多个线程同时调用；对同一目标的写入需要在 sink 内部串行化。
pub trait LogSink: Send + Sync + Debug {
    /// 最低输出级别
    fn threshold(&self) -> Level;

    /// 记录是否应由此 sink 输出
    fn enabled(&self, level: Level) -> bool {
        level >= self.threshold()
    }

    /// 编码并写入一条记录
    ///
    /// `static_fields` 是 tee 附加到所有 sink 的静态字段（如 service）。
    fn write_record(&self, record: &Record, static_fields: &[(String, Value)]) -> SinkResult<()>;

    /// 刷新底层写入器
    fn flush(&self) -> SinkResult<()> {
        Ok(())
    }

    /// sink 名称，用于日志和调试
    fn name(&self) -> &'static str;

    /// 获取 sink 的元数据
    fn metadata(&self) -> SinkMetadata {
        SinkMetadata::new(self.name().to_string(), self.threshold())
    }
}

/// Sink 元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkMetadata {
    /// Sink 名称
    pub name: String,
    /// 最低输出级别
    pub threshold: Level,
    /// 描述信息
    pub description: Option<String>,
}

impl SinkMetadata {
    /// 创建新的 sink 元数据
    pub fn new(name: String, threshold: Level) -> Self {
        Self {
            name,
            threshold,
            description: None,
        }
    }

    /// 设置描述信息
    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }
}

/// 通用 Sink 错误类型
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// I/O 错误
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// 网络错误
    #[error("Network error: {0}")]
    Network(String),

    /// 写入器锁已中毒
    #[error("Writer lock poisoned: {0}")]
    Poisoned(&'static str),
}

/// Sink 结果类型
pub type SinkResult<T> = Result<T, SinkError>;
