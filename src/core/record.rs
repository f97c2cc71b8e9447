//! 日志记录定义
//!
//! `Record` 是一次日志调用在分发阶段的完整表示：级别、消息、时间戳以及
//! 已扁平化的上下文字段。静态字段（如 service）不在记录里，由 sink tee
//! 在编码时附加。

use crate::core::fields::FlatFields;
use crate::core::level::Level;
use chrono::{DateTime, SecondsFormat, Utc};

/// 日志记录
#[derive(Debug, Clone)]
pub struct Record {
    /// 记录时间戳
    pub timestamp: DateTime<Utc>,
    /// 日志级别
    pub level: Level,
    /// 日志消息
    pub message: String,
    /// 上下文字段
    pub fields: FlatFields,
}

impl Record {
    /// 以当前时间创建记录
    pub fn new(level: Level, message: String, fields: FlatFields) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message,
            fields,
        }
    }

    /// RFC3339 纳秒精度时间戳，例如 `2024-05-01T10:00:00.123456789Z`
    pub fn rfc3339_timestamp(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    /// 取回字段缓冲区，以便归还到池中
    pub fn into_fields(self) -> FlatFields {
        self.fields
    }
}
