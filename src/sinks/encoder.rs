//! 记录编码器
//!
//! 将 [`Record`] 编码为一行输出，支持结构化 JSON 与人类可读两种格式。
//!
//! JSON 键的顺序为 `level`、`@timestamp`、`message`，随后是静态字段，
//! 最后是上下文字段。先写入的键优先：与静态字段同名的上下文字段会被丢弃，
//! 输出中不会出现重复键。

use crate::config::OutputFormat;
use crate::core::level::Level;
use crate::core::record::Record;
use crate::sinks::traits::{SinkError, SinkResult};
use colored::Colorize;
use serde_json::{Map, Value};

pub const LEVEL_KEY: &str = "level";
pub const TIMESTAMP_KEY: &str = "@timestamp";
pub const MESSAGE_KEY: &str = "message";

/// 记录编码器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoder {
    /// 每行一个 JSON 对象
    Json,
    /// `时间戳\t级别\t消息\t{字段}`
    Pretty { colored: bool },
}

impl Encoder {
    /// 根据输出格式创建编码器
    pub fn from_format(format: OutputFormat, colored: bool) -> Self {
        match format {
            OutputFormat::Json => Encoder::Json,
            OutputFormat::Pretty => Encoder::Pretty { colored },
        }
    }

    /// 编码一条记录，结果以换行结尾
    ///
    /// `static_groups` 按顺序合并，前面的组优先。
    pub fn encode(&self, record: &Record, static_groups: &[&[(String, Value)]]) -> SinkResult<String> {
        match self {
            Encoder::Json => encode_json(record, static_groups),
            Encoder::Pretty { colored } => encode_pretty(record, static_groups, *colored),
        }
    }
}

/// 合并静态字段与上下文字段，已存在的键不会被覆盖
fn collect_fields(
    map: &mut Map<String, Value>,
    record: &Record,
    static_groups: &[&[(String, Value)]],
) {
    for group in static_groups {
        for (k, v) in group.iter() {
            if !map.contains_key(k) {
                map.insert(k.clone(), v.clone());
            }
        }
    }
    for (k, v) in &record.fields {
        if !map.contains_key(k) {
            map.insert(k.clone(), v.clone());
        }
    }
}

fn encode_json(record: &Record, static_groups: &[&[(String, Value)]]) -> SinkResult<String> {
    let mut map = Map::new();
    map.insert(LEVEL_KEY.to_string(), Value::from(record.level.as_str()));
    map.insert(TIMESTAMP_KEY.to_string(), Value::from(record.rfc3339_timestamp()));
    map.insert(MESSAGE_KEY.to_string(), Value::from(record.message.as_str()));
    collect_fields(&mut map, record, static_groups);

    let mut line = serde_json::to_string(&map).map_err(|e| SinkError::Serialization(e.to_string()))?;
    line.push('\n');
    Ok(line)
}

fn encode_pretty(
    record: &Record,
    static_groups: &[&[(String, Value)]],
    colored: bool,
) -> SinkResult<String> {
    let mut map = Map::new();
    collect_fields(&mut map, record, static_groups);

    let mut line = format!(
        "{}\t{}\t{}",
        record.rfc3339_timestamp(),
        format_level(record.level, colored),
        record.message
    );

    if !map.is_empty() {
        let fields = serde_json::to_string(&map).map_err(|e| SinkError::Serialization(e.to_string()))?;
        line.push('\t');
        line.push_str(&fields);
    }

    line.push('\n');
    Ok(line)
}

/// Formats the log level with optional coloring
fn format_level(level: Level, colored: bool) -> String {
    let name = level.as_upper_str();
    if !colored {
        return name.to_string();
    }
    match level {
        Level::Debug => name.cyan().to_string(),
        Level::Info => name.green().to_string(),
        Level::Warn => name.yellow().to_string(),
        Level::Error => name.red().to_string(),
        Level::Fatal | Level::Panic => name.red().bold().to_string(),
    }
}
