//! Sink Tee
//!
//! 将一条记录广播到所有 sink。每个 sink 用自己的阈值决定是否输出，
//! 静态字段（如 service）预先附加到每个 sink 的输出中。
//!
//! 单个 sink 的写入失败只会被计数并通过 `tracing` 报告，不会返回给调用方，
//! 也不会阻止后续 sink 的写入。

use crate::core::record::Record;
use crate::sinks::traits::{LogSink, SinkMetadata};
use serde_json::Value;
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

thread_local! {
    static IN_DISPATCH: Cell<bool> = const { Cell::new(false) };
}

/// 当前线程是否正在 tee 内部分发记录
pub(crate) fn is_dispatching() -> bool {
    IN_DISPATCH.with(|flag| flag.get())
}

/// 在作用域内标记当前线程正在分发，离开作用域时恢复原值
struct DispatchGuard {
    previous: bool,
}

impl DispatchGuard {
    fn enter() -> Self {
        let previous = IN_DISPATCH.with(|flag| flag.replace(true));
        Self { previous }
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        IN_DISPATCH.with(|flag| flag.set(self.previous));
    }
}

/// Sink Tee
#[derive(Debug, Default)]
pub struct SinkTee {
    sinks: Vec<Box<dyn LogSink>>,
    static_fields: Vec<(String, Value)>,
    write_failures: AtomicU64,
}

impl SinkTee {
    /// 创建 tee
    pub fn new(sinks: Vec<Box<dyn LogSink>>, static_fields: Vec<(String, Value)>) -> Self {
        Self {
            sinks,
            static_fields,
            write_failures: AtomicU64::new(0),
        }
    }

    /// 广播一条记录
    ///
    /// 按 sink 列表顺序在调用线程上同步写入。
    pub fn dispatch(&self, record: &Record) {
        if self.sinks.is_empty() {
            return;
        }

        let _guard = DispatchGuard::enter();
        for sink in &self.sinks {
            if !sink.enabled(record.level) {
                continue;
            }
            if let Err(e) = sink.write_record(record, &self.static_fields) {
                self.write_failures.fetch_add(1, Ordering::Relaxed);
                warn!("Sink '{}' failed to write record: {}", sink.name(), e);
            }
        }
    }

    /// 刷新所有 sink，失败同样只计数
    pub fn flush(&self) {
        let _guard = DispatchGuard::enter();
        for sink in &self.sinks {
            if let Err(e) = sink.flush() {
                self.write_failures.fetch_add(1, Ordering::Relaxed);
                warn!("Sink '{}' failed to flush: {}", sink.name(), e);
            }
        }
    }

    /// 被吞掉的写入失败次数
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    pub fn static_fields(&self) -> &[(String, Value)] {
        &self.static_fields
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// 所有 sink 的元数据
    pub fn sink_metadata(&self) -> Vec<SinkMetadata> {
        self.sinks.iter().map(|s| s.metadata()).collect()
    }
}
