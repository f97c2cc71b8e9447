//! 基础发射器
//!
//! 持有 [`SinkTee`] 与扁平化缓冲池，被同一条派生链上的所有 logger 通过
//! `Arc` 共享。发射器本身在构造后不再改变，可被多个线程同时调用。

use crate::core::fields::{FlattenPool, Fields};
use crate::core::level::Level;
use crate::core::record::Record;
use crate::sinks::tee::SinkTee;

/// 基础发射器
#[derive(Debug)]
pub struct Emitter {
    tee: SinkTee,
    pool: FlattenPool,
    /// 所有 sink 阈值中的最小值；没有 sink 时为 `None`
    min_threshold: Option<Level>,
}

impl Emitter {
    pub fn new(tee: SinkTee) -> Self {
        Self::with_pool(tee, FlattenPool::default())
    }

    /// 使用指定的缓冲池创建发射器
    pub fn with_pool(tee: SinkTee, pool: FlattenPool) -> Self {
        let min_threshold = tee.sink_metadata().iter().map(|m| m.threshold).min();
        Self {
            tee,
            pool,
            min_threshold,
        }
    }

    /// 是否至少有一个 sink 会输出该级别
    pub fn enabled(&self, level: Level) -> bool {
        self.min_threshold.is_some_and(|min| level >= min)
    }

    /// 广播一条记录，不触发退出或 panic
    ///
    /// 扁平化缓冲区在 tee 消费完记录后立即归还缓冲池。
    pub fn broadcast(&self, level: Level, message: String, fields: &Fields) {
        if !self.enabled(level) {
            return;
        }

        let record = Record::new(level, message, fields.flatten(&self.pool));
        self.tee.dispatch(&record);
        self.pool.release(record.into_fields());
    }

    /// 广播一条记录，并执行该级别在边界上的副作用
    ///
    /// `Fatal` 在输出后以状态码 1 退出进程；`Panic` 在输出后以消息 panic。
    pub fn emit(&self, level: Level, message: String, fields: &Fields) {
        match level {
            Level::Fatal => self.fatal(message, fields),
            Level::Panic => self.panic(message, fields),
            _ => self.broadcast(level, message, fields),
        }
    }

    pub fn fatal(&self, message: String, fields: &Fields) -> ! {
        self.broadcast(Level::Fatal, message, fields);
        self.tee.flush();
        std::process::exit(1)
    }

    pub fn panic(&self, message: String, fields: &Fields) -> ! {
        self.broadcast(Level::Panic, message.clone(), fields);
        panic!("{}", message)
    }

    pub fn flush(&self) {
        self.tee.flush();
    }

    pub fn tee(&self) -> &SinkTee {
        &self.tee
    }

    pub fn pool(&self) -> &FlattenPool {
        &self.pool
    }
}
