//! Logger 门面
//!
//! `Logger` 是一个值：持有共享的 [`Emitter`] 引用和一份自己的字段上下文快照。
//! `with`/`namespace` 返回新的 `Logger`，原值及其上下文保持不变，因此同一个
//! logger 可以不加同步地交给多个线程，各自派生出请求级别的 logger。
//!
//! ```rust
//! use tee_log::{fields, LoggerBuilder};
//!
//! let logger = LoggerBuilder::new().service("billing").build();
//! let request = logger.with(fields! { "request_id" => "r-42" });
//!
//! request.info("charging card");
//! request.infof(format_args!("charged {} cents", 1250));
//! assert!(logger.get_field("request_id").is_none());
//! ```

use crate::core::emitter::Emitter;
use crate::core::fields::Fields;
use crate::core::layers::DispatcherLayer;
use crate::core::level::Level;
use serde_json::Value;
use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// `namespace` 上下文字段名
pub const NAMESPACE_FIELD: &str = "namespace";
/// `trace` 附加的调用栈字段名
pub const STACKTRACE_FIELD: &str = "stacktrace";
/// 无法描述的 panic 负载的占位文本
pub const OPAQUE_PAYLOAD: &str = "<non-string panic payload>";

/// Logger 门面
#[derive(Debug, Clone)]
pub struct Logger {
    emitter: Arc<Emitter>,
    fields: Fields,
}

impl Logger {
    pub(crate) fn from_parts(emitter: Arc<Emitter>, fields: Fields) -> Self {
        Self { emitter, fields }
    }

    fn log(&self, level: Level, message: String) {
        self.emitter.emit(level, message, &self.fields);
    }

    pub fn debug(&self, message: impl fmt::Display) {
        self.log(Level::Debug, message.to_string());
    }

    pub fn debugf(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, fmt::format(args));
    }

    pub fn info(&self, message: impl fmt::Display) {
        self.log(Level::Info, message.to_string());
    }

    pub fn infof(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, fmt::format(args));
    }

    pub fn warn(&self, message: impl fmt::Display) {
        self.log(Level::Warn, message.to_string());
    }

    pub fn warnf(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, fmt::format(args));
    }

    pub fn error(&self, message: impl fmt::Display) {
        self.log(Level::Error, message.to_string());
    }

    pub fn errorf(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, fmt::format(args));
    }

    /// 输出后以状态码 1 退出进程
    pub fn fatal(&self, message: impl fmt::Display) -> ! {
        self.emitter.fatal(message.to_string(), &self.fields)
    }

    pub fn fatalf(&self, args: fmt::Arguments<'_>) -> ! {
        self.emitter.fatal(fmt::format(args), &self.fields)
    }

    /// 输出后以同一消息 panic
    pub fn panic(&self, message: impl fmt::Display) -> ! {
        self.emitter.panic(message.to_string(), &self.fields)
    }

    pub fn panicf(&self, args: fmt::Arguments<'_>) -> ! {
        self.emitter.panic(fmt::format(args), &self.fields)
    }

    /// 返回上下文为 `self.fields ∪ extra` 的新 logger，冲突时 `extra` 优先
    pub fn with(&self, extra: Fields) -> Logger {
        Logger {
            emitter: Arc::clone(&self.emitter),
            fields: self.fields.merge(&extra),
        }
    }

    /// 覆盖 `namespace` 字段
    pub fn namespace(&self, name: impl Into<String>) -> Logger {
        self.with(Fields::new().with_field(NAMESPACE_FIELD, name.into()))
    }

    /// 以 Error 级别记录错误链和调用栈；`None` 时不做任何事
    pub fn trace<E>(&self, err: Option<E>)
    where
        E: Into<anyhow::Error>,
    {
        if let Some(err) = err {
            self.trace_error(&err.into());
        }
    }

    fn trace_error(&self, err: &anyhow::Error) {
        let stacktrace = match err.backtrace().status() {
            BacktraceStatus::Captured => err.backtrace().to_string(),
            _ => Backtrace::force_capture().to_string(),
        };
        let fields = self
            .fields
            .merge(&Fields::new().with_field(STACKTRACE_FIELD, stacktrace));
        self.emitter.broadcast(Level::Error, format!("{:#}", err), &fields);
    }

    /// 在 panic 边界内执行 `f`
    ///
    /// `f` 正常返回时原样返回其结果。`f` panic 时先记录负载（字符串负载先
    /// 包装为错误再 trace），再输出一条 Panic 级别记录
    /// `recovered <msg> from <payload>`，最后以原负载继续展开。
    pub fn recover<F, R>(&self, msg: impl fmt::Display, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => value,
            Err(payload) => {
                let described = describe_payload(payload.as_ref());
                if let Some(text) = &described {
                    self.trace_error(&anyhow::anyhow!(text.clone()));
                }
                self.emitter.broadcast(
                    Level::Panic,
                    format!(
                        "recovered {} from {}",
                        msg,
                        described.as_deref().unwrap_or(OPAQUE_PAYLOAD)
                    ),
                    &self.fields,
                );
                panic::resume_unwind(payload)
            }
        }
    }

    /// 读取上下文字段，不影响输出
    pub fn get_field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// 当前上下文
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// 把 `tracing` 事件接入同一组 sink 的层，附带当前上下文
    pub fn dispatcher_layer(&self) -> DispatcherLayer {
        DispatcherLayer::new(Arc::clone(&self.emitter), self.fields.copy())
    }

    /// 是否至少有一个 sink 会输出该级别
    pub fn enabled(&self, level: Level) -> bool {
        self.emitter.enabled(level)
    }

    pub fn flush(&self) {
        self.emitter.flush();
    }

    /// 被 sink tee 吞掉的写入失败次数
    pub fn write_failures(&self) -> u64 {
        self.emitter.tee().write_failures()
    }
}

/// 把 panic 负载转换为文本；不认识的类型返回 `None`
fn describe_payload(payload: &(dyn Any + Send)) -> Option<String> {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        return Some((*s).to_string());
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return Some(s.clone());
    }
    if let Some(err) = payload.downcast_ref::<anyhow::Error>() {
        return Some(format!("{:#}", err));
    }
    if let Some(err) = payload.downcast_ref::<Box<dyn std::error::Error + Send + Sync>>() {
        return Some(err.to_string());
    }
    None
}
