//! 分发层
//!
//! 把 `tracing` 事件转换为记录，附加 logger 的上下文字段后经同一个 tee
//! 广播到所有 sink。
//!
//! ```rust
//! use tee_log::LoggerBuilder;
//! use tracing_subscriber::layer::SubscriberExt;
//!
//! let logger = LoggerBuilder::new().service("demo").build();
//! let subscriber = tracing_subscriber::registry().with(logger.dispatcher_layer());
//! tracing::subscriber::with_default(subscriber, || {
//!     tracing::info!(user = "alice", "login");
//! });
//! ```

use crate::core::emitter::Emitter;
use crate::core::fields::Fields;
use crate::core::level::Level;
use crate::sinks::tee::is_dispatching;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// 事件中承载消息文本的字段名
const MESSAGE_FIELD: &str = "message";
/// 事件来源模块写入的字段名
pub const TARGET_FIELD: &str = "target";

/// 分发层
pub struct DispatcherLayer {
    emitter: Arc<Emitter>,
    fields: Fields,
}

impl DispatcherLayer {
    pub(crate) fn new(emitter: Arc<Emitter>, fields: Fields) -> Self {
        Self { emitter, fields }
    }

    /// 层附加到每条记录上的上下文字段
    pub fn fields(&self) -> &Fields {
        &self.fields
    }
}

impl fmt::Debug for DispatcherLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherLayer")
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// 收集事件字段
#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Fields,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        let fields = std::mem::take(&mut self.fields);
        self.fields = fields.with_field(field.name(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let value_str = format!("{:?}", value);
        if field.name() == MESSAGE_FIELD {
            self.message = value_str;
        } else {
            self.insert(field, Value::String(value_str));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == MESSAGE_FIELD {
            self.message = value.to_string();
        } else {
            self.insert(field, Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::Bool(value));
    }
}

impl<S> Layer<S> for DispatcherLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        // tee 内部报告 sink 失败时产生的事件不再回流到 sink
        if is_dispatching() {
            return;
        }

        let metadata = event.metadata();
        let level = Level::from(*metadata.level());
        if !self.emitter.enabled(level) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        if visitor.message.is_empty() {
            visitor.message = metadata.target().to_string();
        }
        let extra = visitor.fields.with_field(TARGET_FIELD, metadata.target());

        self.emitter
            .broadcast(level, visitor.message, &self.fields.merge(&extra));
    }
}
