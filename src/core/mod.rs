//! tee_log 核心模块
//!
//! 本模块包含字段上下文、级别、记录、基础发射器以及 tracing 层。

pub mod emitter;
pub mod fields;
pub mod layers;
pub mod level;
pub mod record;

// 重新导出核心类型
pub use emitter::Emitter;
pub use fields::{FlatFields, FlattenPool, Fields};
pub use layers::DispatcherLayer;
pub use level::Level;
pub use record::Record;
