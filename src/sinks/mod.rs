//! tee_log Sinks 模块
//!
//! 提供日志输出目标的实现：控制台与网络（TCP/UDP）输出，以及把一条记录
//! 广播到所有 sink 的 [`SinkTee`]。

pub mod console;
pub mod encoder;
pub mod network;
pub mod tee;
pub mod traits;

// 重新导出主要类型
pub use console::ConsoleSink;
pub use encoder::Encoder;
pub use network::NetworkSink;
pub use tee::SinkTee;
pub use traits::{LogSink, SinkError, SinkMetadata, SinkResult};
