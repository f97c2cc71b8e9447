//! tee_log 处理层模块
//!
//! 与 `tracing` 生态对接的层实现。

pub mod dispatcher;

pub use dispatcher::DispatcherLayer;
