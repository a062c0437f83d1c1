//! # Dispatcher
//!
//! 管道控制模块。
//!
//! 负责：
//! - 为每个 generation 启动 producer，失败后整条管道重连
//! - 丢弃已被替代的 generation 发来的消息与错误
//! - 过滤无效读数，将 `state` 读数转发到 sink

pub mod dispatcher;
pub mod error;
pub mod sinks;

pub use contracts::{Reading, ReadingSink};
pub use dispatcher::{ConnectionState, DispatchStats, Dispatcher, DispatcherConfig};
pub use error::DispatcherError;
pub use sinks::{ConsoleSink, GaugeSink, OutputSink};
