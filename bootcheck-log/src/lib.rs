//! bootcheck-log - 结构化日志系统
//!
//! 为 bootstrap 验证工具设计的日志系统，特点：
//! - **显式传递**：无全局 logger，`Arc<Logger>` 随配置一起传入各组件
//! - **惰性格式化**：级别未启用时不格式化消息
//! - **可回放**：环形缓冲区保留最后 N 条日志，测试中用来断言诊断信息
//!
//! # 快速开始
//!
//! ```
//! use bootcheck_log::{LogConfig, Level, info};
//!
//! let (logger, ring) = LogConfig::new(Level::Info).with_ring_buffer(100).init();
//! info!(logger, "building {}", "stage0");
//! assert_eq!(ring.unwrap().len(), 1);
//! ```

mod config;
mod logger;
mod macros;
mod record;
mod ring_buffer;
mod span;

pub use config::{LogConfig, OutputConfig};
pub use logger::{FileSink, LogSink, Logger, SpanGuard, StderrSink};
pub use record::{Level, Record};
pub use ring_buffer::{LogRingBuffer, RingBufferStats};
pub use span::{Span, SpanId};

// 宏通过 #[macro_export] 自动导出到 crate 根：
// trace!, debug!, info!, warn!, error!, log!

/// 日志结果类型
pub type Result<T> = std::result::Result<T, Error>;

/// 日志系统错误类型
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 无法打开日志文件
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
