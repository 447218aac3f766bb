//! API 层配置
//!
//! RunConfig 在入口处构造一次，之后以引用传入各组件，没有全局状态

use bootcheck_config::{HarnessConfig, LogLevel};
use bootcheck_log::{FileSink, Level, LogConfig, Logger};
use std::path::Path;
use std::sync::Arc;

/// Execution configuration
#[derive(Clone)]
pub struct RunConfig {
    /// Stage selection, paths and toolchain
    pub harness: HarnessConfig,
    /// Only run tests whose name contains this text
    pub filter: Option<String>,
    /// Logger
    pub logger: Arc<Logger>,
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("harness", &self.harness)
            .field("filter", &self.filter)
            .finish()
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            harness: HarnessConfig::default(),
            filter: None,
            logger: Logger::noop(),
        }
    }
}

impl RunConfig {
    /// 从配置文件内容构造，日志输出到 stderr
    pub fn from_harness(harness: HarnessConfig) -> Self {
        let (logger, _) = LogConfig::new(to_level(harness.log_level))
            .with_stderr()
            .init();
        Self {
            harness,
            filter: None,
            logger,
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_logger(mut self, logger: Arc<Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// 额外把日志追加写入文件
    pub fn with_log_file(self, path: impl AsRef<Path>) -> bootcheck_log::Result<Self> {
        self.logger.add_sink(FileSink::new(path)?);
        Ok(self)
    }
}

/// 配置文件中的日志级别 -> 日志器级别
pub fn to_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Trace => Level::Trace,
        LogLevel::Debug => Level::Debug,
        LogLevel::Info => Level::Info,
        LogLevel::Warn => Level::Warn,
        LogLevel::Error => Level::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_run_config() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.filter, None);
        assert!(cfg.harness.stages.stage3);
        assert_eq!(cfg.logger.level(), Level::Error);
    }

    #[test]
    fn test_from_harness_level() {
        let harness = HarnessConfig {
            log_level: LogLevel::Debug,
            ..HarnessConfig::default()
        };
        let cfg = RunConfig::from_harness(harness).with_filter("echo");
        assert_eq!(cfg.logger.level(), Level::Debug);
        assert_eq!(cfg.filter.as_deref(), Some("echo"));
        assert!(format!("{:?}", cfg).contains("echo"));
    }

    #[test]
    fn test_with_log_file() {
        let path = std::env::temp_dir().join(format!("bootcheck_run_{}.log", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let cfg = RunConfig::default()
            .with_logger(Logger::new(Level::Info))
            .with_log_file(&path)
            .unwrap();
        bootcheck_log::info!(cfg.logger, "building {}", "stage0");

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("building stage0"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_with_log_file_unwritable() {
        let path = std::env::temp_dir()
            .join(format!("bootcheck_missing_{}", std::process::id()))
            .join("nested")
            .join("run.log");
        assert!(RunConfig::default().with_log_file(path).is_err());
    }
}
