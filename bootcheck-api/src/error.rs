//! API 错误类型
//!
//! 致命错误统一为 HarnessError，并提供结构化错误报告。

use bootcheck_config::StageId;
use bootcheck_vfs::VfsError;
use serde::Serialize;

pub use bootcheck_core::{FixpointMismatch, HarnessError, StageBuildError};

/// 结构化错误报告
///
/// 上层应用（CLI、CI 工具）可以根据自己的需求格式化或序列化。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    /// 错误阶段: stage_build, fixpoint, corpus, config
    pub phase: &'static str,
    /// 错误类型（可用于程序化处理）
    pub error_kind: String,
    /// 人类可读的错误消息
    pub message: String,
    /// 出错的阶段（如果有）
    pub stage: Option<StageId>,
}

impl std::fmt::Display for ErrorReport {
    /// 默认的 CLI 友好格式
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.stage {
            Some(stage) => write!(f, "[{}] {} error: {}", stage, self.phase, self.message),
            None => write!(f, "[{}] error: {}", self.phase, self.message),
        }
    }
}

/// 转换为结构化错误报告
pub fn to_report(err: &HarnessError) -> ErrorReport {
    match err {
        HarnessError::StageBuild(e) => ErrorReport {
            phase: "stage_build",
            error_kind: stage_error_kind(e).to_string(),
            message: e.to_string(),
            stage: Some(e.root_stage()),
        },
        HarnessError::Fixpoint(m) => ErrorReport {
            phase: "fixpoint",
            error_kind: "FixpointMismatch".to_string(),
            message: m.to_string(),
            stage: Some(m.next),
        },
        HarnessError::Corpus { source, .. } => ErrorReport {
            phase: "corpus",
            error_kind: match source {
                VfsError::NotFound { .. } => "NotFound",
                VfsError::NotADirectory { .. } => "NotADirectory",
                VfsError::Io { .. } => "Io",
                VfsError::Custom { .. } => "Custom",
            }
            .to_string(),
            message: err.to_string(),
            stage: None,
        },
        HarnessError::Config(msg) => ErrorReport {
            phase: "config",
            error_kind: "ConfigError".to_string(),
            message: msg.clone(),
            stage: None,
        },
    }
}

fn stage_error_kind(err: &StageBuildError) -> &'static str {
    match err {
        StageBuildError::Snapshot { .. } => "SnapshotError",
        StageBuildError::Source { .. } => "SourceError",
        StageBuildError::Compile { .. } => "CompileError",
        StageBuildError::Dependency { cause, .. } => stage_error_kind(cause),
    }
}
