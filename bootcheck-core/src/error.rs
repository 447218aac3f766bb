//! Error types for the harness
//!
//! Attempt-level failures (compile, load, trap, marshal) are converted into
//! recorded outcomes by the runner and never leave it. Only [`HarnessError`]
//! crosses the crate boundary.

use bootcheck_config::StageId;
use bootcheck_vfs::VfsError;
use std::path::PathBuf;
use thiserror::Error;

/// The host toolchain or an in-module compiler rejected a source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{diagnostic}")]
pub struct CompileError {
    pub diagnostic: String,
}

impl CompileError {
    pub fn new(diagnostic: impl Into<String>) -> Self {
        Self {
            diagnostic: diagnostic.into(),
        }
    }
}

/// A stage could not be constructed.
///
/// Memoized by the stage manager, so it is `Clone`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageBuildError {
    #[error("cannot load snapshot '{}': {reason}", .path.display())]
    Snapshot { path: PathBuf, reason: String },

    #[error("{stage}: cannot read compiler source '{}': {reason}", .path.display())]
    Source {
        stage: StageId,
        path: PathBuf,
        reason: String,
    },

    #[error("{stage} build failed: {source}")]
    Compile {
        stage: StageId,
        #[source]
        source: CompileError,
    },

    /// A lower stage failed; `cause` is always that root failure
    #[error("{stage} unavailable because {cause}")]
    Dependency {
        stage: StageId,
        cause: Box<StageBuildError>,
    },
}

impl StageBuildError {
    /// The stage this error was reported for
    pub fn stage(&self) -> StageId {
        match self {
            StageBuildError::Snapshot { .. } => StageId::Stage0,
            StageBuildError::Source { stage, .. }
            | StageBuildError::Compile { stage, .. }
            | StageBuildError::Dependency { stage, .. } => *stage,
        }
    }

    /// The stage whose own construction failed
    pub fn root_stage(&self) -> StageId {
        match self {
            StageBuildError::Dependency { cause, .. } => cause.root_stage(),
            other => other.stage(),
        }
    }

    /// Wrap as the failure of a higher stage that needed this one
    pub fn blocking(self, stage: StageId) -> Self {
        let cause = match self {
            StageBuildError::Dependency { cause, .. } => cause,
            root => Box::new(root),
        };
        StageBuildError::Dependency { stage, cause }
    }
}

/// Two consecutive generations differ byte-for-byte
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "fixpoint mismatch: {stage} ({stage_len} bytes) and {next} ({next_len} bytes) first differ at byte {first_difference}"
)]
pub struct FixpointMismatch {
    pub stage: StageId,
    pub next: StageId,
    pub stage_len: usize,
    pub next_len: usize,
    /// First differing offset; the shorter length when one is a prefix of the other
    pub first_difference: usize,
}

impl FixpointMismatch {
    /// `None` when the two artifacts are identical
    pub fn compare(stage: StageId, next: StageId, current: &[u8], again: &[u8]) -> Option<Self> {
        if current == again {
            return None;
        }

        let first_difference = current
            .iter()
            .zip(again)
            .position(|(a, b)| a != b)
            .unwrap_or_else(|| current.len().min(again.len()));

        Some(Self {
            stage,
            next,
            stage_len: current.len(),
            next_len: again.len(),
            first_difference,
        })
    }
}

/// Fatal errors: they abort the run
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error(transparent)]
    StageBuild(#[from] StageBuildError),

    #[error(transparent)]
    Fixpoint(#[from] FixpointMismatch),

    #[error("cannot read test corpus '{}': {source}", .path.display())]
    Corpus {
        path: PathBuf,
        #[source]
        source: VfsError,
    },

    #[error("configuration error: {0}")]
    Config(String),
}
