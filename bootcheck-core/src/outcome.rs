//! Per-attempt outcomes and the aggregated failure report

use crate::engine::{EngineError, HostValue};
use crate::error::CompileError;
use bootcheck_config::StageId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Why a (test, stage) attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Compile,
    Load,
    Trap,
    Marshal,
    /// The entry export returned the canonical false value
    ReturnedFalse,
    /// The stage itself could not be built
    StageUnavailable,
}

impl FailureKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Compile => "compile",
            FailureKind::Load => "load",
            FailureKind::Trap => "trap",
            FailureKind::Marshal => "marshal",
            FailureKind::ReturnedFalse => "returned false",
            FailureKind::StageUnavailable => "stage unavailable",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptFailure {
    pub kind: FailureKind,
    pub diagnostic: String,
}

impl AttemptFailure {
    pub fn new(kind: FailureKind, diagnostic: impl Into<String>) -> Self {
        Self {
            kind,
            diagnostic: diagnostic.into(),
        }
    }
}

impl From<CompileError> for AttemptFailure {
    fn from(err: CompileError) -> Self {
        AttemptFailure::new(FailureKind::Compile, err.diagnostic)
    }
}

impl From<EngineError> for AttemptFailure {
    fn from(err: EngineError) -> Self {
        let kind = match &err {
            EngineError::Instantiate(_) => {
                return AttemptFailure::new(FailureKind::Load, err.to_string())
            }
            EngineError::Load(_) => FailureKind::Load,
            EngineError::Trap(_) => FailureKind::Trap,
            EngineError::Marshal(_) => FailureKind::Marshal,
        };
        AttemptFailure::new(kind, err.diagnostic())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExecutionOutcome {
    Passed { value: HostValue },
    Failed(AttemptFailure),
}

impl ExecutionOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, ExecutionOutcome::Passed { .. })
    }

    pub fn failure(&self) -> Option<&AttemptFailure> {
        match self {
            ExecutionOutcome::Failed(failure) => Some(failure),
            ExecutionOutcome::Passed { .. } => None,
        }
    }
}

/// One executed or skipped (test, stage) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptRecord {
    pub test: String,
    pub stage: StageId,
    pub outcome: ExecutionOutcome,
}

impl fmt::Display for AttemptRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            ExecutionOutcome::Passed { .. } => write!(f, "{}: {} succeeded", self.test, self.stage),
            ExecutionOutcome::Failed(failure) => write!(
                f,
                "{}: {} failed ({}): {}",
                self.test, self.stage, failure.kind, failure.diagnostic
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageFailure {
    pub stage: StageId,
    pub kind: FailureKind,
    pub diagnostic: String,
}

/// Failed stages per test; a test absent from the map passed everywhere
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    failures: BTreeMap<String, Vec<StageFailure>>,
}

impl FailureReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one attempt into the report; passing attempts are ignored
    pub fn record(&mut self, attempt: &AttemptRecord) {
        let ExecutionOutcome::Failed(failure) = &attempt.outcome else {
            return;
        };

        let stages = self.failures.entry(attempt.test.clone()).or_default();
        let failure = StageFailure {
            stage: attempt.stage,
            kind: failure.kind,
            diagnostic: failure.diagnostic.clone(),
        };
        let at = stages.partition_point(|existing| existing.stage <= failure.stage);
        stages.insert(at, failure);
    }

    pub fn from_attempts<'a>(attempts: impl IntoIterator<Item = &'a AttemptRecord>) -> Self {
        let mut report = Self::new();
        for attempt in attempts {
            report.record(attempt);
        }
        report
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Failures of one test, ascending by stage
    pub fn failures_for(&self, test: &str) -> Option<&[StageFailure]> {
        self.failures.get(test).map(Vec::as_slice)
    }

    /// Names of the failed stages of one test
    pub fn failed_stages(&self, test: &str) -> Vec<StageId> {
        self.failures_for(test)
            .map(|failures| failures.iter().map(|f| f.stage).collect())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[StageFailure])> {
        self.failures
            .iter()
            .map(|(test, failures)| (test.as_str(), failures.as_slice()))
    }
}
