//! Bootcheck API - Run orchestration layer
//!
//! Provides the unified run interface:
//! - Run flow orchestration (discover, test every stage, check the fixpoint)
//! - Configuration abstraction (RunConfig)
//! - Structured error reports (ErrorReport)
//!
//! [`run`] wires the native file system, the host toolchain and the
//! process-backed engine. [`run_with`] takes every collaborator explicitly.

use bootcheck_core::{
    discover, CommandTemplate, CompileError, CompilerInvoker, EngineFactory, FixpointVerifier,
    HostInvoker, ProcessEngineFactory, SourceUnit, StageManager, TestRunner,
};
use bootcheck_log::{info, warn};
use bootcheck_vfs::{NativeFileSystem, VirtualFileSystem};
use serde::Serialize;
use std::sync::Arc;

// Re-export config
pub mod config;
pub use config::RunConfig;

// Re-export error types
pub mod error;
pub use error::{to_report, ErrorReport, HarnessError};

// Re-export core types
pub use bootcheck_config;
pub use bootcheck_config::{HarnessConfig, LogLevel, StageId, StageSelection};
pub use bootcheck_core::{
    new_output_buffer, AttemptFailure, AttemptRecord, ExecutionOutcome, FailureKind,
    FailureReport, FixpointProof, OutputBuffer, OutputEntry, OutputHandle, StageFailure,
};

/// The external collaborators of a run
pub struct Environment<'a, F> {
    pub vfs: &'a dyn VirtualFileSystem,
    pub host: &'a dyn CompilerInvoker,
    pub engines: &'a F,
    /// Receives report entries as the run progresses
    pub output: OutputHandle,
}

/// Outcome of a run that was not aborted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub attempts: Vec<AttemptRecord>,
    pub report: FailureReport,
    pub stage_build_failures: Vec<StageFailure>,
    pub fixpoint: FixpointProof,
}

impl RunSummary {
    /// No failing test and no unbuildable stage
    pub fn passed(&self) -> bool {
        self.report.is_empty() && self.stage_build_failures.is_empty()
    }
}

/// Execute with explicit collaborators
///
/// Tests run first; the fixpoint check runs afterwards and reuses every
/// stage already built. Attempts are pushed to `env.output` as they finish,
/// so they are reported even when the fixpoint check aborts the run.
pub fn run_with<F: EngineFactory>(
    config: &RunConfig,
    env: &Environment<'_, F>,
) -> Result<RunSummary, HarnessError> {
    let harness = &config.harness;
    let logger = &config.logger;
    info!(logger, "Starting run");

    let mut tests = discover(env.vfs, &harness.corpus)?;
    if let Some(filter) = &config.filter {
        tests.retain(|test| test.name.contains(filter.as_str()));
        info!(logger, "filter '{}' selected {} tests", filter, tests.len());
    }
    if tests.is_empty() {
        warn!(logger, "no tests in {}", harness.corpus.dir.display());
    }
    env.output.push(OutputEntry::Info(format!(
        "{} tests against {}",
        tests.len(),
        harness
            .stages
            .tested_stages()
            .iter()
            .map(|stage| stage.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    )));

    let stages = StageManager::new(harness, env.vfs, env.host, env.engines, Arc::clone(logger));
    let run = TestRunner::new(&stages, Arc::clone(&env.output), Arc::clone(logger)).run(&tests);

    let fixpoint = FixpointVerifier::new(&stages, &harness.stages, Arc::clone(logger)).verify()?;
    env.output.push(OutputEntry::Fixpoint(fixpoint.clone()));

    info!(logger, "Run completed");
    Ok(RunSummary {
        attempts: run.attempts,
        report: run.report,
        stage_build_failures: run.stage_build_failures,
        fixpoint,
    })
}

/// Execute against the real toolchain
pub fn run(config: &RunConfig, output: OutputHandle) -> Result<RunSummary, HarnessError> {
    let harness = &config.harness;
    let toolchain = &harness.toolchain;

    let runner = CommandTemplate::parse(&toolchain.runner)
        .ok_or_else(|| HarnessError::Config("toolchain.runner is empty".to_string()))?;
    let host: Box<dyn CompilerInvoker> = match CommandTemplate::parse(&toolchain.host) {
        Some(command) => Box::new(HostInvoker::new(
            command,
            &harness.paths.scratch_artifact,
            Arc::clone(&config.logger),
        )),
        None if harness.stages.use_snapshot => Box::new(NoHost),
        None => return Err(HarnessError::Config("toolchain.host is empty".to_string())),
    };

    let engines = ProcessEngineFactory::new(
        runner,
        &harness.paths.work_dir,
        Arc::clone(&config.logger),
    )
    .with_literals(&toolchain.false_literal, &toolchain.true_literal);
    let vfs = NativeFileSystem::new();

    run_with(
        config,
        &Environment {
            vfs: &vfs,
            host: host.as_ref(),
            engines: &engines,
            output,
        },
    )
}

/// Stands in for an unconfigured host toolchain in snapshot mode
struct NoHost;

impl CompilerInvoker for NoHost {
    fn compile(&self, unit: &SourceUnit) -> Result<Vec<u8>, CompileError> {
        Err(CompileError::new(format!(
            "no host toolchain configured to compile {}",
            unit.name
        )))
    }
}
