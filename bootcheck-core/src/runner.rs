//! Per-test, per-stage execution
//!
//! Every (test, stage) attempt gets its own engine. Whatever goes wrong inside
//! an attempt is folded into that attempt's outcome; nothing escapes to abort
//! other stages or other tests.

use crate::corpus::TestCase;
use crate::engine::{Engine, EngineFactory, HostValue};
use crate::invoker::{CompilerInvoker, ModuleInvoker};
use crate::outcome::{
    AttemptFailure, AttemptRecord, ExecutionOutcome, FailureKind, FailureReport, StageFailure,
};
use crate::output::{OutputEntry, OutputHandle};
use crate::stage::StageManager;
use bootcheck_config::StageId;
use bootcheck_log::{debug, info, warn, Logger};
use serde::Serialize;
use std::sync::Arc;

/// Everything the runner observed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// In execution order
    pub attempts: Vec<AttemptRecord>,
    pub report: FailureReport,
    /// One entry per tested stage that could not be built
    pub stage_build_failures: Vec<StageFailure>,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.report.is_empty() && self.stage_build_failures.is_empty()
    }
}

pub struct TestRunner<'s, 'a, F> {
    stages: &'s StageManager<'a, F>,
    output: OutputHandle,
    logger: Arc<Logger>,
}

impl<'s, 'a, F: EngineFactory> TestRunner<'s, 'a, F> {
    pub fn new(stages: &'s StageManager<'a, F>, output: OutputHandle, logger: Arc<Logger>) -> Self {
        Self {
            stages,
            output,
            logger,
        }
    }

    /// Run every test against every enabled stage in {0, 1, 2}, test-major
    pub fn run(&self, tests: &[TestCase]) -> RunReport {
        let _span = self.logger.enter_span("run_tests");
        let tested = self.stages.config().stages.tested_stages();
        info!(
            self.logger,
            "running {} tests against {} stages",
            tests.len(),
            tested.len()
        );

        let mut report = RunReport::default();
        let invokers: Vec<(StageId, Result<ModuleInvoker<'a, F>, String>)> = tested
            .iter()
            .map(|&stage| {
                let invoker = self.stages.invoker(stage).map_err(|e| {
                    let diagnostic = e.to_string();
                    self.output.push(OutputEntry::StageBuildFailed {
                        stage,
                        diagnostic: diagnostic.clone(),
                    });
                    report.stage_build_failures.push(StageFailure {
                        stage,
                        kind: FailureKind::StageUnavailable,
                        diagnostic: diagnostic.clone(),
                    });
                    diagnostic
                });
                (stage, invoker)
            })
            .collect();

        for test in tests {
            for (stage, invoker) in &invokers {
                let outcome = match invoker {
                    Ok(invoker) => self.attempt(test, invoker),
                    Err(diagnostic) => ExecutionOutcome::Failed(AttemptFailure::new(
                        FailureKind::StageUnavailable,
                        diagnostic.clone(),
                    )),
                };

                let record = AttemptRecord {
                    test: test.name.clone(),
                    stage: *stage,
                    outcome,
                };
                match &record.outcome {
                    ExecutionOutcome::Passed { .. } => debug!(self.logger, "{}", record),
                    ExecutionOutcome::Failed(_) => warn!(self.logger, "{}", record),
                }

                report.report.record(&record);
                self.output.push(OutputEntry::Attempt(record.clone()));
                report.attempts.push(record);
            }
        }

        info!(
            self.logger,
            "{} attempts, {} failing tests",
            report.attempts.len(),
            report.report.len()
        );
        report
    }

    fn attempt(&self, test: &TestCase, invoker: &ModuleInvoker<'a, F>) -> ExecutionOutcome {
        match self.execute(test, invoker) {
            Ok(value) if value.is_truthy() => ExecutionOutcome::Passed { value },
            Ok(_) => ExecutionOutcome::Failed(AttemptFailure::new(
                FailureKind::ReturnedFalse,
                format!(
                    "{} returned {}",
                    self.stages.config().toolchain.entry_export,
                    self.stages.config().toolchain.false_literal
                ),
            )),
            Err(failure) => ExecutionOutcome::Failed(failure),
        }
    }

    fn execute(
        &self,
        test: &TestCase,
        invoker: &ModuleInvoker<'a, F>,
    ) -> Result<HostValue, AttemptFailure> {
        let mut engine = self.stages.engines().instantiate()?;
        if let Some(input) = &test.input {
            engine.bind_input(input);
        }

        let module = invoker.compile(&test.source)?;
        engine.load_module(&module)?;
        let value = engine.invoke(&self.stages.config().toolchain.entry_export)?;
        Ok(engine.marshal(value)?)
    }
}
