//! 测试执行器的集成测试：场景 A-C、隔离性与真值约定

mod common;

use bootcheck_config::{HarnessConfig, StageSelection};
use bootcheck_core::output::OutputEntry;
use bootcheck_core::scripted::{ScriptedEngineFactory, ScriptedHost};
use bootcheck_core::{
    discover, new_output_buffer, ExecutionOutcome, FailureKind, StageId, StageManager, TestRunner,
};
use bootcheck_log::Logger;
use bootcheck_vfs::{MemoryFileSystem, VirtualFileSystem};
use common::{Fixture, DRIFTING_COMPILER, STABLE_COMPILER};
use std::collections::BTreeMap;
use std::path::PathBuf;

fn stage0_only() -> StageSelection {
    StageSelection::only(false, &[StageId::Stage0])
}

/// Scenario A
#[test]
fn test_scenario_a_single_stage_success() {
    let observed = Fixture::new(STABLE_COMPILER, &[("add.src", "test return 3")])
        .stages(stage0_only())
        .run();

    assert_eq!(observed.report.attempts.len(), 1);
    assert_eq!(observed.report.attempts[0].to_string(), "add: stage0 succeeded");
    assert!(observed.report.passed());
    assert_eq!(observed.fixpoint.unwrap(), bootcheck_core::FixpointProof::Skipped);
}

/// Scenario B
#[test]
fn test_scenario_b_input_bound_before_entry() {
    let observed = Fixture::new(
        STABLE_COMPILER,
        &[("echo.src", "test expect-input 42\\n"), ("echo.in", "42\n")],
    )
    .stages(stage0_only())
    .run();

    assert!(observed.report.passed(), "{:?}", observed.report.attempts);
}

#[test]
fn test_missing_input_file_is_not_bound() {
    let observed = Fixture::new(STABLE_COMPILER, &[("echo.src", "test expect-input 42\\n")])
        .stages(stage0_only())
        .run();

    let failure = observed.report.attempts[0].outcome.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::ReturnedFalse);
}

/// Scenario C
#[test]
fn test_scenario_c_stage1_build_failure() {
    let observed = Fixture::new(
        "compiler $NEXT\n#fail-under 0",
        &[("add.src", "test return 3"), ("mul.src", "test return 6")],
    )
    .stages(StageSelection::only(false, &[StageId::Stage0, StageId::Stage1]))
    .run();

    for test in ["add", "mul"] {
        assert_eq!(observed.report.report.failed_stages(test), vec![StageId::Stage1]);
        let failures = observed.report.report.failures_for(test).unwrap();
        assert_eq!(failures[0].kind, FailureKind::StageUnavailable);
    }
    let stage0: Vec<_> = observed
        .report
        .attempts
        .iter()
        .filter(|a| a.stage == StageId::Stage0)
        .collect();
    assert_eq!(stage0.len(), 2);
    assert!(stage0.iter().all(|a| a.outcome.is_passed()));

    assert!(!observed.report.passed());
    assert_eq!(observed.report.stage_build_failures.len(), 1);
    assert!(observed.logs.contains("stage1 build failed"));
    assert!(observed
        .entries
        .iter()
        .any(|e| matches!(e, OutputEntry::StageBuildFailed { stage: StageId::Stage1, .. })));
}

#[test]
fn test_test_isolation_under_permutation() {
    let mut config = HarnessConfig::default();
    config.corpus.dir = PathBuf::from("/tests");
    config.stages.stage3 = false;
    let vfs = MemoryFileSystem::with_files([
        ("compiler/compiler.src", DRIFTING_COMPILER),
        ("/tests/a.src", "test return 1"),
        ("/tests/b.src", "test trap boom"),
        ("/tests/c.src", "test expect-input x"),
        ("/tests/c.in", "x"),
        ("/tests/d.src", "test return #f\n#fail-under 1"),
    ]);
    let host = ScriptedHost::new();
    let engines = ScriptedEngineFactory::new();
    let stages = StageManager::new(&config, &vfs, &host, &engines, Logger::noop());
    let tests = discover(&vfs, &config.corpus).unwrap();

    let outcomes = |order: &[usize]| {
        let permuted: Vec<_> = order.iter().map(|&i| tests[i].clone()).collect();
        let report = TestRunner::new(&stages, new_output_buffer(), Logger::noop()).run(&permuted);
        report
            .attempts
            .into_iter()
            .map(|a| ((a.test, a.stage), a.outcome))
            .collect::<BTreeMap<_, ExecutionOutcome>>()
    };

    let forward = outcomes(&[0, 1, 2, 3]);
    assert_eq!(forward.len(), 12);
    assert_eq!(forward, outcomes(&[3, 2, 1, 0]));
    assert_eq!(forward, outcomes(&[2, 0, 3, 1]));
}

#[test]
fn test_failure_isolation() {
    let observed = Fixture::new(
        DRIFTING_COMPILER,
        &[
            ("x.src", "test return 1\n#fail-under 1"),
            ("y.src", "test return 2"),
        ],
    )
    .stages(StageSelection::only(false, &[StageId::Stage0, StageId::Stage1, StageId::Stage2]))
    .run();

    let failures = observed.report.report.failures_for("x").unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].stage, StageId::Stage1);
    assert_eq!(failures[0].kind, FailureKind::Compile);
    assert!(observed.report.report.failures_for("y").is_none());
    assert!(observed.report.stage_build_failures.is_empty());

    let x_stage0 = &observed.report.attempts[0];
    assert_eq!((x_stage0.test.as_str(), x_stage0.stage), ("x", StageId::Stage0));
    assert!(x_stage0.outcome.is_passed());
}

#[test]
fn test_truthiness_convention() {
    let observed = Fixture::new(
        STABLE_COMPILER,
        &[
            ("false.src", "test return #f"),
            ("true.src", "test return #t"),
            ("zero.src", "test return 0"),
            ("empty.src", "test return ()"),
            ("symbol.src", "test return ok"),
        ],
    )
    .stages(stage0_only())
    .run();

    assert_eq!(observed.report.report.len(), 1);
    assert_eq!(observed.report.report.failed_stages("false"), vec![StageId::Stage0]);
    assert_eq!(observed.report.attempts.len(), 5);
}

#[test]
fn test_attempts_streamed_in_order() {
    let observed = Fixture::new(
        STABLE_COMPILER,
        &[("a.src", "test return 1"), ("b.src", "test trap boom")],
    )
    .stages(StageSelection::only(false, &[StageId::Stage0, StageId::Stage1]))
    .run();

    let lines: Vec<String> = observed
        .entries
        .iter()
        .filter_map(|e| match e {
            OutputEntry::Attempt(record) => Some(record.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(
        lines,
        vec![
            "a: stage0 succeeded",
            "a: stage1 succeeded",
            "b: stage0 failed (trap): boom",
            "b: stage1 failed (trap): boom",
        ]
    );
}

#[test]
fn test_engine_unavailable_is_load_failure() {
    let config = HarnessConfig {
        stages: StageSelection::only(true, &[StageId::Stage0]),
        ..HarnessConfig::default()
    };
    let vfs = MemoryFileSystem::with_files([("stage0.mod", STABLE_COMPILER)]);
    vfs.write_file(&config.corpus.dir.join("a.src"), b"test return 1")
        .unwrap();
    let host = ScriptedHost::new();
    let engines = ScriptedEngineFactory::unavailable();
    let stages = StageManager::new(&config, &vfs, &host, &engines, Logger::noop());
    let tests = discover(&vfs, &config.corpus).unwrap();

    let report = TestRunner::new(&stages, new_output_buffer(), Logger::noop()).run(&tests);
    let failure = report.attempts[0].outcome.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::Load);
}
