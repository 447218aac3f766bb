//! Bootcheck Core
//!
//! The staged bootstrap-and-verification harness for a self-hosting compiler:
//!
//! - [`invoker`]: host-toolchain and compiler-module invokers
//! - [`stage`]: lazy, memoized derivation of stage0..stage3
//! - [`fixpoint`]: byte-exact convergence check between two generations
//! - [`corpus`] and [`runner`]: per-test, per-stage execution with failure isolation
//!
//! The compiler and the module engine are external capabilities, consumed
//! through [`CompilerInvoker`] and [`EngineFactory`].

pub mod command;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod fixpoint;
pub mod invoker;
pub mod outcome;
pub mod output;
pub mod process_engine;
pub mod runner;
#[cfg(any(test, feature = "testing"))]
pub mod scripted;
pub mod stage;

pub use command::CommandTemplate;
pub use corpus::{discover, TestCase};
pub use engine::{Engine, EngineError, EngineFactory, HostValue};
pub use error::{CompileError, FixpointMismatch, HarnessError, StageBuildError};
pub use fixpoint::{FixpointProof, FixpointVerifier};
pub use invoker::{CompilerInvoker, HostInvoker, ModuleInvoker, SourceUnit};
pub use outcome::{
    AttemptFailure, AttemptRecord, ExecutionOutcome, FailureKind, FailureReport, StageFailure,
};
pub use output::{new_output_buffer, MemoryOutputBuffer, OutputBuffer, OutputEntry, OutputHandle};
pub use process_engine::{ProcessEngine, ProcessEngineFactory};
pub use runner::{RunReport, TestRunner};
pub use stage::{Provenance, Stage, StageManager};

pub use bootcheck_config::StageId;
