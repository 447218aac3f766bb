//! An in-memory engine and host toolchain driven by plain-text modules.
//!
//! Used by the test suites of this workspace and built only for tests or with
//! the `testing` feature. Modules are UTF-8 text whose first line selects the
//! behavior:
//!
//! - `compiler <tag>`: the compile export copies its input to its output,
//!   replacing `$NEXT` with `tag + 1` when the tag is a number. It traps when
//!   the input contains `#error` or `#fail-under <tag>`.
//! - `test return <literal>`: the export returns `<literal>`
//! - `test expect-input <escaped>`: copies the bound input to the output and
//!   returns `#t` when it equals the unescaped text, `#f` otherwise
//! - `test trap <message>`: the export traps
//! - `test unmarshalable`: the export returns a value that cannot be marshalled
//!
//! Anything else fails to load. The scripted host replaces `$NEXT` with `0`.

use crate::engine::{Engine, EngineError, EngineFactory, HostValue};
use crate::error::CompileError;
use crate::invoker::{CompilerInvoker, SourceUnit};
use std::sync::atomic::{AtomicUsize, Ordering};

const COMPILE_EXPORT: &str = "compile_stdin_to_stdout";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Module {
    Compiler { tag: String },
    Return(String),
    ExpectInput(Vec<u8>),
    Trap(String),
    Unmarshalable,
}

impl Module {
    fn parse(bytes: &[u8]) -> Result<Self, EngineError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| EngineError::Load(format!("not a module: {}", e)))?;
        let header = text.lines().next().unwrap_or("").trim();

        if let Some(tag) = header.strip_prefix("compiler ") {
            return Ok(Module::Compiler {
                tag: tag.trim().to_string(),
            });
        }

        let directive = header
            .strip_prefix("test")
            .map(str::trim)
            .ok_or_else(|| EngineError::Load(format!("not a module: '{}'", header)))?;
        let (op, arg) = directive.split_once(' ').unwrap_or((directive, ""));
        match op {
            "return" => Ok(Module::Return(arg.to_string())),
            "expect-input" => Ok(Module::ExpectInput(unescape(arg))),
            "trap" => Ok(Module::Trap(arg.to_string())),
            "unmarshalable" => Ok(Module::Unmarshalable),
            other => Err(EngineError::Load(format!("unknown directive '{}'", other))),
        }
    }
}

fn unescape(text: &str) -> Vec<u8> {
    text.replace("\\n", "\n").replace("\\t", "\t").into_bytes()
}

/// Return value of a scripted export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedValue {
    Printed(String),
    Opaque,
}

#[derive(Debug, Default)]
pub struct ScriptedEngine {
    input: Vec<u8>,
    output: Vec<u8>,
    module: Option<Module>,
}

impl ScriptedEngine {
    pub fn input(&self) -> &[u8] {
        &self.input
    }

    fn compile(&mut self, tag: &str) -> Result<ScriptedValue, EngineError> {
        let source = String::from_utf8_lossy(&self.input).into_owned();
        if source.contains("#error") {
            return Err(EngineError::Trap("compile error".to_string()));
        }
        if source
            .lines()
            .any(|line| line.trim() == format!("#fail-under {}", tag))
        {
            return Err(EngineError::Trap(format!("refusing to compile under {}", tag)));
        }

        let compiled = match tag.parse::<u64>() {
            Ok(n) => source.replace("$NEXT", &(n + 1).to_string()),
            Err(_) => source,
        };
        self.output.extend_from_slice(compiled.as_bytes());
        Ok(ScriptedValue::Printed("#t".to_string()))
    }
}

impl Engine for ScriptedEngine {
    type Value = ScriptedValue;

    fn bind_input(&mut self, input: &[u8]) {
        self.input = input.to_vec();
    }

    fn clear_output(&mut self) {
        self.output.clear();
    }

    fn output(&self) -> &[u8] {
        &self.output
    }

    fn load_module(&mut self, module: &[u8]) -> Result<(), EngineError> {
        self.module = Some(Module::parse(module)?);
        Ok(())
    }

    fn invoke(&mut self, export: &str) -> Result<ScriptedValue, EngineError> {
        let module = self
            .module
            .clone()
            .ok_or_else(|| EngineError::Trap("no module loaded".to_string()))?;

        match module {
            Module::Compiler { tag } if export == COMPILE_EXPORT => self.compile(&tag),
            Module::Compiler { .. } => Err(EngineError::Trap(format!("no export '{}'", export))),
            Module::Return(literal) => Ok(ScriptedValue::Printed(literal)),
            Module::ExpectInput(expected) => {
                let input = self.input.clone();
                self.output.extend_from_slice(&input);
                let verdict = if self.output == expected { "#t" } else { "#f" };
                Ok(ScriptedValue::Printed(verdict.to_string()))
            }
            Module::Trap(message) => Err(EngineError::Trap(message)),
            Module::Unmarshalable => Ok(ScriptedValue::Opaque),
        }
    }

    fn marshal(&self, value: ScriptedValue) -> Result<HostValue, EngineError> {
        match value {
            ScriptedValue::Printed(text) => Ok(match text.as_str() {
                "#f" => HostValue::False,
                "#t" => HostValue::True,
                other => other
                    .parse::<i64>()
                    .map(HostValue::Integer)
                    .unwrap_or_else(|_| HostValue::Opaque(other.to_string())),
            }),
            ScriptedValue::Opaque => Err(EngineError::Marshal("opaque value".to_string())),
        }
    }
}

/// Hands out fresh [`ScriptedEngine`]s and counts them
#[derive(Debug, Default)]
pub struct ScriptedEngineFactory {
    instantiations: AtomicUsize,
    unavailable: bool,
}

impl ScriptedEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory whose instantiation always fails
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn instantiations(&self) -> usize {
        self.instantiations.load(Ordering::SeqCst)
    }
}

impl EngineFactory for ScriptedEngineFactory {
    type Engine = ScriptedEngine;

    fn instantiate(&self) -> Result<ScriptedEngine, EngineError> {
        if self.unavailable {
            return Err(EngineError::Instantiate("engine unavailable".to_string()));
        }
        self.instantiations.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedEngine::default())
    }
}

/// Stands in for the host toolchain
#[derive(Debug, Default)]
pub struct ScriptedHost {
    calls: AtomicUsize,
    failure: Option<String>,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(diagnostic: impl Into<String>) -> Self {
        Self {
            failure: Some(diagnostic.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompilerInvoker for ScriptedHost {
    fn compile(&self, unit: &SourceUnit) -> Result<Vec<u8>, CompileError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(diagnostic) = &self.failure {
            return Err(CompileError::new(diagnostic.clone()));
        }
        Ok(String::from_utf8_lossy(&unit.bytes)
            .replace("$NEXT", "0")
            .into_bytes())
    }
}
