//! Compiler invokers
//!
//! Two ways to turn source bytes into module bytes:
//!
//! - [`HostInvoker`]: spawns the trusted host toolchain, which writes a
//!   fixed-name scratch artifact that is read back afterwards
//! - [`ModuleInvoker`]: runs a compiler module in a fresh engine, feeding the
//!   source on its input stream and collecting its output

use crate::command::CommandTemplate;
use crate::engine::{Engine, EngineFactory};
use crate::error::CompileError;
use bootcheck_log::{debug, trace, Logger};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// A source to compile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub name: String,
    /// On-disk location, used by the host toolchain
    pub path: PathBuf,
    /// Contents, used by compiler modules
    pub bytes: Vec<u8>,
}

impl SourceUnit {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            bytes,
        }
    }
}

/// Compile a source into module bytes
pub trait CompilerInvoker {
    fn compile(&self, unit: &SourceUnit) -> Result<Vec<u8>, CompileError>;
}

/// Every host invocation in the process shares the scratch artifact
static HOST_LOCK: Mutex<()> = Mutex::new(());

/// Runs the external host toolchain
pub struct HostInvoker {
    command: CommandTemplate,
    scratch: PathBuf,
    logger: Arc<Logger>,
}

impl HostInvoker {
    pub fn new(command: CommandTemplate, scratch: impl Into<PathBuf>, logger: Arc<Logger>) -> Self {
        Self {
            command,
            scratch: scratch.into(),
            logger,
        }
    }

    pub fn scratch(&self) -> &PathBuf {
        &self.scratch
    }
}

impl CompilerInvoker for HostInvoker {
    fn compile(&self, unit: &SourceUnit) -> Result<Vec<u8>, CompileError> {
        let _guard = HOST_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        match fs::remove_file(&self.scratch) {
            Ok(()) => trace!(self.logger, "removed stale {}", self.scratch.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(CompileError::new(format!(
                    "cannot remove stale artifact '{}': {}",
                    self.scratch.display(),
                    e
                )))
            }
        }

        let vars = [
            ("source", unit.path.as_os_str()),
            ("output", self.scratch.as_os_str()),
        ];
        debug!(
            self.logger,
            "host: {} {}",
            self.command.program(),
            self.command.rendered_args(&vars).join(" ")
        );

        let output = self.command.render(&vars).output().map_err(|e| {
            CompileError::new(format!("cannot spawn '{}': {}", self.command.program(), e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CompileError::new(format!(
                "{} exited with {}: {}",
                self.command.program(),
                output.status,
                stderr.trim()
            )));
        }

        fs::read(&self.scratch).map_err(|e| {
            CompileError::new(format!(
                "{} produced no artifact '{}': {}",
                self.command.program(),
                self.scratch.display(),
                e
            ))
        })
    }
}

/// Runs a compiler module's compile export in a fresh engine
pub struct ModuleInvoker<'a, F> {
    engines: &'a F,
    compiler: Arc<[u8]>,
    export: &'a str,
    logger: Arc<Logger>,
}

impl<'a, F: EngineFactory> ModuleInvoker<'a, F> {
    pub fn new(engines: &'a F, compiler: Arc<[u8]>, export: &'a str, logger: Arc<Logger>) -> Self {
        Self {
            engines,
            compiler,
            export,
            logger,
        }
    }
}

impl<F: EngineFactory> CompilerInvoker for ModuleInvoker<'_, F> {
    fn compile(&self, unit: &SourceUnit) -> Result<Vec<u8>, CompileError> {
        let mut engine = self
            .engines
            .instantiate()
            .map_err(|e| CompileError::new(e.to_string()))?;

        engine
            .load_module(&self.compiler)
            .map_err(|e| CompileError::new(format!("compiler module: {}", e)))?;
        engine.bind_input(&unit.bytes);
        engine.clear_output();
        engine
            .invoke(self.export)
            .map_err(|e| CompileError::new(format!("{}: {}", unit.name, e)))?;

        let compiled = engine.output().to_vec();
        if compiled.is_empty() {
            return Err(CompileError::new(format!(
                "{}: compiler produced no output",
                unit.name
            )));
        }

        trace!(
            self.logger,
            "compiled {} ({} -> {} bytes)",
            unit.name,
            unit.bytes.len(),
            compiled.len()
        );
        Ok(compiled)
    }
}
