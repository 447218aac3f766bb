//! Engine backed by an external module runner process
//!
//! Each engine owns three scratch files under the work directory: the loaded
//! module, the bound input, and the result written by the runner. The runner
//! command receives `{module}`, `{export}` and `{result}`; bound input is fed
//! on stdin and stdout is collected as the engine's output.

use crate::command::CommandTemplate;
use crate::engine::{Engine, EngineError, EngineFactory, HostValue};
use bootcheck_config::ToolchainConfig;
use bootcheck_log::{debug, Logger};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub struct ProcessEngineFactory {
    runner: CommandTemplate,
    work_dir: PathBuf,
    false_literal: String,
    true_literal: String,
    next_id: AtomicU64,
    logger: Arc<Logger>,
}

impl ProcessEngineFactory {
    pub fn new(runner: CommandTemplate, work_dir: impl Into<PathBuf>, logger: Arc<Logger>) -> Self {
        let defaults = ToolchainConfig::default();
        Self {
            runner,
            work_dir: work_dir.into(),
            false_literal: defaults.false_literal,
            true_literal: defaults.true_literal,
            next_id: AtomicU64::new(0),
            logger,
        }
    }

    /// Printed forms of the canonical false and true values
    pub fn with_literals(
        mut self,
        false_literal: impl Into<String>,
        true_literal: impl Into<String>,
    ) -> Self {
        self.false_literal = false_literal.into();
        self.true_literal = true_literal.into();
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }
}

impl EngineFactory for ProcessEngineFactory {
    type Engine = ProcessEngine;

    fn instantiate(&self) -> Result<ProcessEngine, EngineError> {
        fs::create_dir_all(&self.work_dir).map_err(|e| {
            EngineError::Instantiate(format!("cannot create '{}': {}", self.work_dir.display(), e))
        })?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let stem = format!("engine-{}-{}", std::process::id(), id);
        Ok(ProcessEngine {
            runner: self.runner.clone(),
            module_path: self.work_dir.join(format!("{stem}.mod")),
            input_path: self.work_dir.join(format!("{stem}.in")),
            result_path: self.work_dir.join(format!("{stem}.result")),
            input: Vec::new(),
            output: Vec::new(),
            loaded: false,
            false_literal: self.false_literal.clone(),
            true_literal: self.true_literal.clone(),
            logger: Arc::clone(&self.logger),
        })
    }
}

pub struct ProcessEngine {
    runner: CommandTemplate,
    module_path: PathBuf,
    input_path: PathBuf,
    result_path: PathBuf,
    input: Vec<u8>,
    output: Vec<u8>,
    loaded: bool,
    false_literal: String,
    true_literal: String,
    logger: Arc<Logger>,
}

impl ProcessEngine {
    pub fn module_path(&self) -> &Path {
        &self.module_path
    }

    fn printed_value(&self, text: &str) -> HostValue {
        let text = text.trim();
        if text == self.false_literal {
            HostValue::False
        } else if text == self.true_literal {
            HostValue::True
        } else if let Ok(n) = text.parse::<i64>() {
            HostValue::Integer(n)
        } else {
            HostValue::Opaque(text.to_string())
        }
    }
}

impl Engine for ProcessEngine {
    /// Contents of the result file, if the runner wrote one
    type Value = Option<Vec<u8>>;

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
        if module.is_empty() {
            return Err(EngineError::Load("empty module".to_string()));
        }
        fs::write(&self.module_path, module).map_err(|e| {
            EngineError::Load(format!("cannot write '{}': {}", self.module_path.display(), e))
        })?;
        self.loaded = true;
        Ok(())
    }

    fn invoke(&mut self, export: &str) -> Result<Option<Vec<u8>>, EngineError> {
        if !self.loaded {
            return Err(EngineError::Trap("no module loaded".to_string()));
        }

        let io_trap = |what: &str, path: &Path, e: std::io::Error| {
            EngineError::Trap(format!("{} '{}': {}", what, path.display(), e))
        };
        fs::write(&self.input_path, &self.input)
            .map_err(|e| io_trap("cannot write", &self.input_path, e))?;
        match fs::remove_file(&self.result_path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                return Err(io_trap("cannot remove", &self.result_path, e))
            }
            _ => {}
        }
        let stdin = File::open(&self.input_path)
            .map_err(|e| io_trap("cannot open", &self.input_path, e))?;

        let vars = [
            ("module", self.module_path.as_os_str()),
            ("export", std::ffi::OsStr::new(export)),
            ("result", self.result_path.as_os_str()),
        ];
        debug!(
            self.logger,
            "runner: {} {}",
            self.runner.program(),
            self.runner.rendered_args(&vars).join(" ")
        );

        let result = self
            .runner
            .render(&vars)
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                EngineError::Trap(format!("cannot spawn '{}': {}", self.runner.program(), e))
            })?;

        self.output.extend_from_slice(&result.stdout);
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let stderr = stderr.trim();
            return Err(EngineError::Trap(if stderr.is_empty() {
                format!("{} exited with {}", export, result.status)
            } else {
                stderr.to_string()
            }));
        }

        Ok(fs::read(&self.result_path).ok())
    }

    fn marshal(&self, value: Option<Vec<u8>>) -> Result<HostValue, EngineError> {
        let bytes = value.ok_or_else(|| EngineError::Marshal("no result written".to_string()))?;
        let text = String::from_utf8(bytes)
            .map_err(|e| EngineError::Marshal(format!("result is not UTF-8: {}", e)))?;
        Ok(self.printed_value(&text))
    }
}

impl Drop for ProcessEngine {
    fn drop(&mut self) {
        for path in [&self.module_path, &self.input_path, &self.result_path] {
            let _ = fs::remove_file(path);
        }
    }
}
