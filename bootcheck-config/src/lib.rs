//! Bootcheck Config - Pure configuration data structures
//!
//! This crate contains only data structures, no I/O and no global state.
//! It serves as the shared configuration vocabulary across all Bootcheck crates.
//! Every struct deserializes from the JSON config file and falls back to
//! its `Default` for missing fields.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// One compiler generation
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageId {
    Stage0,
    Stage1,
    Stage2,
    Stage3,
}

impl StageId {
    /// Every stage, in build order
    pub const ALL: [StageId; 4] = [
        StageId::Stage0,
        StageId::Stage1,
        StageId::Stage2,
        StageId::Stage3,
    ];

    /// Stages that may be executed against the test corpus
    pub const TESTABLE: [StageId; 3] = [StageId::Stage0, StageId::Stage1, StageId::Stage2];

    /// Ordinal of this stage (0..=3)
    pub const fn index(self) -> usize {
        match self {
            StageId::Stage0 => 0,
            StageId::Stage1 => 1,
            StageId::Stage2 => 2,
            StageId::Stage3 => 3,
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(StageId::Stage0),
            1 => Some(StageId::Stage1),
            2 => Some(StageId::Stage2),
            3 => Some(StageId::Stage3),
            _ => None,
        }
    }

    /// Get the string name of the stage
    pub const fn as_str(&self) -> &'static str {
        match self {
            StageId::Stage0 => "stage0",
            StageId::Stage1 => "stage1",
            StageId::Stage2 => "stage2",
            StageId::Stage3 => "stage3",
        }
    }

    /// The stage whose compiler builds this one
    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    /// The final stage is built for the fixpoint check only
    pub const fn is_compile_only(self) -> bool {
        matches!(self, StageId::Stage3)
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which stages are built and exercised
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageSelection {
    /// Load stage0 from the snapshot artifact instead of the host toolchain
    pub use_snapshot: bool,
    pub stage0: bool,
    pub stage1: bool,
    pub stage2: bool,
    /// Enables the fixpoint check; never executed against tests
    pub stage3: bool,
}

impl Default for StageSelection {
    fn default() -> Self {
        Self {
            use_snapshot: false,
            stage0: true,
            stage1: true,
            stage2: true,
            stage3: true,
        }
    }
}

impl StageSelection {
    /// A selection enabling exactly the given stages
    pub fn only(use_snapshot: bool, stages: &[StageId]) -> Self {
        Self {
            use_snapshot,
            stage0: stages.contains(&StageId::Stage0),
            stage1: stages.contains(&StageId::Stage1),
            stage2: stages.contains(&StageId::Stage2),
            stage3: stages.contains(&StageId::Stage3),
        }
    }

    pub fn is_enabled(&self, stage: StageId) -> bool {
        match stage {
            StageId::Stage0 => self.stage0,
            StageId::Stage1 => self.stage1,
            StageId::Stage2 => self.stage2,
            StageId::Stage3 => self.stage3,
        }
    }

    /// Enabled stages that run the test corpus, ascending
    pub fn tested_stages(&self) -> Vec<StageId> {
        StageId::TESTABLE
            .iter()
            .copied()
            .filter(|stage| self.is_enabled(*stage))
            .collect()
    }

    pub fn fixpoint_enabled(&self) -> bool {
        self.stage3
    }

    /// The stage compared against one further self-compilation.
    ///
    /// This is the last stage used for testing, or stage2 when no stage is tested.
    pub fn fixpoint_base(&self) -> StageId {
        self.tested_stages()
            .last()
            .copied()
            .unwrap_or(StageId::Stage2)
    }
}

/// Well-known artifact locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Canonical compiler source compiled by every stage
    pub compiler_source: PathBuf,
    /// Pre-built stage0 module
    pub snapshot: PathBuf,
    /// Fixed-name handoff file written by the host toolchain
    pub scratch_artifact: PathBuf,
    /// Scratch directory for engine module files
    pub work_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            compiler_source: PathBuf::from("compiler/compiler.src"),
            snapshot: PathBuf::from("stage0.mod"),
            scratch_artifact: PathBuf::from("out.mod"),
            work_dir: PathBuf::from(".bootcheck"),
        }
    }
}

impl PathsConfig {
    /// Resolve relative paths against `base` (the config file's directory)
    pub fn resolved(&self, base: &Path) -> Self {
        Self {
            compiler_source: resolve(base, &self.compiler_source),
            snapshot: resolve(base, &self.snapshot),
            scratch_artifact: resolve(base, &self.scratch_artifact),
            work_dir: resolve(base, &self.work_dir),
        }
    }
}

/// Test corpus layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub dir: PathBuf,
    /// Extension of test sources (without the dot)
    pub source_extension: String,
    /// Extension of the optional sibling input file
    pub input_extension: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("tests"),
            source_extension: "src".to_string(),
            input_extension: "in".to_string(),
        }
    }
}

impl CorpusConfig {
    pub fn resolved(&self, base: &Path) -> Self {
        Self {
            dir: resolve(base, &self.dir),
            ..self.clone()
        }
    }
}

/// External commands and engine conventions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Host toolchain command; `{source}` and `{output}` are substituted
    pub host: Vec<String>,
    /// Module runner command; `{module}`, `{export}` and `{result}` are substituted
    pub runner: Vec<String>,
    /// Export of a compiler module that compiles stdin to stdout
    pub compile_export: String,
    /// Export of a test module returning the verdict
    pub entry_export: String,
    /// Printed form of the language's canonical false value
    pub false_literal: String,
    pub true_literal: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            host: vec![
                "hostc".to_string(),
                "{source}".to_string(),
                "-o".to_string(),
                "{output}".to_string(),
            ],
            runner: vec![
                "modrun".to_string(),
                "{module}".to_string(),
                "{export}".to_string(),
                "{result}".to_string(),
            ],
            compile_export: "compile_stdin_to_stdout".to_string(),
            entry_export: "main".to_string(),
            false_literal: "#f".to_string(),
            true_literal: "#t".to_string(),
        }
    }
}

/// Log verbosity
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" => Some(LogLevel::Warn),
            // silent = only errors
            "error" | "silent" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// The whole configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub stages: StageSelection,
    pub paths: PathsConfig,
    pub corpus: CorpusConfig,
    pub toolchain: ToolchainConfig,
    pub log_level: LogLevel,
}

impl HarnessConfig {
    /// Resolve every relative path against `base`
    pub fn resolved(&self, base: &Path) -> Self {
        Self {
            paths: self.paths.resolved(base),
            corpus: self.corpus.resolved(base),
            ..self.clone()
        }
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ordering() {
        assert_eq!(StageId::Stage0.previous(), None);
        assert_eq!(StageId::Stage2.previous(), Some(StageId::Stage1));
        assert_eq!(StageId::Stage2.next(), Some(StageId::Stage3));
        assert_eq!(StageId::Stage3.next(), None);
        assert!(StageId::Stage3.is_compile_only());
        assert_eq!(StageId::from_index(1), Some(StageId::Stage1));
        assert_eq!(StageId::Stage1.to_string(), "stage1");
    }

    #[test]
    fn test_default_selection() {
        let stages = StageSelection::default();
        assert!(!stages.use_snapshot);
        assert_eq!(
            stages.tested_stages(),
            vec![StageId::Stage0, StageId::Stage1, StageId::Stage2]
        );
        assert!(stages.fixpoint_enabled());
        assert_eq!(stages.fixpoint_base(), StageId::Stage2);
    }

    #[test]
    fn test_fixpoint_base_follows_last_tested_stage() {
        let stages = StageSelection::only(true, &[StageId::Stage0, StageId::Stage1, StageId::Stage3]);
        assert_eq!(stages.fixpoint_base(), StageId::Stage1);

        let stages = StageSelection::only(false, &[StageId::Stage3]);
        assert!(stages.tested_stages().is_empty());
        assert_eq!(stages.fixpoint_base(), StageId::Stage2);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "stages": { "use_snapshot": true, "stage3": false }, "log_level": "debug" }"#;
        let cfg: HarnessConfig = serde_json::from_str(json).unwrap();
        assert!(cfg.stages.use_snapshot);
        assert!(cfg.stages.stage0);
        assert!(!cfg.stages.stage3);
        assert_eq!(cfg.log_level, LogLevel::Debug);
        assert_eq!(cfg.toolchain.entry_export, "main");
        assert_eq!(cfg.corpus.source_extension, "src");
    }

    #[test]
    fn test_resolved_paths() {
        let mut cfg = HarnessConfig::default();
        cfg.paths.snapshot = PathBuf::from("/abs/stage0.mod");
        let resolved = cfg.resolved(Path::new("/project"));
        assert_eq!(resolved.paths.snapshot, PathBuf::from("/abs/stage0.mod"));
        assert_eq!(
            resolved.paths.compiler_source,
            PathBuf::from("/project/compiler/compiler.src")
        );
        assert_eq!(resolved.corpus.dir, PathBuf::from("/project/tests"));
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("WARN"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("silent"), Some(LogLevel::Error));
        assert_eq!(LogLevel::parse("loud"), None);
    }
}
