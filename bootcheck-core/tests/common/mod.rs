//! 测试辅助工具
//!
//! 在内存文件系统上搭建编译器源码、快照和测试语料，
//! 用脚本化引擎跑完整的 构建 -> 测试 -> 不动点 流程

#![allow(dead_code)]

use bootcheck_config::{HarnessConfig, StageSelection};
use bootcheck_core::output::OutputEntry;
use bootcheck_core::scripted::{ScriptedEngineFactory, ScriptedHost};
use bootcheck_core::{
    discover, new_output_buffer, FixpointProof, FixpointVerifier, HarnessError, RunReport,
    StageManager,
};
use bootcheck_log::{LogConfig, LogRingBuffer};
use bootcheck_vfs::{MemoryFileSystem, VirtualFileSystem};
use std::path::PathBuf;
use std::sync::Arc;

/// 收敛的编译器源码：每一代输出都相同
pub const STABLE_COMPILER: &str = "compiler stable";

/// 发散的编译器源码：每一代都把代数写进产物
pub const DRIFTING_COMPILER: &str = "compiler $NEXT";

/// 一次运行的全部观测结果
pub struct Observed {
    pub report: RunReport,
    pub fixpoint: Result<FixpointProof, HarnessError>,
    pub entries: Vec<OutputEntry>,
    pub host_calls: usize,
    pub instantiations: usize,
    pub logs: Arc<LogRingBuffer>,
}

/// 测试夹具
pub struct Fixture {
    pub config: HarnessConfig,
    pub vfs: MemoryFileSystem,
    pub host: ScriptedHost,
}

impl Fixture {
    pub fn new(compiler: &str, tests: &[(&str, &str)]) -> Self {
        let mut config = HarnessConfig::default();
        config.corpus.dir = PathBuf::from("/project/tests");
        config.paths.compiler_source = PathBuf::from("/project/compiler/compiler.src");
        config.paths.snapshot = PathBuf::from("/project/stage0.mod");

        let vfs = MemoryFileSystem::with_files([("/project/compiler/compiler.src", compiler)]);
        for (name, content) in tests {
            vfs.write_file(&config.corpus.dir.join(name), content.as_bytes())
                .unwrap();
        }

        Self {
            config,
            vfs,
            host: ScriptedHost::new(),
        }
    }

    pub fn stages(mut self, selection: StageSelection) -> Self {
        self.config.stages = selection;
        self
    }

    pub fn snapshot(self, content: &str) -> Self {
        self.vfs
            .write_file(&self.config.paths.snapshot, content.as_bytes())
            .unwrap();
        self
    }

    pub fn host(mut self, host: ScriptedHost) -> Self {
        self.host = host;
        self
    }

    /// 发现语料、跑测试、再做不动点检查
    pub fn run(&self) -> Observed {
        let engines = ScriptedEngineFactory::new();
        let (logger, logs) = LogConfig::new(bootcheck_log::Level::Debug)
            .with_ring_buffer(1024)
            .init();
        let logs = logs.unwrap();

        let stages = StageManager::new(
            &self.config,
            &self.vfs,
            &self.host,
            &engines,
            Arc::clone(&logger),
        );
        let output = new_output_buffer();

        let tests = discover(&self.vfs, &self.config.corpus).unwrap();
        let report =
            bootcheck_core::TestRunner::new(&stages, output.clone(), Arc::clone(&logger)).run(&tests);
        let fixpoint = FixpointVerifier::new(&stages, &self.config.stages, logger).verify();

        Observed {
            report,
            fixpoint,
            entries: output.drain(),
            host_calls: self.host.calls(),
            instantiations: engines.instantiations(),
            logs,
        }
    }
}
