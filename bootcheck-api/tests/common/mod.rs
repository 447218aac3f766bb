//! 测试辅助工具
//!
//! 内存文件系统 + 脚本化引擎组成的运行环境

#![allow(dead_code)]

use bootcheck_api::{run_with, Environment, HarnessError, OutputEntry, RunConfig, RunSummary};
use bootcheck_core::new_output_buffer;
use bootcheck_core::scripted::{ScriptedEngineFactory, ScriptedHost};
use bootcheck_vfs::{MemoryFileSystem, VirtualFileSystem};
use std::path::Path;

/// 一次运行的结果和输出条目
pub struct Outcome {
    pub result: Result<RunSummary, HarnessError>,
    pub entries: Vec<OutputEntry>,
}

/// 构建内存项目：编译器源码放在默认位置，测试放在 tests/
pub fn project(compiler: &str, tests: &[(&str, &str)]) -> MemoryFileSystem {
    let vfs = MemoryFileSystem::with_files([("compiler/compiler.src", compiler)]);
    for (name, content) in tests {
        vfs.write_file(&Path::new("tests").join(name), content.as_bytes())
            .unwrap();
    }
    vfs
}

/// 在给定文件系统上运行
pub fn run_in(config: &RunConfig, vfs: &MemoryFileSystem) -> Outcome {
    let host = ScriptedHost::new();
    let engines = ScriptedEngineFactory::new();
    let output = new_output_buffer();

    let result = run_with(
        config,
        &Environment {
            vfs,
            host: &host,
            engines: &engines,
            output: output.clone(),
        },
    );

    Outcome {
        result,
        entries: output.drain(),
    }
}

/// 输出条目中的尝试行
pub fn attempt_lines(entries: &[OutputEntry]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|e| match e {
            OutputEntry::Attempt(record) => Some(record.to_string()),
            _ => None,
        })
        .collect()
}
