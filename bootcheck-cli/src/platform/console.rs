//! CLI 格式化输出
//!
//! 每个报告条目到达时立即打印一行，运行结束后打印汇总。

use bootcheck_api::{
    to_report, AttemptRecord, ErrorReport, FailureReport, FixpointProof, HarnessError,
    OutputBuffer, OutputEntry, RunSummary,
};
use serde::Serialize;
use std::sync::Mutex;

/// 打印并收集报告条目的输出缓冲区
pub struct ConsoleOutput {
    entries: Mutex<Vec<OutputEntry>>,
    /// JSON 模式下不逐行打印
    quiet: bool,
}

impl ConsoleOutput {
    pub fn new(quiet: bool) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            quiet,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<OutputEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl OutputBuffer for ConsoleOutput {
    fn push(&self, entry: OutputEntry) {
        if !self.quiet {
            if let Some(line) = format_entry(&entry) {
                println!("{}", line);
            }
        }
        self.lock().push(entry);
    }

    fn drain(&self) -> Vec<OutputEntry> {
        std::mem::take(&mut *self.lock())
    }

    fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// 单个条目的文本形式
pub fn format_entry(entry: &OutputEntry) -> Option<String> {
    match entry {
        OutputEntry::Attempt(record) => Some(record.to_string()),
        OutputEntry::StageBuildFailed { stage, diagnostic } => {
            Some(format!("{} build failed: {}", stage, diagnostic))
        }
        OutputEntry::Fixpoint(FixpointProof::Skipped) => None,
        OutputEntry::Fixpoint(FixpointProof::Converged {
            stage,
            next,
            len,
            digest,
        }) => Some(format!(
            "fixpoint: {} == {} ({} bytes, {:016x})",
            stage, next, len, digest
        )),
        OutputEntry::Info(message) => Some(message.clone()),
    }
}

/// 打印汇总，返回整个运行是否成功
///
/// 中止的运行也会列出中止前已经完成的尝试。
pub fn print_summary(entries: &[OutputEntry], result: &Result<RunSummary, HarnessError>) -> bool {
    let attempts: Vec<_> = entries
        .iter()
        .filter_map(|e| match e {
            OutputEntry::Attempt(record) => Some(record),
            _ => None,
        })
        .collect();
    let report = FailureReport::from_attempts(attempts.iter().copied());
    let build_failures: Vec<_> = entries
        .iter()
        .filter_map(|e| match e {
            OutputEntry::StageBuildFailed { stage, diagnostic } => Some((stage, diagnostic)),
            _ => None,
        })
        .collect();

    println!();
    println!("== Summary ==");
    println!(
        "{} attempts, {} failing tests",
        attempts.len(),
        report.len()
    );

    if !build_failures.is_empty() {
        println!("Stage build failures:");
        for (stage, diagnostic) in &build_failures {
            println!("  {}: {}", stage, diagnostic);
        }
    }

    if !report.is_empty() {
        println!("Failing tests:");
        for (test, failures) in report.iter() {
            let stages: Vec<_> = failures.iter().map(|f| f.stage.as_str()).collect();
            println!("  {}: {}", test, stages.join(", "));
        }
    }

    match result {
        Ok(summary) => {
            match &summary.fixpoint {
                FixpointProof::Skipped => println!("Fixpoint: skipped"),
                FixpointProof::Converged { stage, next, .. } => {
                    println!("Fixpoint: {} == {}", stage, next)
                }
            }
            let passed = summary.passed();
            println!("{}", if passed { "PASSED" } else { "FAILED" });
            passed
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            println!("ABORTED");
            false
        }
    }
}

#[derive(Serialize)]
struct AbortedRun<'a> {
    error: ErrorReport,
    attempts: Vec<&'a AttemptRecord>,
}

/// JSON 模式：打印汇总或结构化错误，返回整个运行是否成功
pub fn print_json(entries: &[OutputEntry], result: &Result<RunSummary, HarnessError>) -> bool {
    let (json, passed) = match result {
        Ok(summary) => (serde_json::to_string_pretty(summary), summary.passed()),
        Err(e) => {
            let aborted = AbortedRun {
                error: to_report(e),
                attempts: entries
                    .iter()
                    .filter_map(|e| match e {
                        OutputEntry::Attempt(record) => Some(record),
                        _ => None,
                    })
                    .collect(),
            };
            (serde_json::to_string_pretty(&aborted), false)
        }
    };

    match json {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: cannot serialize report: {}", e),
    }
    passed
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootcheck_api::{AttemptFailure, ExecutionOutcome, FailureKind, StageId};

    #[test]
    fn test_format_entries() {
        let failed = OutputEntry::Attempt(AttemptRecord {
            test: "add".to_string(),
            stage: StageId::Stage1,
            outcome: ExecutionOutcome::Failed(AttemptFailure::new(FailureKind::Trap, "boom")),
        });
        assert_eq!(
            format_entry(&failed).as_deref(),
            Some("add: stage1 failed (trap): boom")
        );
        assert_eq!(format_entry(&OutputEntry::Fixpoint(FixpointProof::Skipped)), None);
    }

    #[test]
    fn test_console_collects_entries() {
        let console = ConsoleOutput::new(true);
        console.push(OutputEntry::Info("hello".to_string()));
        assert!(!console.is_empty());
        assert_eq!(console.drain().len(), 1);
        assert!(console.is_empty());
    }

    #[test]
    fn test_summary_on_abort() {
        let entries = vec![OutputEntry::Attempt(AttemptRecord {
            test: "add".to_string(),
            stage: StageId::Stage0,
            outcome: ExecutionOutcome::Failed(AttemptFailure::new(FailureKind::ReturnedFalse, "main returned #f")),
        })];
        let result = Err(HarnessError::Config("bad".to_string()));
        assert!(!print_summary(&entries, &result));
        assert!(!print_json(&entries, &result));
    }
}
