//! Report entries emitted while a run progresses
//!
//! Entries are pushed as soon as they are known, so everything executed
//! before a fatal error is still reported.

use crate::fixpoint::FixpointProof;
use crate::outcome::AttemptRecord;
use bootcheck_config::StageId;
use std::sync::{Arc, Mutex};

/// A single report entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEntry {
    /// One (test, stage) attempt finished
    Attempt(AttemptRecord),
    /// A stage could not be built; reported once per stage
    StageBuildFailed { stage: StageId, diagnostic: String },
    /// The fixpoint check converged or was skipped
    Fixpoint(FixpointProof),
    /// Generic info message
    Info(String),
}

/// Output buffer for capturing and routing report entries
pub trait OutputBuffer: Send + Sync {
    /// Push an output entry
    fn push(&self, entry: OutputEntry);

    /// Drain all entries (returns and clears)
    fn drain(&self) -> Vec<OutputEntry>;

    /// Check if empty
    fn is_empty(&self) -> bool;
}

/// In-memory output buffer implementation
pub struct MemoryOutputBuffer {
    entries: Mutex<Vec<OutputEntry>>,
}

impl MemoryOutputBuffer {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl Default for MemoryOutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputBuffer for MemoryOutputBuffer {
    fn push(&self, entry: OutputEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }

    fn drain(&self) -> Vec<OutputEntry> {
        if let Ok(mut entries) = self.entries.lock() {
            std::mem::take(&mut *entries)
        } else {
            Vec::new()
        }
    }

    fn is_empty(&self) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.is_empty())
            .unwrap_or(true)
    }
}

/// Shared output buffer handle
pub type OutputHandle = Arc<dyn OutputBuffer>;

/// Create a new in-memory output buffer
pub fn new_output_buffer() -> OutputHandle {
    Arc::new(MemoryOutputBuffer::new())
}
