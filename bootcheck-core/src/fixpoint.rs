//! Bootstrap convergence check

use crate::engine::EngineFactory;
use crate::error::{FixpointMismatch, HarnessError};
use crate::stage::StageManager;
use bootcheck_config::{StageId, StageSelection};
use bootcheck_log::{error, info, Logger};
use serde::Serialize;
use std::sync::Arc;

/// Result of a successful fixpoint check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FixpointProof {
    /// The final stage is disabled
    Skipped,
    /// `stage` and `next` are byte-identical
    Converged {
        stage: StageId,
        next: StageId,
        len: usize,
        digest: u64,
    },
}

/// Compares the last tested stage with one further self-compilation
pub struct FixpointVerifier<'s, 'a, F> {
    stages: &'s StageManager<'a, F>,
    selection: &'s StageSelection,
    logger: Arc<Logger>,
}

impl<'s, 'a, F: EngineFactory> FixpointVerifier<'s, 'a, F> {
    pub fn new(
        stages: &'s StageManager<'a, F>,
        selection: &'s StageSelection,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            stages,
            selection,
            logger,
        }
    }

    pub fn verify(&self) -> Result<FixpointProof, HarnessError> {
        if !self.selection.fixpoint_enabled() {
            return Ok(FixpointProof::Skipped);
        }

        let base = self.selection.fixpoint_base();
        let next = base.next().ok_or_else(|| {
            HarnessError::Config(format!("{} has no successor stage", base))
        })?;

        let _span = self.logger.enter_span("fixpoint");
        info!(self.logger, "comparing {} with {}", base, next);

        let current = self.stages.build_stage(base)?;
        let again = self.stages.build_stage(next)?;

        if let Some(mismatch) = FixpointMismatch::compare(base, next, &current.bytes, &again.bytes) {
            error!(self.logger, "{}", mismatch);
            return Err(mismatch.into());
        }

        let proof = FixpointProof::Converged {
            stage: base,
            next,
            len: current.len(),
            digest: current.digest(),
        };
        info!(self.logger, "fixpoint reached: {} == {} ({} bytes)", base, next, current.len());
        Ok(proof)
    }
}
