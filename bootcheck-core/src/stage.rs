//! Stage derivation
//!
//! stage0 comes from the snapshot or the host toolchain. Every later stage is
//! the previous stage's compiler run over the canonical compiler source. Each
//! stage is built at most once per run, on first request; a failed build is
//! remembered just like a successful one.

use crate::engine::EngineFactory;
use crate::error::StageBuildError;
use crate::invoker::{CompilerInvoker, ModuleInvoker, SourceUnit};
use bootcheck_config::{HarnessConfig, StageId};
use bootcheck_log::{debug, error, info, warn, Logger};
use bootcheck_vfs::VirtualFileSystem;
use once_cell::unsync::OnceCell;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Where a stage's bytes came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum Provenance {
    Snapshot,
    HostBuilt,
    SelfBuilt { compiler: StageId },
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Snapshot => f.write_str("snapshot"),
            Provenance::HostBuilt => f.write_str("host-built"),
            Provenance::SelfBuilt { compiler } => write!(f, "self-built by {}", compiler),
        }
    }
}

/// One compiler generation; immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub id: StageId,
    pub provenance: Provenance,
    pub bytes: Arc<[u8]>,
}

impl Stage {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// FNV-1a fingerprint of the bytes, for logs only
    pub fn digest(&self) -> u64 {
        fnv1a(&self.bytes)
    }
}

pub(crate) fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    bytes
        .iter()
        .fold(OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(PRIME))
}

type Slot = OnceCell<Result<Arc<Stage>, StageBuildError>>;

/// Lazily builds and memoizes stage0..stage3
pub struct StageManager<'a, F> {
    config: &'a HarnessConfig,
    vfs: &'a dyn VirtualFileSystem,
    host: &'a dyn CompilerInvoker,
    engines: &'a F,
    logger: Arc<Logger>,
    source: OnceCell<Result<SourceUnit, StageBuildError>>,
    slots: [Slot; 4],
}

impl<'a, F: EngineFactory> StageManager<'a, F> {
    pub fn new(
        config: &'a HarnessConfig,
        vfs: &'a dyn VirtualFileSystem,
        host: &'a dyn CompilerInvoker,
        engines: &'a F,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            config,
            vfs,
            host,
            engines,
            logger,
            source: OnceCell::new(),
            slots: Default::default(),
        }
    }

    pub fn config(&self) -> &'a HarnessConfig {
        self.config
    }

    pub fn engines(&self) -> &'a F {
        self.engines
    }

    /// Build a stage, or return the memoized result
    pub fn build_stage(&self, id: StageId) -> Result<Arc<Stage>, StageBuildError> {
        self.slots[id.index()]
            .get_or_init(|| self.construct(id))
            .clone()
    }

    /// The compiler of a stage, as an invoker for test sources
    pub fn invoker(&self, id: StageId) -> Result<ModuleInvoker<'a, F>, StageBuildError> {
        let stage = self.build_stage(id)?;
        Ok(self.module_invoker(&stage))
    }

    /// Stages built successfully so far, ascending
    pub fn built_stages(&self) -> Vec<Arc<Stage>> {
        self.slots
            .iter()
            .filter_map(|slot| slot.get())
            .filter_map(|result| result.as_ref().ok())
            .cloned()
            .collect()
    }

    fn module_invoker(&self, stage: &Stage) -> ModuleInvoker<'a, F> {
        ModuleInvoker::new(
            self.engines,
            Arc::clone(&stage.bytes),
            &self.config.toolchain.compile_export,
            Arc::clone(&self.logger),
        )
    }

    fn construct(&self, id: StageId) -> Result<Arc<Stage>, StageBuildError> {
        let _span = self.logger.enter_span("build_stage");
        info!(self.logger, "building {}", id);

        let result = match id.previous() {
            None => self.construct_stage0(),
            Some(previous) => self.construct_from(id, previous),
        };

        match &result {
            Ok(stage) => info!(
                self.logger,
                "{}: {}, {} bytes, fingerprint {:016x}",
                id,
                stage.provenance,
                stage.len(),
                stage.digest()
            ),
            Err(e @ StageBuildError::Dependency { .. }) => warn!(self.logger, "{}", e),
            Err(e) => error!(self.logger, "{}", e),
        }
        result
    }

    fn construct_stage0(&self) -> Result<Arc<Stage>, StageBuildError> {
        let (bytes, provenance) = if self.config.stages.use_snapshot {
            let path = &self.config.paths.snapshot;
            debug!(self.logger, "loading snapshot {}", path.display());
            let bytes = self
                .vfs
                .read_file(path)
                .map_err(|e| StageBuildError::Snapshot {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            if bytes.is_empty() {
                return Err(StageBuildError::Snapshot {
                    path: path.clone(),
                    reason: "empty file".to_string(),
                });
            }
            (bytes, Provenance::Snapshot)
        } else {
            let source = self.compiler_source(StageId::Stage0)?;
            let bytes = self.compile(StageId::Stage0, self.host, source)?;
            (bytes, Provenance::HostBuilt)
        };

        Ok(Arc::new(Stage {
            id: StageId::Stage0,
            provenance,
            bytes: bytes.into(),
        }))
    }

    fn construct_from(&self, id: StageId, previous: StageId) -> Result<Arc<Stage>, StageBuildError> {
        let compiler = self
            .build_stage(previous)
            .map_err(|e| e.blocking(id))?;
        let source = self.compiler_source(id)?;
        let bytes = self.compile(id, &self.module_invoker(&compiler), source)?;

        Ok(Arc::new(Stage {
            id,
            provenance: Provenance::SelfBuilt { compiler: previous },
            bytes: bytes.into(),
        }))
    }

    fn compile(
        &self,
        id: StageId,
        invoker: &dyn CompilerInvoker,
        source: &SourceUnit,
    ) -> Result<Vec<u8>, StageBuildError> {
        let bytes = invoker
            .compile(source)
            .map_err(|source| StageBuildError::Compile { stage: id, source })?;
        if bytes.is_empty() {
            return Err(StageBuildError::Compile {
                stage: id,
                source: crate::error::CompileError::new("empty artifact"),
            });
        }
        Ok(bytes)
    }

    /// The canonical compiler source, read once
    fn compiler_source(&self, requester: StageId) -> Result<&SourceUnit, StageBuildError> {
        self.source
            .get_or_init(|| {
                let path = &self.config.paths.compiler_source;
                self.vfs
                    .read_file(path)
                    .map(|bytes| SourceUnit::new("compiler", path.clone(), bytes))
                    .map_err(|e| StageBuildError::Source {
                        stage: requester,
                        path: path.clone(),
                        reason: e.to_string(),
                    })
            })
            .as_ref()
            .map_err(Clone::clone)
    }
}
