//! Test corpus discovery

use crate::error::HarnessError;
use crate::invoker::SourceUnit;
use bootcheck_config::CorpusConfig;
use bootcheck_vfs::VirtualFileSystem;
use std::path::Path;

/// One test program, independent of every stage and every other test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    pub source: SourceUnit,
    /// Bytes bound to the engine's input stream before the test runs
    pub input: Option<Vec<u8>>,
}

/// List the corpus directory: one test per source file, sorted by name
pub fn discover(
    vfs: &dyn VirtualFileSystem,
    corpus: &CorpusConfig,
) -> Result<Vec<TestCase>, HarnessError> {
    let corpus_error = |path: &Path, source| HarnessError::Corpus {
        path: path.to_path_buf(),
        source,
    };

    let entries = vfs
        .read_dir(&corpus.dir)
        .map_err(|e| corpus_error(&corpus.dir, e))?;

    let mut cases = Vec::new();
    for path in entries {
        if !vfs.is_file(&path) || !has_extension(&path, &corpus.source_extension) {
            continue;
        }
        let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };

        let bytes = vfs.read_file(&path).map_err(|e| corpus_error(&path, e))?;

        let input_path = path.with_extension(&corpus.input_extension);
        let input = if vfs.is_file(&input_path) {
            Some(
                vfs.read_file(&input_path)
                    .map_err(|e| corpus_error(&input_path, e))?,
            )
        } else {
            None
        };

        cases.push(TestCase {
            source: SourceUnit::new(name.clone(), path, bytes),
            name,
            input,
        });
    }

    cases.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(cases)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
}
