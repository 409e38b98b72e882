//! Batch indexing of a source tree.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use futures::stream::{self, StreamExt};
use ignore::WalkBuilder;
use tracing::{debug, info, warn};

use crate::ast_engine::{Extractor, LanguageId};
use crate::processing::{FileFilter, FilterConfig, LanguageDetector};
use crate::types::{FileIndex, IndexerConfig, RepositoryIndex};

/// Bytes inspected when sniffing for binary content.
const BINARY_SAMPLE_SIZE: usize = 8 * 1024;

/// Bytes read from extensionless files to find a shebang line.
const SHEBANG_SAMPLE_SIZE: u64 = 256;

/// Configuration for batch indexing.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum files extracted concurrently
    pub concurrency: usize,
    /// Whether to continue on individual file failures
    pub continue_on_error: bool,
    /// Languages to index
    pub languages: Vec<LanguageId>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: crate::DEFAULT_MAX_CONCURRENT_FILES,
            continue_on_error: true,
            languages: LanguageId::all().to_vec(),
        }
    }
}

impl From<&IndexerConfig> for BatchConfig {
    fn from(config: &IndexerConfig) -> Self {
        Self {
            concurrency: config.max_concurrent_files.max(1),
            continue_on_error: config.continue_on_error,
            languages: config.languages.clone(),
        }
    }
}

/// Result of batch indexing.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub total_files: usize,
    pub indexed_files: usize,
    pub skipped_files: usize,
    pub failed_files: usize,
    pub diagnostics: usize,
    pub errors: Vec<BatchError>,
}

/// A file that could not be indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchError {
    pub path: String,
    pub error: String,
}

/// A file selected for extraction.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Root-relative path with forward slashes.
    pub relative: String,
    pub language: LanguageId,
}

/// Outcome of indexing one file.
enum FileOutcome {
    Indexed { entry: FileIndex, diagnostics: usize },
    Skipped(String),
}

/// Indexes every supported file under a root directory.
pub struct BatchIndexer {
    config: BatchConfig,
    filter: Arc<FileFilter>,
    detector: LanguageDetector,
    extractors: HashMap<LanguageId, Arc<Extractor>>,
}

impl BatchIndexer {
    /// Create an indexer with one shared extractor per enabled language.
    pub fn new(config: BatchConfig, filter: FileFilter) -> Result<Self> {
        let mut extractors = HashMap::new();
        for &language in &config.languages {
            let extractor = Extractor::new(language)
                .with_context(|| format!("Failed to build extractor for {}", language))?;
            extractors.insert(language, Arc::new(extractor));
        }

        Ok(Self {
            config,
            filter: Arc::new(filter),
            detector: LanguageDetector::new(),
            extractors,
        })
    }

    /// Create an indexer from the top-level configuration.
    pub fn from_config(config: &IndexerConfig) -> Result<Self> {
        let filter = FileFilter::new(FilterConfig {
            max_file_size: config.max_file_size,
            ..FilterConfig::default()
        });
        Self::new(BatchConfig::from(config), filter)
    }

    /// Walk `root` and return the files to extract, sorted by relative path.
    pub fn discover(&self, root: &Path) -> Vec<SourceFile> {
        let filter = Arc::clone(&self.filter);
        let include_hidden = self.filter.config().include_hidden;

        let mut files: Vec<SourceFile> = WalkBuilder::new(root)
            .hidden(!include_hidden)
            .git_ignore(true)
            .git_exclude(true)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                entry.depth() == 0
                    || !is_dir
                    || entry
                        .file_name()
                        .to_str()
                        .map_or(true, |name| filter.should_descend(name))
            })
            .build()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .filter_map(|entry| {
                let path = entry.into_path();
                let relative = path.strip_prefix(root).ok()?.to_path_buf();
                let size = std::fs::metadata(&path).map(|m| m.len() as usize).ok()?;

                if let Err(reason) = self.filter.should_process(&relative, size) {
                    debug!(path = %relative.display(), reason = %reason, "Skipping file");
                    return None;
                }

                let language = match self.detector.detect(&relative, None) {
                    Some(language) => language,
                    // Extensionless scripts are identified by their shebang.
                    None if relative.extension().is_none() => {
                        let head = read_head(&path)?;
                        self.detector.detect(&relative, Some(&head))?
                    }
                    None => return None,
                };
                if !self.extractors.contains_key(&language) {
                    return None;
                }

                Some(SourceFile {
                    relative: to_forward_slashes(&relative),
                    path,
                    language,
                })
            })
            .collect();

        files.sort_by(|a, b| a.relative.cmp(&b.relative));
        files
    }

    /// Index every supported file under `root`.
    pub async fn index_directory(&self, root: &Path) -> Result<(RepositoryIndex, BatchResult)> {
        let files = self.discover(root);
        self.index_files(files).await
    }

    /// Extract the given files concurrently and assemble the repository index.
    pub async fn index_files(
        &self,
        files: Vec<SourceFile>,
    ) -> Result<(RepositoryIndex, BatchResult)> {
        let mut result = BatchResult {
            total_files: files.len(),
            ..BatchResult::default()
        };
        let mut index = RepositoryIndex::new();

        info!(total_files = files.len(), "Starting batch indexing");

        let mut outcomes = stream::iter(files)
            .map(|file| {
                let extractor = self.extractors.get(&file.language).cloned();
                let filter = Arc::clone(&self.filter);
                async move {
                    let relative = file.relative.clone();
                    let outcome = match extractor {
                        Some(extractor) => tokio::task::spawn_blocking(move || {
                            index_file(&file.path, &extractor, &filter)
                        })
                        .await
                        .map_err(|e| anyhow!("Extraction task failed: {}", e))
                        .and_then(|outcome| outcome),
                        None => Err(anyhow!("No extractor for {}", file.language)),
                    };
                    (relative, outcome)
                }
            })
            .buffer_unordered(self.config.concurrency.max(1));

        while let Some((relative, outcome)) = outcomes.next().await {
            match outcome {
                Ok(FileOutcome::Indexed { entry, diagnostics }) => {
                    result.indexed_files += 1;
                    result.diagnostics += diagnostics;
                    index.insert(relative, entry);
                }
                Ok(FileOutcome::Skipped(reason)) => {
                    debug!(path = %relative, reason = %reason, "Skipped file");
                    result.skipped_files += 1;
                }
                Err(e) => {
                    result.failed_files += 1;
                    result.errors.push(BatchError {
                        path: relative.clone(),
                        error: format!("{:#}", e),
                    });

                    if !self.config.continue_on_error {
                        return Err(e.context(format!("Failed to index {}", relative)));
                    }

                    warn!(path = %relative, error = %e, "Failed to index file");
                }
            }
        }

        for dangling in index.dangling_references() {
            warn!(
                path = %dangling.path,
                method = %dangling.method,
                enclosing_type = %dangling.enclosing_type,
                "Method refers to a type missing from its file"
            );
        }

        info!(
            indexed = result.indexed_files,
            skipped = result.skipped_files,
            failed = result.failed_files,
            diagnostics = result.diagnostics,
            "Batch indexing complete"
        );

        Ok((index, result))
    }
}

/// Read and extract one file. Runs on a blocking thread.
fn index_file(path: &Path, extractor: &Extractor, filter: &FileFilter) -> Result<FileOutcome> {
    let source = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    if filter.is_binary_content(&source, BINARY_SAMPLE_SIZE) {
        return Ok(FileOutcome::Skipped("Binary content".to_string()));
    }

    let extraction = extractor.extract(&source)?;
    Ok(FileOutcome::Indexed {
        entry: FileIndex::from(&extraction),
        diagnostics: extraction.diagnostics.len(),
    })
}

/// First bytes of a file, or `None` if it cannot be read.
fn read_head(path: &Path) -> Option<Vec<u8>> {
    let file = std::fs::File::open(path).ok()?;
    let mut head = Vec::new();
    file.take(SHEBANG_SAMPLE_SIZE).read_to_end(&mut head).ok()?;
    Some(head)
}

fn to_forward_slashes(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
