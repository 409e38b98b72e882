//! Configuration for repository indexing.

use serde::{Deserialize, Serialize};

use crate::ast_engine::LanguageId;
use crate::{DEFAULT_MAX_CONCURRENT_FILES, DEFAULT_MAX_FILE_SIZE, DEFAULT_OUTPUT_PATH};

/// Indexer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Where the JSON index is written
    pub output_path: String,

    /// Languages to index; files in other languages are skipped
    pub languages: Vec<LanguageId>,

    /// Maximum files extracted concurrently
    pub max_concurrent_files: usize,

    /// Files larger than this many bytes are skipped
    pub max_file_size: usize,

    /// Whether a failing file is skipped instead of aborting the run
    pub continue_on_error: bool,

    /// Pretty-print the JSON output
    pub pretty: bool,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            languages: LanguageId::all().to_vec(),
            max_concurrent_files: DEFAULT_MAX_CONCURRENT_FILES,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            continue_on_error: true,
            pretty: false,
        }
    }
}

impl IndexerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            output_path: std::env::var("INDEX_OUTPUT")
                .unwrap_or_else(|_| DEFAULT_OUTPUT_PATH.to_string()),
            languages: std::env::var("INDEX_LANGUAGES")
                .ok()
                .map(|s| parse_languages(&s))
                .filter(|languages| !languages.is_empty())
                .unwrap_or_else(|| LanguageId::all().to_vec()),
            max_concurrent_files: std::env::var("MAX_CONCURRENT_FILES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_MAX_CONCURRENT_FILES),
            max_file_size: std::env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_FILE_SIZE),
            continue_on_error: std::env::var("CONTINUE_ON_ERROR")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(true),
            pretty: false,
        }
    }

    /// Restrict indexing to the given languages.
    pub fn with_languages(mut self, languages: Vec<LanguageId>) -> Self {
        self.languages = languages;
        self
    }

    /// Set the concurrency limit.
    pub fn with_concurrency(mut self, max_concurrent_files: usize) -> Self {
        self.max_concurrent_files = max_concurrent_files.max(1);
        self
    }
}

/// Parse a comma-separated language list, ignoring unknown entries.
fn parse_languages(list: &str) -> Vec<LanguageId> {
    let mut languages: Vec<LanguageId> = list
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();
    languages.sort();
    languages.dedup();
    languages
}
