//! File filtering rules.
//!
//! Excludes dependency and build directories, generated sources, oversized
//! files and binary content before anything is parsed.

use std::collections::HashSet;
use std::path::Path;

use regex::Regex;
use tracing::warn;

use crate::DEFAULT_MAX_FILE_SIZE;

/// Configuration for file filtering.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Directory names skipped anywhere in the tree.
    pub excluded_directories: HashSet<String>,
    /// Maximum file size in bytes.
    pub max_file_size: usize,
    /// Minimum file size in bytes.
    pub min_file_size: usize,
    /// Whether hidden files and directories are indexed.
    pub include_hidden: bool,
    /// File name patterns for generated sources.
    pub generated_patterns: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            excluded_directories: default_excluded_directories(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            min_file_size: 1,
            include_hidden: false,
            generated_patterns: default_generated_patterns(),
        }
    }
}

fn default_excluded_directories() -> HashSet<String> {
    [
        // Version control
        ".git",
        ".svn",
        ".hg",
        // Dependencies
        "node_modules",
        "vendor",
        ".venv",
        "venv",
        "__pycache__",
        ".tox",
        // Build output
        "target",
        "build",
        "dist",
        "out",
        ".next",
        // Misc
        "coverage",
        ".eggs",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_generated_patterns() -> Vec<String> {
    [
        r".*\.generated\.",
        r".*_pb2\.py$",
        r".*\.pb\.go$",
        r".*\.min\.js$",
        r".*bundle\..*",
        r".*\.d\.ts$",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Decides which files reach the extractor.
pub struct FileFilter {
    config: FilterConfig,
    generated_regexes: Vec<Regex>,
}

impl FileFilter {
    /// Create a filter; invalid generated patterns are logged and dropped.
    pub fn new(config: FilterConfig) -> Self {
        let generated_regexes = config
            .generated_patterns
            .iter()
            .filter_map(|p| match Regex::new(p) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    warn!(pattern = %p, error = %e, "Ignoring invalid generated-file pattern");
                    None
                }
            })
            .collect();

        Self {
            config,
            generated_regexes,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(FilterConfig::default())
    }

    /// Whether the walker should descend into a directory with this name.
    pub fn should_descend(&self, name: &str) -> bool {
        if self.config.excluded_directories.contains(name) {
            return false;
        }
        self.config.include_hidden || !is_hidden(name)
    }

    /// Check whether a file should be indexed.
    ///
    /// Returns `Err(reason)` when the file is skipped.
    pub fn should_process(&self, path: &Path, size: usize) -> Result<(), String> {
        if size < self.config.min_file_size {
            return Err("File is empty".to_string());
        }

        if size > self.config.max_file_size {
            return Err(format!(
                "File too large: {} bytes (max: {})",
                size, self.config.max_file_size
            ));
        }

        if let Some(parent) = path.parent() {
            for component in parent.components() {
                if let Some(name) = component.as_os_str().to_str() {
                    if matches!(name, "." | "..") {
                        continue;
                    }
                    if !self.should_descend(name) {
                        return Err(format!("In excluded directory: {}", name));
                    }
                }
            }
        }

        if let Some(filename) = path.file_name().and_then(|n| n.to_str()) {
            if !self.config.include_hidden && is_hidden(filename) {
                return Err("Hidden file".to_string());
            }

            for regex in &self.generated_regexes {
                if regex.is_match(filename) {
                    return Err(format!("Generated file pattern: {}", regex.as_str()));
                }
            }
        }

        Ok(())
    }

    /// Check if content appears to be binary.
    pub fn is_binary_content(&self, content: &[u8], sample_size: usize) -> bool {
        let sample = &content[..content.len().min(sample_size)];

        if sample.contains(&0) {
            return true;
        }

        // tab, newline and carriage return are text
        let non_printable = sample
            .iter()
            .filter(|&&b| b < 32 && !matches!(b, 9 | 10 | 13))
            .count();

        !sample.is_empty() && (non_printable as f64 / sample.len() as f64) > 0.1
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.') && name != "." && name != ".."
}
