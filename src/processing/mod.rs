//! File selection ahead of extraction.
//!
//! - Language detection from file names, extensions and shebangs
//! - File filtering (vendor directories, generated files, binaries)

pub mod filter;
pub mod language;

pub use filter::{FileFilter, FilterConfig};
pub use language::LanguageDetector;
