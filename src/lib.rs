//! Code Indexer Library
//!
//! Query-driven structure extraction for source code. Parses a file with
//! tree-sitter, finds types, functions and methods through per-language query
//! profiles, and attaches each declaration's enclosing type and doc comment.

pub mod ast_engine;
pub mod batch;
pub mod error;
pub mod processing;
pub mod types;

pub use ast_engine::{extract, Extractor, LanguageId, LanguageProfile};
pub use batch::{BatchConfig, BatchError, BatchIndexer, BatchResult};
pub use error::{CollectingSink, Diagnostic, DiagnosticKind, DiagnosticSink, ExtractError, TracingSink};
pub use types::{
    Declaration, DeclarationKind, DocumentationBlock, ExtractionResult, FileIndex, IndexerConfig,
    RepositoryIndex, TypeDeclaration,
};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ast_engine::{extract, Extractor, LanguageId};
    pub use crate::batch::*;
    pub use crate::error::*;
    pub use crate::types::*;
}

/// Default path of the JSON index
pub const DEFAULT_OUTPUT_PATH: &str = "indexed_repo.json";

/// Default number of files extracted concurrently
pub const DEFAULT_MAX_CONCURRENT_FILES: usize = 4;

/// Default maximum size of an indexed file (1MB)
pub const DEFAULT_MAX_FILE_SIZE: usize = 1024 * 1024;
