//! Core types for the indexer.

mod config;
mod declaration;
mod index;

pub use config::IndexerConfig;
pub use declaration::{
    first_line, Declaration, DeclarationKind, DocumentationBlock, ExtractionResult,
    TypeDeclaration,
};
pub use index::{ClassEntry, DanglingReference, DeclarationEntry, FileIndex, RepositoryIndex, TypeKind};
