//! AST engine for query-driven structure extraction.
//!
//! This module provides:
//! - Static per-language query profiles
//! - Tree-sitter parsing and a thin query adapter
//! - Ancestry and doc-comment resolution
//! - The structure extractor that ties them together

pub mod ancestry;
pub mod doc_comments;
pub mod languages;
pub mod node_arena;
pub mod parser;
pub mod query_runner;
pub mod structure_extractor;

pub use ancestry::{is_descendant, resolve_enclosing_type, AncestryResolver, TypeScope};
pub use doc_comments::DocCommentResolver;
pub use languages::{lookup, lookup_by_name, LanguageId, LanguageProfile};
pub use node_arena::{NodeArena, NodeHandle};
pub use query_runner::{Capture, QueryRunner};
pub use structure_extractor::{extract, Extractor};
