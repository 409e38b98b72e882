//! Declaration inventory produced by one extraction pass.

use serde::{Deserialize, Serialize};

use crate::ast_engine::languages::LanguageId;
use crate::ast_engine::node_arena::NodeHandle;
use crate::error::Diagnostic;

/// Contiguous documentation attached to a declaration.
///
/// Fragments are kept in source order; [`DocumentationBlock::text`] joins
/// them with newlines and trims the ends only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentationBlock {
    fragments: Vec<String>,
}

impl DocumentationBlock {
    pub fn new(fragments: Vec<String>) -> Self {
        Self { fragments }
    }

    /// Build from fragments collected while walking backwards.
    pub fn from_reversed(mut fragments: Vec<String>) -> Self {
        fragments.reverse();
        Self { fragments }
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }

    pub fn text(&self) -> String {
        self.fragments.join("\n").trim().to_string()
    }
}

/// Whether a declaration is a free function or a member of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Function,
    Method,
}

impl DeclarationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Function => "function",
            DeclarationKind::Method => "method",
        }
    }
}

/// A type (class, struct, interface, ...) found by the type pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDeclaration {
    pub name: String,
    /// First line of each member declaration, in source order.
    pub members: Vec<String>,
    pub node: NodeHandle,
    pub start_line: usize,
    pub end_line: usize,
}

/// A function or method found by the declaration pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub name: String,
    pub node: NodeHandle,
    /// Full declaration text; empty if it could not be decoded.
    pub source: String,
    pub documentation: String,
    /// Name of the nearest enclosing type; `None` for free functions.
    pub enclosing_type: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
}

impl Declaration {
    pub fn kind(&self) -> DeclarationKind {
        if self.enclosing_type.is_some() {
            DeclarationKind::Method
        } else {
            DeclarationKind::Function
        }
    }

    /// First line of the declaration text.
    pub fn signature(&self) -> &str {
        first_line(&self.source)
    }
}

/// Everything extracted from a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    pub language: LanguageId,
    pub types: Vec<TypeDeclaration>,
    pub declarations: Vec<Declaration>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl ExtractionResult {
    pub fn new(language: LanguageId) -> Self {
        Self {
            language,
            types: Vec::new(),
            declarations: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Declarations without an enclosing type.
    pub fn functions(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations
            .iter()
            .filter(|d| d.kind() == DeclarationKind::Function)
    }

    /// Declarations attributed to a type.
    pub fn methods(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations
            .iter()
            .filter(|d| d.kind() == DeclarationKind::Method)
    }

    pub fn type_named(&self, name: &str) -> Option<&TypeDeclaration> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn declaration_named(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name == name)
    }

    /// Declarations whose enclosing type is missing from `types`.
    pub fn dangling_references(&self) -> Vec<&Declaration> {
        self.declarations
            .iter()
            .filter(|d| match &d.enclosing_type {
                Some(name) => self.type_named(name).is_none(),
                None => false,
            })
            .collect()
    }
}

/// First line of `text`, without a trailing carriage return.
pub fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}
