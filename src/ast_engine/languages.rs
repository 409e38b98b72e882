//! Language profile registry.
//!
//! Each supported language maps to a [`LanguageProfile`]: the three
//! tree-sitter query patterns used for extraction plus a few node-kind lists
//! that steer the doc-comment walk. Profiles are plain data; adding a
//! language means adding a row to [`PROFILES`], never touching the extractor.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::error::{ExtractError, Result};

/// Capture label for type names.
pub const CLASS_LABEL: &str = "class.name";
/// Optional capture label for the node that defines a type. Without it the
/// parent of the `class.name` capture is used.
pub const TYPE_DEFINITION_LABEL: &str = "class.definition";
/// Capture label for method names.
pub const METHOD_LABEL: &str = "method.name";
/// Capture label for free function names.
pub const FUNCTION_LABEL: &str = "function.name";
/// Capture label for documentation fragments.
pub const COMMENT_LABEL: &str = "comment";

/// Labels that mark a declaration name in a declaration pattern.
pub const DECLARATION_LABELS: &[&str] = &[METHOD_LABEL, FUNCTION_LABEL];

pub fn is_declaration_label(label: &str) -> bool {
    DECLARATION_LABELS.iter().any(|known| *known == label)
}

/// Languages with a registered extraction profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageId {
    Java,
    Python,
    Rust,
    JavaScript,
    TypeScript,
    Go,
    Ruby,
}

impl LanguageId {
    /// Every language with a profile, in registry order.
    pub fn all() -> &'static [LanguageId] {
        &[
            LanguageId::Java,
            LanguageId::Python,
            LanguageId::Rust,
            LanguageId::JavaScript,
            LanguageId::TypeScript,
            LanguageId::Go,
            LanguageId::Ruby,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageId::Java => "java",
            LanguageId::Python => "python",
            LanguageId::Rust => "rust",
            LanguageId::JavaScript => "javascript",
            LanguageId::TypeScript => "typescript",
            LanguageId::Go => "go",
            LanguageId::Ruby => "ruby",
        }
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageId {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "java" => Ok(LanguageId::Java),
            "python" | "py" => Ok(LanguageId::Python),
            "rust" | "rs" => Ok(LanguageId::Rust),
            "javascript" | "js" => Ok(LanguageId::JavaScript),
            "typescript" | "ts" => Ok(LanguageId::TypeScript),
            "go" | "golang" => Ok(LanguageId::Go),
            "ruby" | "rb" => Ok(LanguageId::Ruby),
            _ => Err(ExtractError::UnsupportedLanguage(s.to_string())),
        }
    }
}

/// The structural patterns and doc-walk hints for one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageProfile {
    pub language: LanguageId,
    /// Captures type names with [`CLASS_LABEL`].
    pub type_pattern: &'static str,
    /// Captures function/method names with [`METHOD_LABEL`] or [`FUNCTION_LABEL`].
    pub declaration_pattern: &'static str,
    /// Captures documentation fragments with [`COMMENT_LABEL`].
    pub comment_pattern: &'static str,
    /// Sibling kinds the doc walk steps over when they carry no comment.
    pub transparent_kinds: &'static [&'static str],
    /// When set, a transparent node must wrap exactly one named child of
    /// this kind (a bare string statement, not any expression).
    pub transparent_child: Option<&'static str>,
    /// Parent kinds that wrap a declaration (decorators, exports); the doc
    /// walk starts before the wrapper.
    pub wrapper_kinds: &'static [&'static str],
    /// Body field whose leading statement may hold a docstring.
    pub docstring_field: Option<&'static str>,
}

impl LanguageProfile {
    /// Whether the doc walk may step over `node`.
    pub fn is_transparent(&self, node: Node) -> bool {
        if !self.transparent_kinds.contains(&node.kind()) {
            return false;
        }
        match self.transparent_child {
            Some(kind) => {
                node.named_child_count() == 1
                    && node.named_child(0).is_some_and(|child| child.kind() == kind)
            }
            None => true,
        }
    }

    pub fn is_wrapper(&self, kind: &str) -> bool {
        self.wrapper_kinds.contains(&kind)
    }
}

const JAVA: LanguageProfile = LanguageProfile {
    language: LanguageId::Java,
    type_pattern: r#"
        [
            (class_declaration name: (identifier) @class.name)
            (interface_declaration name: (identifier) @class.name)
            (enum_declaration name: (identifier) @class.name)
            (record_declaration name: (identifier) @class.name)
        ]
    "#,
    declaration_pattern: r#"
        [
            (method_declaration name: (identifier) @method.name)
            (constructor_declaration name: (identifier) @method.name)
        ]
    "#,
    comment_pattern: r#"
        [
            (block_comment) @comment
            (line_comment) @comment
        ]
    "#,
    transparent_kinds: &[],
    transparent_child: None,
    wrapper_kinds: &[],
    docstring_field: None,
};

const PYTHON: LanguageProfile = LanguageProfile {
    language: LanguageId::Python,
    type_pattern: r#"
        (class_definition name: (identifier) @class.name)
    "#,
    declaration_pattern: r#"
        (function_definition name: (identifier) @function.name)
    "#,
    comment_pattern: r#"
        [
            (comment) @comment
            (expression_statement (string (string_content) @comment))
        ]
    "#,
    transparent_kinds: &["expression_statement"],
    transparent_child: Some("string"),
    wrapper_kinds: &["decorated_definition"],
    docstring_field: Some("body"),
};

const RUST: LanguageProfile = LanguageProfile {
    language: LanguageId::Rust,
    type_pattern: r#"
        [
            (struct_item name: (type_identifier) @class.name)
            (enum_item name: (type_identifier) @class.name)
            (trait_item name: (type_identifier) @class.name)
            (impl_item type: (type_identifier) @class.name) @class.definition
            (impl_item
                type: (generic_type type: (type_identifier) @class.name)) @class.definition
            (impl_item
                type: (scoped_type_identifier name: (type_identifier) @class.name)) @class.definition
            (impl_item
                type: (generic_type
                    type: (scoped_type_identifier name: (type_identifier) @class.name))) @class.definition
        ]
    "#,
    declaration_pattern: r#"
        [
            (function_item name: (identifier) @function.name)
            (function_signature_item name: (identifier) @function.name)
        ]
    "#,
    comment_pattern: r#"
        [
            (line_comment) @comment
            (block_comment) @comment
        ]
    "#,
    transparent_kinds: &["attribute_item"],
    transparent_child: None,
    wrapper_kinds: &[],
    docstring_field: None,
};

const JAVASCRIPT: LanguageProfile = LanguageProfile {
    language: LanguageId::JavaScript,
    type_pattern: r#"
        (class_declaration name: (identifier) @class.name)
    "#,
    declaration_pattern: r#"
        [
            (function_declaration name: (identifier) @function.name)
            (generator_function_declaration name: (identifier) @function.name)
            (method_definition name: (property_identifier) @method.name)
        ]
    "#,
    comment_pattern: r#"
        (comment) @comment
    "#,
    transparent_kinds: &[],
    transparent_child: None,
    wrapper_kinds: &["export_statement"],
    docstring_field: None,
};

const TYPESCRIPT: LanguageProfile = LanguageProfile {
    language: LanguageId::TypeScript,
    type_pattern: r#"
        [
            (class_declaration name: (type_identifier) @class.name)
            (abstract_class_declaration name: (type_identifier) @class.name)
            (interface_declaration name: (type_identifier) @class.name)
        ]
    "#,
    declaration_pattern: r#"
        [
            (function_declaration name: (identifier) @function.name)
            (method_definition name: (property_identifier) @method.name)
            (method_signature name: (property_identifier) @method.name)
            (abstract_method_signature name: (property_identifier) @method.name)
        ]
    "#,
    comment_pattern: r#"
        (comment) @comment
    "#,
    transparent_kinds: &[],
    transparent_child: None,
    wrapper_kinds: &["export_statement"],
    docstring_field: None,
};

// Go methods declare their receiver outside the `type_spec` subtree, so no
// type encloses them syntactically: they come out as free functions.
const GO: LanguageProfile = LanguageProfile {
    language: LanguageId::Go,
    type_pattern: r#"
        (type_spec name: (type_identifier) @class.name)
    "#,
    declaration_pattern: r#"
        [
            (function_declaration name: (identifier) @function.name)
            (method_declaration name: (field_identifier) @method.name)
        ]
    "#,
    comment_pattern: r#"
        (comment) @comment
    "#,
    transparent_kinds: &[],
    transparent_child: None,
    wrapper_kinds: &[],
    docstring_field: None,
};

const RUBY: LanguageProfile = LanguageProfile {
    language: LanguageId::Ruby,
    type_pattern: r#"
        [
            (class name: (_) @class.name)
            (module name: (_) @class.name)
        ]
    "#,
    declaration_pattern: r#"
        [
            (method name: (_) @method.name)
            (singleton_method name: (_) @method.name)
        ]
    "#,
    comment_pattern: r#"
        (comment) @comment
    "#,
    transparent_kinds: &[],
    transparent_child: None,
    wrapper_kinds: &[],
    docstring_field: None,
};

lazy_static! {
    /// The static profile table. Read-only after first access.
    static ref PROFILES: HashMap<LanguageId, LanguageProfile> =
        [JAVA, PYTHON, RUST, JAVASCRIPT, TYPESCRIPT, GO, RUBY]
            .into_iter()
            .map(|profile| (profile.language, profile))
            .collect();
}

/// Look up the profile registered for `language`.
pub fn lookup(language: LanguageId) -> Result<&'static LanguageProfile> {
    PROFILES
        .get(&language)
        .ok_or_else(|| ExtractError::UnsupportedLanguage(language.to_string()))
}

/// Look up a profile by its textual identifier (`"python"`, `"rs"`, ...).
pub fn lookup_by_name(name: &str) -> Result<&'static LanguageProfile> {
    lookup(name.parse()?)
}
