//! Transport shape of a repository index.
//!
//! The JSON written by the batch driver maps each file path to
//! `{classes, functions, methods}`. Field names are camelCase on the wire and
//! must stay stable for downstream readers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::declaration::{Declaration, DeclarationKind, ExtractionResult, TypeDeclaration};

/// Kind tag carried by every class entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    #[default]
    Class,
}

/// `{name, kind: "class", members}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassEntry {
    pub name: String,
    pub kind: TypeKind,
    pub members: Vec<String>,
}

impl From<&TypeDeclaration> for ClassEntry {
    fn from(declaration: &TypeDeclaration) -> Self {
        Self {
            name: declaration.name.clone(),
            kind: TypeKind::Class,
            members: declaration.members.clone(),
        }
    }
}

/// `{name, kind: "function"|"method", enclosingType, documentation}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationEntry {
    pub name: String,
    pub kind: DeclarationKind,
    pub enclosing_type: Option<String>,
    pub documentation: String,
}

impl From<&Declaration> for DeclarationEntry {
    fn from(declaration: &Declaration) -> Self {
        Self {
            name: declaration.name.clone(),
            kind: declaration.kind(),
            enclosing_type: declaration.enclosing_type.clone(),
            documentation: declaration.documentation.clone(),
        }
    }
}

/// Index entry for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIndex {
    pub classes: Vec<ClassEntry>,
    pub functions: Vec<DeclarationEntry>,
    pub methods: Vec<DeclarationEntry>,
}

impl From<&ExtractionResult> for FileIndex {
    fn from(result: &ExtractionResult) -> Self {
        Self {
            classes: result.types.iter().map(ClassEntry::from).collect(),
            functions: result.functions().map(DeclarationEntry::from).collect(),
            methods: result.methods().map(DeclarationEntry::from).collect(),
        }
    }
}

/// A method whose `enclosingType` is not among its file's classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    pub path: String,
    pub method: String,
    pub enclosing_type: String,
}

/// Ordered map from root-relative path to file entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepositoryIndex {
    files: BTreeMap<String, FileIndex>,
}

impl RepositoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, entry: FileIndex) {
        self.files.insert(path.into(), entry);
    }

    pub fn get(&self, path: &str) -> Option<&FileIndex> {
        self.files.get(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> impl Iterator<Item = (&String, &FileIndex)> {
        self.files.iter()
    }

    /// Methods referring to a type missing from the same file.
    ///
    /// Readers treat these as warnings, never as hard failures.
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let mut dangling = Vec::new();
        for (path, file) in &self.files {
            for method in &file.methods {
                let Some(owner) = &method.enclosing_type else {
                    continue;
                };
                if !file.classes.iter().any(|class| &class.name == owner) {
                    dangling.push(DanglingReference {
                        path: path.clone(),
                        method: method.name.clone(),
                        enclosing_type: owner.clone(),
                    });
                }
            }
        }
        dangling
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
