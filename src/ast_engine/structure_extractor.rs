//! Structure extractor.
//!
//! Produces the declaration inventory for one parsed file:
//!
//! 1. The type pattern runs over the whole tree. Each match's
//!    `class.definition` capture, or else the parent of its `class.name`
//!    capture, is the type node; types are kept in source order.
//! 2. For each type, the declaration pattern runs scoped to the type node and
//!    the first line of each direct member becomes its member listing.
//! 3. The declaration pattern runs once more over the whole tree. Every
//!    declaration gets its full text, nearest enclosing type and doc block.
//!
//! A pattern that fails to compile disables only its own step; the file is
//! still extracted with whatever the remaining patterns find.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};
use tree_sitter::{Language, Node, QueryCursor, Tree};

use crate::ast_engine::ancestry::{AncestryResolver, TypeScope};
use crate::ast_engine::doc_comments::DocCommentResolver;
use crate::ast_engine::languages::{
    self, is_declaration_label, LanguageId, LanguageProfile, CLASS_LABEL, TYPE_DEFINITION_LABEL,
};
use crate::ast_engine::node_arena::NodeArena;
use crate::ast_engine::parser;
use crate::ast_engine::query_runner::{sort_by_position, Capture, QueryRunner};
use crate::error::{
    Diagnostic, DiagnosticKind, DiagnosticSink, ExtractError, PatternKind, Result, TracingSink,
};
use crate::types::{first_line, Declaration, ExtractionResult, TypeDeclaration};

/// Extracts declarations for one language.
///
/// Holds only compiled, read-only queries, so a single extractor can be
/// shared between threads and reused for any number of files.
pub struct Extractor {
    profile: &'static LanguageProfile,
    grammar: Language,
    types: Option<QueryRunner>,
    declarations: Option<QueryRunner>,
    comments: Option<QueryRunner>,
    setup_diagnostics: Vec<Diagnostic>,
    sink: Arc<dyn DiagnosticSink>,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("language", &self.profile.language)
            .field("types", &self.types.is_some())
            .field("declarations", &self.declarations.is_some())
            .field("comments", &self.comments.is_some())
            .finish()
    }
}

impl Extractor {
    /// Build an extractor for a registered language.
    pub fn new(language: LanguageId) -> Result<Self> {
        Ok(Self::from_profile(languages::lookup(language)?))
    }

    /// Build an extractor from a textual language identifier.
    pub fn for_name(name: &str) -> Result<Self> {
        Ok(Self::from_profile(languages::lookup_by_name(name)?))
    }

    /// Compile the profile's patterns. Patterns that fail to compile are
    /// recorded as diagnostics and their step is skipped on every file.
    pub fn from_profile(profile: &'static LanguageProfile) -> Self {
        let grammar = parser::grammar(profile.language);
        let mut setup_diagnostics = Vec::new();

        let mut compile = |kind: PatternKind, pattern: &str| {
            match QueryRunner::compile(&grammar, kind, pattern) {
                Ok(runner) => Some(runner),
                Err(e) => {
                    setup_diagnostics.push(Diagnostic::from(e));
                    None
                }
            }
        };
        let types = compile(PatternKind::Type, profile.type_pattern);
        let declarations = compile(PatternKind::Declaration, profile.declaration_pattern);
        let comments = compile(PatternKind::Comment, profile.comment_pattern);

        debug!(
            language = %profile.language,
            failed_patterns = setup_diagnostics.len(),
            "Compiled extraction queries"
        );

        Self {
            profile,
            grammar,
            types,
            declarations,
            comments,
            setup_diagnostics,
            sink: Arc::new(TracingSink),
        }
    }

    /// Route diagnostics to `sink` instead of the default tracing sink.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn language(&self) -> LanguageId {
        self.profile.language
    }

    pub fn profile(&self) -> &'static LanguageProfile {
        self.profile
    }

    pub fn grammar(&self) -> &Language {
        &self.grammar
    }

    /// Parse `source` and extract its structure.
    ///
    /// Fails only when no tree can be produced.
    pub fn extract(&self, source: &[u8]) -> Result<ExtractionResult> {
        let tree = parser::parse(source, self.profile.language)?;
        Ok(self.extract_tree(&tree, source))
    }

    /// Extract structure from an already-parsed tree of `source`.
    pub fn extract_tree(&self, tree: &Tree, source: &[u8]) -> ExtractionResult {
        let mut pass = ExtractionPass {
            profile: self.profile,
            source,
            arena: NodeArena::new(),
            diagnostics: self.setup_diagnostics.clone(),
        };
        let root = tree.root_node();

        for error in parser::parse_errors(tree) {
            pass.diagnostics
                .push(Diagnostic::new(DiagnosticKind::ParseFailure, error));
        }

        let scopes = match &self.types {
            Some(types) => pass.discover_types(types, root),
            None => Vec::new(),
        };
        let resolver = AncestryResolver::new(&scopes);

        let mut result = ExtractionResult::new(self.profile.language);
        result.types = scopes
            .iter()
            .map(|scope| TypeDeclaration {
                name: scope.name.clone(),
                members: match &self.declarations {
                    Some(declarations) => pass.member_signatures(declarations, scope, &resolver),
                    None => Vec::new(),
                },
                node: scope.handle,
                start_line: scope.node.start_position().row + 1,
                end_line: scope.node.end_position().row + 1,
            })
            .collect();

        if let Some(declarations) = &self.declarations {
            let docs = DocCommentResolver::new(self.profile, self.comments.as_ref(), source);
            result.declarations = pass.collect_declarations(declarations, root, &resolver, &docs);
        }

        for diagnostic in &pass.diagnostics {
            self.sink.report(diagnostic);
        }
        result.diagnostics = pass.diagnostics;

        info!(
            language = %self.profile.language,
            types = result.types.len(),
            declarations = result.declarations.len(),
            diagnostics = result.diagnostics.len(),
            "Extracted file structure"
        );

        result
    }
}

/// Extract `source` written in the language named `language`.
///
/// An unknown language fails before any parsing happens.
pub fn extract(source: &[u8], language: &str) -> Result<ExtractionResult> {
    Extractor::for_name(language)?.extract(source)
}

/// State for extracting a single file.
struct ExtractionPass<'a> {
    profile: &'static LanguageProfile,
    source: &'a [u8],
    arena: NodeArena,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> ExtractionPass<'a> {
    /// Step 1: type scopes in source order.
    fn discover_types<'tree>(
        &mut self,
        types: &QueryRunner,
        root: Node<'tree>,
    ) -> Vec<TypeScope<'tree>> {
        let mut cursor = QueryCursor::new();
        let mut found: Vec<(Node<'tree>, Node<'tree>)> = types
            .run_matches(&mut cursor, root, self.source)
            .filter_map(|captures| {
                let name = captures.iter().find(|c| c.label == CLASS_LABEL)?.node;
                let definition = captures
                    .iter()
                    .find(|c| c.label == TYPE_DEFINITION_LABEL)
                    .map(|c| c.node)
                    .or_else(|| name.parent())?;
                Some((definition, name))
            })
            .collect();
        found.sort_by_key(|(definition, name)| {
            (definition.start_byte(), Reverse(definition.end_byte()), name.start_byte())
        });

        let mut seen = HashSet::new();
        let mut scopes = Vec::new();
        for (type_node, name_node) in found {
            let handle = self.arena.intern(&type_node);
            if !seen.insert(handle) {
                continue;
            }
            let Some(name) = self.text(name_node) else {
                continue;
            };
            debug!(language = %self.profile.language, name, "Found type");
            scopes.push(TypeScope {
                handle,
                name: name.to_string(),
                node: type_node,
            });
        }
        scopes
    }

    /// Step 2: first line of every declaration whose nearest type is `scope`.
    fn member_signatures<'tree>(
        &mut self,
        declarations: &QueryRunner,
        scope: &TypeScope<'tree>,
        resolver: &AncestryResolver<'tree>,
    ) -> Vec<String> {
        let mut cursor = QueryCursor::new();
        let mut captures: Vec<Capture<'_, 'tree>> = declarations
            .run(&mut cursor, scope.node, self.source)
            .filter(|c| is_declaration_label(c.label))
            .collect();
        sort_by_position(&mut captures);

        let mut seen = HashSet::new();
        let mut members = Vec::new();
        for capture in captures {
            let Some(member) = capture.node.parent() else {
                continue;
            };
            let owner = resolver.resolve(member).map(|s| s.handle);
            if owner != Some(scope.handle) || !seen.insert(self.arena.intern(&member)) {
                continue;
            }
            if let Some(text) = self.text(member) {
                members.push(first_line(text).to_string());
            }
        }
        members
    }

    /// Step 3: every declaration in the file, correlated with its type and
    /// documentation.
    fn collect_declarations<'tree>(
        &mut self,
        declarations: &QueryRunner,
        root: Node<'tree>,
        resolver: &AncestryResolver<'tree>,
        docs: &DocCommentResolver<'_>,
    ) -> Vec<Declaration> {
        let mut cursor = QueryCursor::new();
        let mut captures: Vec<Capture<'_, 'tree>> = declarations
            .run(&mut cursor, root, self.source)
            .filter(|c| is_declaration_label(c.label))
            .collect();
        sort_by_position(&mut captures);

        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for capture in captures {
            let Some(node) = capture.node.parent() else {
                continue;
            };
            let handle = self.arena.intern(&node);
            if !seen.insert(handle) {
                continue;
            }
            let Some(name) = self.text(capture.node).map(str::to_string) else {
                continue;
            };
            let source = self.text(node).map(str::to_string).unwrap_or_default();
            let enclosing_type = resolver.resolve(node).map(|scope| scope.name.clone());
            let documentation = docs.resolve(node, &mut self.diagnostics).text();

            found.push(Declaration {
                name,
                node: handle,
                source,
                documentation,
                enclosing_type,
                start_line: node.start_position().row + 1,
                end_line: node.end_position().row + 1,
            });
        }
        found
    }

    /// Node text, or `None` with a decode diagnostic.
    fn text(&mut self, node: Node) -> Option<&'a str> {
        match node.utf8_text(self.source) {
            Ok(text) => Some(text),
            Err(_) => {
                self.diagnostics.push(Diagnostic::from(ExtractError::DecodeFailure {
                    start: node.start_byte(),
                    end: node.end_byte(),
                }));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollectingSink;
    use crate::types::DeclarationKind;
    use pretty_assertions::assert_eq;

    const PYTHON_SAMPLE: &str = r#""""A module-level docstring."""
class MyClass:
    """This is the class docstring."""
    def __init__(self, name):
        """The constructor docstring."""
        self.name = name
    def greet(self):
        """A method docstring."""
        print(f"Hello, {self.name}")
def standalone_function(x):
    """A standalone function docstring."""
    return x * 2
"#;

    fn summary(result: &ExtractionResult) -> Vec<(String, Option<String>, String)> {
        result
            .declarations
            .iter()
            .map(|d| (d.name.clone(), d.enclosing_type.clone(), d.documentation.clone()))
            .collect()
    }

    fn assert_referential_integrity(result: &ExtractionResult) {
        for declaration in &result.declarations {
            if let Some(owner) = &declaration.enclosing_type {
                assert!(
                    result.type_named(owner).is_some(),
                    "{} references missing type {}",
                    declaration.name,
                    owner
                );
            }
        }
    }

    #[test]
    fn test_python_end_to_end() {
        let result = extract(PYTHON_SAMPLE.as_bytes(), "python").unwrap();

        assert_eq!(result.types.len(), 1);
        let class = &result.types[0];
        assert_eq!(class.name, "MyClass");
        assert_eq!(
            class.members,
            vec!["def __init__(self, name):", "def greet(self):"]
        );

        assert_eq!(
            summary(&result),
            vec![
                (
                    "__init__".to_string(),
                    Some("MyClass".to_string()),
                    "The constructor docstring.".to_string()
                ),
                (
                    "greet".to_string(),
                    Some("MyClass".to_string()),
                    "A method docstring.".to_string()
                ),
                (
                    "standalone_function".to_string(),
                    None,
                    "A standalone function docstring.".to_string()
                ),
            ]
        );
        assert_eq!(result.functions().count(), 1);
        assert_eq!(result.methods().count(), 2);
        assert!(result.diagnostics.is_empty());
        assert_referential_integrity(&result);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = Extractor::new(LanguageId::Python).unwrap();
        let first = extractor.extract(PYTHON_SAMPLE.as_bytes()).unwrap();
        let _other = extractor.extract(b"def unrelated():\n    pass\n").unwrap();
        let second = extractor.extract(PYTHON_SAMPLE.as_bytes()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unsupported_language() {
        let err = extract(b"IDENTIFICATION DIVISION.", "cobol").unwrap_err();
        assert_eq!(err, ExtractError::UnsupportedLanguage("cobol".to_string()));
    }

    #[test]
    fn test_java_members_and_docs() {
        let source = r#"
public class Greeter {
    /** Creates a greeter. */
    public Greeter() {}

    // Says hello.
    // Politely.
    public String greet(String name) {
        return "Hello " + name;
    }

    public String greet() {
        return greet("world");
    }
}
"#;
        let result = extract(source.as_bytes(), "java").unwrap();

        assert_eq!(result.types.len(), 1);
        assert_eq!(result.types[0].members.len(), 3);
        assert_eq!(
            summary(&result),
            vec![
                (
                    "Greeter".to_string(),
                    Some("Greeter".to_string()),
                    "/** Creates a greeter. */".to_string()
                ),
                (
                    "greet".to_string(),
                    Some("Greeter".to_string()),
                    "// Says hello.\n// Politely.".to_string()
                ),
                ("greet".to_string(), Some("Greeter".to_string()), String::new()),
            ]
        );
        // Overloads stay distinct by node identity.
        assert_ne!(result.declarations[1].node, result.declarations[2].node);
    }

    #[test]
    fn test_nested_types_resolve_to_innermost() {
        let source = r#"
class Outer {
    void outerMethod() {}

    static class Inner {
        void innerMethod() {}
    }
}
"#;
        let result = extract(source.as_bytes(), "java").unwrap();

        let names: Vec<_> = result.types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Outer", "Inner"]);
        assert_eq!(result.types[0].members, vec!["void outerMethod() {}"]);
        assert_eq!(result.types[1].members, vec!["void innerMethod() {}"]);

        let inner = result.declaration_named("innerMethod").unwrap();
        assert_eq!(inner.enclosing_type.as_deref(), Some("Inner"));
        assert_referential_integrity(&result);
    }

    #[test]
    fn test_member_count_matches_attributed_methods() {
        let source = r#"
class Shape:
    def area(self):
        pass

    def perimeter(self):
        pass

    def scale(self, factor):
        pass
"#;
        let result = extract(source.as_bytes(), "python").unwrap();
        let shape = result.type_named("Shape").unwrap();
        let attributed = result
            .methods()
            .filter(|m| m.enclosing_type.as_deref() == Some("Shape"))
            .count();
        assert_eq!(shape.members.len(), 3);
        assert_eq!(attributed, 3);
    }

    #[test]
    fn test_rust_impl_methods() {
        let source = r#"
/// A point in space.
struct Point {
    x: f64,
}

impl Point {
    /// Creates a point.
    fn new(x: f64) -> Self {
        Self { x }
    }
}

fn helper() {}
"#;
        let result = extract(source.as_bytes(), "rust").unwrap();

        let names: Vec<_> = result.types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Point", "Point"]);
        assert!(result.types[0].members.is_empty());
        assert_eq!(result.types[1].members, vec!["fn new(x: f64) -> Self {"]);

        let new = result.declaration_named("new").unwrap();
        assert_eq!(new.kind(), DeclarationKind::Method);
        assert_eq!(new.documentation, "/// Creates a point.");
        assert_eq!(
            result.declaration_named("helper").unwrap().kind(),
            DeclarationKind::Function
        );
    }

    #[test]
    fn test_rust_generic_and_trait_impls() {
        let source = r#"
struct W<T>(T);

impl<T> W<T> {
    /// New.
    fn new(value: T) -> Self {
        W(value)
    }
}

impl std::fmt::Debug for W<u8> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Ok(())
    }
}

impl Default for shapes::Unit {
    fn default() -> Self {
        shapes::Unit
    }
}
"#;
        let result = extract(source.as_bytes(), "rust").unwrap();

        let names: Vec<_> = result.types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["W", "W", "W", "Unit"]);
        assert_eq!(
            summary(&result),
            vec![
                ("new".to_string(), Some("W".to_string()), "/// New.".to_string()),
                ("fmt".to_string(), Some("W".to_string()), String::new()),
                ("default".to_string(), Some("Unit".to_string()), String::new()),
            ]
        );
        assert_eq!(result.methods().count(), 3);
        assert!(result.diagnostics.is_empty());
        assert_referential_integrity(&result);
    }

    #[test]
    fn test_typescript_interfaces_and_classes() {
        let source = r#"
/** Shapes with an area. */
interface Shape {
  // Area in square units.
  area(): number;
}

export class Square implements Shape {
  constructor(private side: number) {}

  /** Area of the square. */
  area(): number {
    return this.side * this.side;
  }
}

function unit(): Square {
  return new Square(1);
}
"#;
        let result = extract(source.as_bytes(), "typescript").unwrap();

        let names: Vec<_> = result.types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Shape", "Square"]);
        assert_eq!(result.types[0].members.len(), 1);
        assert_eq!(result.types[1].members.len(), 2);
        assert_eq!(
            summary(&result),
            vec![
                (
                    "area".to_string(),
                    Some("Shape".to_string()),
                    "// Area in square units.".to_string()
                ),
                ("constructor".to_string(), Some("Square".to_string()), String::new()),
                (
                    "area".to_string(),
                    Some("Square".to_string()),
                    "/** Area of the square. */".to_string()
                ),
                ("unit".to_string(), None, String::new()),
            ]
        );
        assert!(result.diagnostics.is_empty());
        assert_referential_integrity(&result);
    }

    #[test]
    fn test_go_types_and_functions() {
        let source = r#"package shapes

// Square is a shape.
type Square struct {
	Side float64
}

// Area returns the area.
func (s Square) Area() float64 {
	return s.Side * s.Side
}

// NewSquare builds a square.
// It never fails.
func NewSquare(side float64) Square {
	return Square{Side: side}
}
"#;
        let result = extract(source.as_bytes(), "go").unwrap();

        assert_eq!(result.types.len(), 1);
        assert_eq!(result.types[0].name, "Square");
        assert!(result.types[0].members.is_empty());
        // Receivers live outside the type_spec, so methods stay unattributed.
        assert_eq!(
            summary(&result),
            vec![
                ("Area".to_string(), None, "// Area returns the area.".to_string()),
                (
                    "NewSquare".to_string(),
                    None,
                    "// NewSquare builds a square.\n// It never fails.".to_string()
                ),
            ]
        );
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_ruby_modules_classes_and_methods() {
        let source = r#"
# Greets people.
module Greeting
  class Greeter
    # Builds a greeter.
    def initialize(name)
      @name = name
    end

    # Says hello.
    def greet
      "Hello #{@name}"
    end

    def self.create(name)
      new(name)
    end
  end
end
"#;
        let result = extract(source.as_bytes(), "ruby").unwrap();

        let names: Vec<_> = result.types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Greeting", "Greeter"]);
        assert!(result.types[0].members.is_empty());
        assert_eq!(
            result.types[1].members,
            vec!["def initialize(name)", "def greet", "def self.create(name)"]
        );
        assert_eq!(
            summary(&result),
            vec![
                (
                    "initialize".to_string(),
                    Some("Greeter".to_string()),
                    "# Builds a greeter.".to_string()
                ),
                (
                    "greet".to_string(),
                    Some("Greeter".to_string()),
                    "# Says hello.".to_string()
                ),
                ("create".to_string(), Some("Greeter".to_string()), String::new()),
            ]
        );
        assert!(result.diagnostics.is_empty());
        assert_referential_integrity(&result);
    }

    #[test]
    fn test_python_comment_above_first_method() {
        let source = "class A:\n    # Doc first.\n    def first(self):\n        pass\n";
        let result = extract(source.as_bytes(), "python").unwrap();
        assert_eq!(
            summary(&result),
            vec![("first".to_string(), Some("A".to_string()), "# Doc first.".to_string())]
        );
    }

    #[test]
    fn test_javascript_classes_and_functions() {
        let source = r#"
class Counter {
  // Bumps the count.
  increment() {
    this.count += 1;
  }
}

/** Builds a counter. */
function makeCounter() {
  return new Counter();
}
"#;
        let result = extract(source.as_bytes(), "javascript").unwrap();

        assert_eq!(result.types[0].name, "Counter");
        assert_eq!(result.types[0].members, vec!["increment() {"]);
        assert_eq!(
            summary(&result),
            vec![
                (
                    "increment".to_string(),
                    Some("Counter".to_string()),
                    "// Bumps the count.".to_string()
                ),
                (
                    "makeCounter".to_string(),
                    None,
                    "/** Builds a counter. */".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_declaration_source_text() {
        let result = extract(b"def double(x):\n    return x * 2\n", "python").unwrap();
        let double = &result.declarations[0];
        assert_eq!(double.source, "def double(x):\n    return x * 2");
        assert_eq!(double.signature(), "def double(x):");
        assert_eq!((double.start_line, double.end_line), (1, 2));
    }

    #[test]
    fn test_broken_comment_pattern_keeps_other_kinds() {
        static BROKEN: LanguageProfile = LanguageProfile {
            language: LanguageId::Python,
            type_pattern: "(class_definition name: (identifier) @class.name)",
            declaration_pattern: "(function_definition name: (identifier) @function.name)",
            comment_pattern: "(not_a_python_node) @comment",
            transparent_kinds: &["expression_statement"],
            transparent_child: Some("string"),
            wrapper_kinds: &[],
            docstring_field: Some("body"),
        };
        let sink = CollectingSink::new();
        let extractor = Extractor::from_profile(&BROKEN).with_sink(sink.clone());

        let result = extractor.extract(PYTHON_SAMPLE.as_bytes()).unwrap();

        assert_eq!(result.types.len(), 1);
        assert_eq!(result.declarations.len(), 3);
        assert!(result.declarations.iter().all(|d| d.documentation.is_empty()));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].kind, DiagnosticKind::QueryFailure);
        assert_eq!(sink.diagnostics(), result.diagnostics);
    }

    #[test]
    fn test_syntax_errors_are_diagnostics() {
        let source = "def ok():\n    pass\n\ndef broken(:\n    pass\n";
        let result = extract(source.as_bytes(), "python").unwrap();

        assert!(result.declaration_named("ok").is_some());
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::ParseFailure));
    }

    #[test]
    fn test_extractor_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Extractor>();
    }
}
