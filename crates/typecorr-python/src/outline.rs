//! Source outlines of Python modules.
//!
//! An outline keeps only what type correlation needs from a module: class
//! and function definitions (with docstrings, parameters and base classes)
//! and `from ... import ...` statements. Definitions nested in `if`, `try`,
//! `with` and loop blocks are lifted into the enclosing body, since they do
//! not change symbol addresses.
//!
//! Parsing uses tree-sitter-python. A tree containing error or missing nodes
//! is rejected with the position of the first such node.

use thiserror::Error;
use tree_sitter::{Node, Parser};

/// Error type for outline parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutlineError {
    /// The grammar could not be loaded.
    #[error("failed to load Python grammar: {0}")]
    Language(String),

    /// The parser produced no tree.
    #[error("parser produced no tree")]
    NoTree,

    /// The source contains a syntax error.
    #[error("syntax error at line {line}, column {column}")]
    Syntax { line: usize, column: usize },
}

/// Result type for outline parsing.
pub type OutlineResult<T> = Result<T, OutlineError>;

/// Outline of one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleOutline {
    pub docstring: Option<String>,
    pub body: Vec<Definition>,
}

impl ModuleOutline {
    /// Top-level classes and functions, in source order.
    pub fn definitions(&self) -> impl Iterator<Item = &Definition> {
        self.body
            .iter()
            .filter(|d| !matches!(d, Definition::ImportFrom(_)))
    }

    /// Top-level `from ... import ...` statements.
    pub fn imports(&self) -> impl Iterator<Item = &ImportFrom> {
        self.body.iter().filter_map(|d| match d {
            Definition::ImportFrom(i) => Some(i),
            _ => None,
        })
    }
}

/// A definition-level statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Definition {
    Class(ClassDef),
    Function(FunctionDef),
    ImportFrom(ImportFrom),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDef {
    pub name: String,
    /// Base class expressions as written (`BaseEstimator`, `base.Mixin`).
    pub bases: Vec<String>,
    pub docstring: Option<String>,
    pub body: Vec<Definition>,
    /// 1-based line of the `class` keyword.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub docstring: Option<String>,
    pub body: Vec<Definition>,
    /// 1-based line of the `def` keyword.
    pub line: usize,
}

/// Kind of a function parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Positional or keyword parameter.
    Regular,
    /// `*args`
    VarPositional,
    /// `**kwargs`
    VarKeyword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Bare name, without `*` / `**`.
    pub name: String,
    pub kind: ParamKind,
}

/// `from <module> import <names>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFrom {
    /// Dotted module path without leading dots (empty for `from . import x`).
    pub module: String,
    /// Number of leading dots.
    pub level: usize,
    pub names: Vec<ImportedName>,
    /// `from x import *`
    pub wildcard: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedName {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportedName {
    /// The name bound in the importing module.
    pub fn bound_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Parse Python source into a module outline.
pub fn parse_outline(source: &str) -> OutlineResult<ModuleOutline> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| OutlineError::Language(e.to_string()))?;
    let tree = parser.parse(source, None).ok_or(OutlineError::NoTree)?;
    let root = tree.root_node();

    if root.has_error() {
        let (line, column) = first_error(root)
            .map(|n| (n.start_position().row + 1, n.start_position().column + 1))
            .unwrap_or((1, 1));
        return Err(OutlineError::Syntax { line, column });
    }

    let mut body = Vec::new();
    collect_definitions(root, source, &mut body);
    Ok(ModuleOutline {
        docstring: block_docstring(root, source),
        body,
    })
}

/// Get text for a tree-sitter node.
fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.has_error())
        .find_map(first_error)
}

/// Statement kinds whose nested blocks are searched for definitions.
const TRANSPARENT_KINDS: &[&str] = &[
    "block",
    "if_statement",
    "elif_clause",
    "else_clause",
    "try_statement",
    "except_clause",
    "except_group_clause",
    "finally_clause",
    "with_statement",
    "for_statement",
    "while_statement",
    "match_statement",
    "case_clause",
];

fn collect_definitions(node: Node<'_>, source: &str, out: &mut Vec<Definition>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "class_definition" => out.push(Definition::Class(parse_class(child, source))),
            "function_definition" => out.push(Definition::Function(parse_function(child, source))),
            "decorated_definition" => {
                if let Some(def) = child.child_by_field_name("definition") {
                    match def.kind() {
                        "class_definition" => out.push(Definition::Class(parse_class(def, source))),
                        "function_definition" => {
                            out.push(Definition::Function(parse_function(def, source)))
                        }
                        _ => {}
                    }
                }
            }
            "import_from_statement" => {
                if let Some(import) = parse_import_from(child, source) {
                    out.push(Definition::ImportFrom(import));
                }
            }
            kind if TRANSPARENT_KINDS.contains(&kind) => collect_definitions(child, source, out),
            _ => {}
        }
    }
}

fn field_text(node: Node<'_>, field: &str, source: &str) -> String {
    node.child_by_field_name(field)
        .map(|n| node_text(n, source).to_string())
        .unwrap_or_default()
}

fn parse_class(node: Node<'_>, source: &str) -> ClassDef {
    let mut bases = Vec::new();
    if let Some(args) = node.child_by_field_name("superclasses") {
        let mut cursor = args.walk();
        for arg in args.named_children(&mut cursor) {
            if matches!(arg.kind(), "identifier" | "attribute") {
                bases.push(node_text(arg, source).to_string());
            }
        }
    }

    let mut body = Vec::new();
    let body_node = node.child_by_field_name("body");
    if let Some(block) = body_node {
        collect_definitions(block, source, &mut body);
    }

    ClassDef {
        name: field_text(node, "name", source),
        bases,
        docstring: body_node.and_then(|b| block_docstring(b, source)),
        body,
        line: node.start_position().row + 1,
    }
}

fn parse_function(node: Node<'_>, source: &str) -> FunctionDef {
    let params = node
        .child_by_field_name("parameters")
        .map(|p| parse_params(p, source))
        .unwrap_or_default();

    let mut body = Vec::new();
    let body_node = node.child_by_field_name("body");
    if let Some(block) = body_node {
        collect_definitions(block, source, &mut body);
    }

    FunctionDef {
        name: field_text(node, "name", source),
        params,
        docstring: body_node.and_then(|b| block_docstring(b, source)),
        body,
        line: node.start_position().row + 1,
    }
}

fn parse_params(node: Node<'_>, source: &str) -> Vec<Param> {
    let mut params = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        let param = match child.kind() {
            "identifier" => Some(regular(node_text(child, source))),
            "default_parameter" | "typed_default_parameter" => child
                .child_by_field_name("name")
                .map(|n| regular(node_text(n, source))),
            "typed_parameter" => child.named_child(0).and_then(|n| splat_or_name(n, source)),
            "list_splat_pattern" | "dictionary_splat_pattern" => splat_or_name(child, source),
            _ => None,
        };
        params.extend(param);
    }
    params
}

fn regular(name: &str) -> Param {
    Param {
        name: name.to_string(),
        kind: ParamKind::Regular,
    }
}

fn splat_or_name(node: Node<'_>, source: &str) -> Option<Param> {
    let kind = match node.kind() {
        "identifier" => return Some(regular(node_text(node, source))),
        "list_splat_pattern" => ParamKind::VarPositional,
        "dictionary_splat_pattern" => ParamKind::VarKeyword,
        _ => return None,
    };
    let name = node.named_child(0).map(|n| node_text(n, source))?;
    Some(Param {
        name: name.to_string(),
        kind,
    })
}

fn parse_import_from(node: Node<'_>, source: &str) -> Option<ImportFrom> {
    let module_node = node.child_by_field_name("module_name")?;
    let text = node_text(module_node, source);
    let level = text.chars().take_while(|c| *c == '.').count();
    let module = text[level..].trim().to_string();

    let mut names = Vec::new();
    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        match name.kind() {
            "aliased_import" => names.push(ImportedName {
                name: field_text(name, "name", source),
                alias: name
                    .child_by_field_name("alias")
                    .map(|a| node_text(a, source).to_string()),
            }),
            _ => names.push(ImportedName {
                name: node_text(name, source).to_string(),
                alias: None,
            }),
        }
    }

    let mut cursor = node.walk();
    let wildcard = node
        .named_children(&mut cursor)
        .any(|c| c.kind() == "wildcard_import");

    Some(ImportFrom {
        module,
        level,
        names,
        wildcard,
    })
}

/// The docstring of a module or block: a leading string expression.
fn block_docstring(node: Node<'_>, source: &str) -> Option<String> {
    let mut cursor = node.walk();
    let first = node
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment")?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let expr = first.named_child(0)?;
    match expr.kind() {
        "string" => Some(decode_string(node_text(expr, source))),
        "concatenated_string" => {
            let mut cursor = expr.walk();
            let parts: Vec<String> = expr
                .named_children(&mut cursor)
                .filter(|c| c.kind() == "string")
                .map(|c| decode_string(node_text(c, source)))
                .collect();
            Some(parts.concat())
        }
        _ => None,
    }
}

/// Decode a Python string literal's source text.
///
/// Handles prefixes, single and triple quotes, and the common escapes of
/// non-raw strings.
pub fn decode_string(literal: &str) -> String {
    let prefix_len = literal
        .find(|c: char| c == '\'' || c == '"')
        .unwrap_or(0);
    let (prefix, quoted) = literal.split_at(prefix_len);
    let raw = prefix.contains(['r', 'R']);

    let inner = ["\"\"\"", "'''", "\"", "'"]
        .iter()
        .find_map(|q| {
            quoted
                .strip_prefix(q)
                .and_then(|s| s.strip_suffix(q))
                .filter(|_| quoted.len() >= 2 * q.len())
        })
        .unwrap_or(quoted);

    if raw {
        return inner.to_string();
    }

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            // line continuation
            Some('\n') => {}
            _ => {
                out.push('\\');
                continue;
            }
        }
        chars.next();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class<'a>(outline: &'a ModuleOutline, name: &str) -> &'a ClassDef {
        outline
            .body
            .iter()
            .find_map(|d| match d {
                Definition::Class(c) if c.name == name => Some(c),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn parses_module_class_and_method_docstrings() {
        let src = r#"
"""Module doc."""

# a comment
class Scaler(BaseEstimator, base.TransformerMixin):
    """Scale things.

    Parameters
    ----------
    copy : bool, default=True
    """

    def __init__(self, copy=True):
        self.copy = copy

    @property
    def n(self):
        'Count.'
        return 1
"#;
        let outline = parse_outline(src).unwrap();
        assert_eq!(outline.docstring.as_deref(), Some("Module doc."));

        let scaler = class(&outline, "Scaler");
        assert_eq!(scaler.bases, vec!["BaseEstimator", "base.TransformerMixin"]);
        assert!(scaler.docstring.as_deref().unwrap().starts_with("Scale things."));
        assert_eq!(scaler.line, 5);

        let names: Vec<&str> = scaler
            .body
            .iter()
            .filter_map(|d| match d {
                Definition::Function(f) => Some(f.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["__init__", "n"]);
        match &scaler.body[1] {
            Definition::Function(f) => assert_eq!(f.docstring.as_deref(), Some("Count.")),
            other => panic!("Expected function, got {:?}", other),
        }
    }

    #[test]
    fn parses_all_parameter_forms() {
        let src = "def f(a, b: int, c=1, d: str = 'x', *args, e, **kwargs):\n    pass\n";
        let outline = parse_outline(src).unwrap();
        let Definition::Function(f) = &outline.body[0] else {
            panic!("Expected function");
        };
        let params: Vec<(&str, ParamKind)> =
            f.params.iter().map(|p| (p.name.as_str(), p.kind)).collect();
        assert_eq!(
            params,
            vec![
                ("a", ParamKind::Regular),
                ("b", ParamKind::Regular),
                ("c", ParamKind::Regular),
                ("d", ParamKind::Regular),
                ("args", ParamKind::VarPositional),
                ("e", ParamKind::Regular),
                ("kwargs", ParamKind::VarKeyword),
            ]
        );
        assert_eq!(f.docstring, None);
    }

    #[test]
    fn lifts_definitions_out_of_conditional_blocks() {
        let src = r#"
try:
    from ._fast import helper
except ImportError:
    def helper():
        pass

if True:
    class Late:
        pass
"#;
        let outline = parse_outline(src).unwrap();
        assert_eq!(outline.imports().count(), 1);
        let defs: Vec<&Definition> = outline.definitions().collect();
        assert_eq!(defs.len(), 2);
        assert_eq!(class(&outline, "Late").line, 9);
    }

    #[test]
    fn parses_relative_and_aliased_imports() {
        let src = "from ._data import StandardScaler as Scaler, minmax\nfrom .. import base\nfrom pkg.sub import *\n";
        let outline = parse_outline(src).unwrap();
        let imports: Vec<&ImportFrom> = outline.imports().collect();

        assert_eq!(imports[0].module, "_data");
        assert_eq!(imports[0].level, 1);
        assert_eq!(imports[0].names[0].name, "StandardScaler");
        assert_eq!(imports[0].names[0].bound_name(), "Scaler");
        assert_eq!(imports[0].names[1].bound_name(), "minmax");

        assert_eq!(imports[1].module, "");
        assert_eq!(imports[1].level, 2);
        assert_eq!(imports[1].names[0].name, "base");

        assert_eq!(imports[2].module, "pkg.sub");
        assert_eq!(imports[2].level, 0);
        assert!(imports[2].wildcard);
    }

    #[test]
    fn syntax_errors_are_rejected_with_position() {
        let err = parse_outline("def broken(:\n    pass\n").unwrap_err();
        match err {
            OutlineError::Syntax { line, .. } => assert_eq!(line, 1),
            other => panic!("Expected Syntax, got {:?}", other),
        }
    }

    #[test]
    fn decode_string_literals() {
        assert_eq!(decode_string(r#""""Doc.""""#), "Doc.");
        assert_eq!(decode_string("'''a\\nb'''"), "a\nb");
        assert_eq!(decode_string(r#"r"raw\n""#), "raw\\n");
        assert_eq!(decode_string("'it\\'s'"), "it's");
        assert_eq!(decode_string("\"\""), "");
    }
}
