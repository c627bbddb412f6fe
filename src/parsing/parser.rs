//! Language parser traits
//!
//! [`LanguageParser`] is implemented once per grammar and turns source text
//! into a [`FileAst`]. [`SourceParser`] is the seam the project context
//! parses through; [`TreeSitterFrontEnd`] is the default implementation and
//! lazily creates one parser per language through the [`ParserFactory`].

use crate::ast::{AstNode, FileAst, NodeKind};
use crate::error::{ParseError, ParseResult};
use crate::parsing::{Language, ParserFactory};
use crate::types::FileId;
use std::collections::HashMap;
use std::path::Path;
use tree_sitter::Node;

/// Deepest syntax tree nesting the extractors will follow
pub const MAX_AST_DEPTH: usize = 512;

/// Common interface for all language parsers
pub trait LanguageParser: Send {
    /// Parse `code` into a fresh arena for `file_id`
    fn parse(&mut self, code: &str, file_id: FileId, path: &Path) -> ParseResult<FileAst>;

    /// Get the language this parser handles
    fn language(&self) -> Language;
}

/// Parsing seam used by the project context
pub trait SourceParser: Send {
    fn parse_source(
        &mut self,
        file_id: FileId,
        path: &Path,
        code: &str,
        language: Language,
    ) -> ParseResult<FileAst>;
}

/// Tree-sitter backed front end for every supported language
#[derive(Debug)]
pub struct TreeSitterFrontEnd {
    factory: ParserFactory,
    parsers: HashMap<Language, Box<dyn LanguageParser>>,
}

impl std::fmt::Debug for dyn LanguageParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LanguageParser({})", self.language())
    }
}

impl TreeSitterFrontEnd {
    pub fn new(factory: ParserFactory) -> Self {
        Self {
            factory,
            parsers: HashMap::new(),
        }
    }
}

impl Default for TreeSitterFrontEnd {
    fn default() -> Self {
        Self::new(ParserFactory::default())
    }
}

impl SourceParser for TreeSitterFrontEnd {
    fn parse_source(
        &mut self,
        file_id: FileId,
        path: &Path,
        code: &str,
        language: Language,
    ) -> ParseResult<FileAst> {
        if !self.parsers.contains_key(&language) {
            let parser = self.factory.create_parser(language)?;
            self.parsers.insert(language, parser);
        }
        let parser = self
            .parsers
            .get_mut(&language)
            .ok_or_else(|| ParseError::UnsupportedLanguage {
                language: language.name().to_string(),
            })?;
        parser.parse(code, file_id, path)
    }
}

/// Guard against stack overflow on pathological nesting
pub(crate) fn check_recursion_depth(depth: usize, node: Node) -> bool {
    if depth > MAX_AST_DEPTH {
        tracing::warn!(
            "Maximum AST depth exceeded at line {}, skipping subtree",
            node.start_position().row + 1
        );
        return false;
    }
    true
}

pub(crate) fn node_text<'a>(node: Node, code: &'a str) -> &'a str {
    &code[node.byte_range()]
}

/// Declaration header: the node's text up to its body, or its first line
pub(crate) fn signature_of(node: Node, code: &str) -> String {
    let end = node
        .child_by_field_name("body")
        .map_or(node.end_byte(), |body| body.start_byte());
    let text = &code[node.start_byte()..end];
    let text = if node.child_by_field_name("body").is_some() {
        text
    } else {
        text.lines().next().unwrap_or(text)
    };
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches([';', '{', ':'])
        .trim()
        .to_string()
}

/// Block comment (`/** ... */`) or run of `///` lines directly above `node`
pub(crate) fn doc_comment_before(node: Node, code: &str) -> Option<String> {
    let mut lines = Vec::new();
    let mut current = node.prev_sibling();
    while let Some(sibling) = current {
        if sibling.kind() != "comment" {
            break;
        }
        let text = node_text(sibling, code);
        if text.starts_with("/**") {
            let body = text
                .trim_start_matches("/**")
                .trim_end_matches("*/")
                .lines()
                .map(|l| l.trim().trim_start_matches('*').trim())
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            lines.push(body);
            break;
        }
        if let Some(line) = text.strip_prefix("///") {
            lines.push(line.trim().to_string());
            current = sibling.prev_sibling();
            continue;
        }
        break;
    }
    if lines.is_empty() {
        return None;
    }
    lines.reverse();
    Some(lines.join("\n"))
}

/// Turn the arena's root into a module node named after the file stem
pub(crate) fn make_module_root(ast: &mut FileAst, code: &str) {
    let stem = ast
        .path()
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    let lines = code.lines().count() as u32;
    let root = ast.root_mut();
    root.kind = NodeKind::Module;
    root.name = stem;
    root.range = crate::types::SourceRange::new(0, 0, lines, 0).with_bytes(0, code.len());
}

/// Node builder with name, range and signature taken from a syntax node
pub(crate) fn ast_node(kind: NodeKind, name: &str, node: Node) -> AstNode {
    AstNode::new(kind, name).with_range(crate::types::SourceRange::from_ts(&node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn parse_c(code: &str) -> tree_sitter::Tree {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_c::LANGUAGE.into())
            .unwrap();
        parser.parse(code, None).unwrap()
    }

    #[test]
    fn test_signature_stops_at_body() {
        let code = "static int add(int a,\n    int b) {\n  return a + b;\n}\n";
        let tree = parse_c(code);
        let func = tree.root_node().child(0).unwrap();
        assert_eq!(signature_of(func, code), "static int add(int a, int b)");
    }

    #[test]
    fn test_doc_comment_before() {
        let code = "/** Adds two numbers. */\nint add(int a, int b);\nint sub(int a, int b);\n";
        let tree = parse_c(code);
        let root = tree.root_node();
        let add = root.named_child(1).unwrap();
        let sub = root.named_child(2).unwrap();
        assert_eq!(doc_comment_before(add, code).as_deref(), Some("Adds two numbers."));
        assert_eq!(doc_comment_before(sub, code), None);
    }

    #[test]
    fn test_front_end_dispatches_by_language() {
        let mut front_end = TreeSitterFrontEnd::default();
        let ast = front_end
            .parse_source(FileId(1), Path::new("m.py"), "def f():\n    pass\n", Language::Python)
            .unwrap();
        assert_eq!(ast.root().kind, NodeKind::Module);
        assert_eq!(ast.root().name, "m");
        assert_eq!(ast.language(), Language::Python);
    }
}
