//! Python parser implementation
//!
//! Every file becomes a `Module` node named after its stem. Classes,
//! functions, module-level assignments, imports and call sites are
//! extracted; base classes are recorded as pending inheritance references.

use crate::ast::{FileAst, NodeKind, PendingReference};
use crate::error::{ParseError, ParseResult};
use crate::parsing::parser::{
    ast_node, check_recursion_depth, make_module_root, node_text, signature_of,
};
use crate::parsing::resolution::ReferenceKind;
use crate::parsing::{Language, LanguageParser};
use crate::types::{FileId, NodeId};
use std::path::Path;
use tree_sitter::{Node, Parser};

pub struct PythonParser {
    parser: Parser,
}

impl std::fmt::Debug for PythonParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PythonParser")
            .field("language", &"Python")
            .finish()
    }
}

impl PythonParser {
    pub fn new() -> Result<Self, String> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| format!("Failed to set Python language: {e}"))?;

        Ok(Self { parser })
    }
}

impl LanguageParser for PythonParser {
    fn parse(&mut self, code: &str, file_id: FileId, path: &Path) -> ParseResult<FileAst> {
        let tree = self
            .parser
            .parse(code, None)
            .ok_or_else(|| ParseError::NoTree {
                path: path.to_path_buf(),
            })?;
        let root = tree.root_node();

        let mut ast = FileAst::new(file_id, path, Language::Python);
        make_module_root(&mut ast, code);
        ast.root_mut().docstring = docstring(root, code);

        let mut extractor = PythonExtractor { ast, code };
        extractor.visit_children(root, NodeId::ROOT, 0);
        Ok(extractor.ast)
    }

    fn language(&self) -> Language {
        Language::Python
    }
}

/// First string literal of a module, class or function body
fn docstring(body: Node, code: &str) -> Option<String> {
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let string = first.named_child(0)?;
    if string.kind() != "string" {
        return None;
    }
    let text = node_text(string, code);
    let trimmed = text
        .trim_start_matches(['r', 'u', 'R', 'U'])
        .trim_matches('"')
        .trim_matches('\'')
        .trim();
    Some(trimmed.to_string())
}

/// Annotation names that never resolve to project symbols
const BUILTIN_TYPES: &[&str] = &[
    "int", "float", "complex", "str", "bytes", "bool", "None", "object", "list", "dict", "set",
    "tuple", "frozenset", "type", "Any",
];

struct PythonExtractor<'a> {
    ast: FileAst,
    code: &'a str,
}

impl<'a> PythonExtractor<'a> {
    fn text(&self, node: Node) -> &'a str {
        node_text(node, self.code)
    }

    fn parent_kind(&self, parent: NodeId) -> NodeKind {
        self.ast.node(parent).map_or(NodeKind::Unknown, |n| n.kind)
    }

    fn visit_children(&mut self, node: Node, parent: NodeId, depth: usize) {
        for child in node.children(&mut node.walk()) {
            self.visit(child, parent, depth + 1);
        }
    }

    fn visit(&mut self, node: Node, parent: NodeId, depth: usize) {
        if !check_recursion_depth(depth, node) {
            return;
        }

        match node.kind() {
            "import_statement" => self.import(node, parent),
            "import_from_statement" => self.import_from(node, parent),
            "class_definition" => self.class(node, parent, depth),
            "function_definition" => self.function(node, parent, depth),
            "decorated_definition" => {
                if let Some(definition) = node.child_by_field_name("definition") {
                    self.visit(definition, parent, depth + 1);
                }
            }
            "assignment" => self.assignment(node, parent, depth),
            "call" => self.call(node, parent, depth),
            "comment" => {}
            _ => self.visit_children(node, parent, depth),
        }
    }

    fn import(&mut self, node: Node, parent: NodeId) {
        let raw = self.text(node).trim().to_string();
        let names: Vec<Node> = node
            .children_by_field_name("name", &mut node.walk())
            .collect();
        for name in names {
            let (module, alias) = self.split_alias(name);
            let mut import = ast_node(NodeKind::Import, &module, node).with_raw_content(raw.as_str());
            if let Some(alias) = alias {
                import.set_property("alias", alias);
            }
            self.ast.add_child(parent, import);
        }
    }

    /// `from a.b import x as y` becomes one `a.b.x` import per imported name
    fn import_from(&mut self, node: Node, parent: NodeId) {
        let Some(module_node) = node.child_by_field_name("module_name") else {
            return;
        };
        let module = self.text(module_node).to_string();
        let raw = self.text(node).trim().to_string();

        let wildcard = node
            .children(&mut node.walk())
            .any(|c| c.kind() == "wildcard_import");
        if wildcard {
            let mut import = ast_node(NodeKind::Import, &module, node).with_raw_content(raw.as_str());
            import.set_property("wildcard", "true");
            self.ast.add_child(parent, import);
            return;
        }

        let names: Vec<Node> = node
            .children_by_field_name("name", &mut node.walk())
            .collect();
        for name in names {
            let (symbol, alias) = self.split_alias(name);
            let target = if module.ends_with('.') {
                format!("{module}{symbol}")
            } else {
                format!("{module}.{symbol}")
            };
            let mut import = ast_node(NodeKind::Import, &target, node).with_raw_content(raw.as_str());
            import.set_property("module", module.as_str());
            if let Some(alias) = alias {
                import.set_property("alias", alias);
            }
            self.ast.add_child(parent, import);
        }
    }

    fn split_alias(&self, name: Node) -> (String, Option<String>) {
        if name.kind() == "aliased_import" {
            let module = name
                .child_by_field_name("name")
                .map(|n| self.text(n).to_string())
                .unwrap_or_default();
            let alias = name
                .child_by_field_name("alias")
                .map(|n| self.text(n).to_string());
            (module, alias)
        } else {
            (self.text(name).to_string(), None)
        }
    }

    fn class(&mut self, node: Node, parent: NodeId, depth: usize) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let mut class = ast_node(NodeKind::Class, self.text(name_node), node)
            .with_signature(signature_of(node, self.code));

        if let Some(bases) = node.child_by_field_name("superclasses") {
            for base in bases.named_children(&mut bases.walk()) {
                if matches!(base.kind(), "identifier" | "attribute") {
                    class
                        .pending
                        .push(PendingReference::new(ReferenceKind::Inheritance, self.text(base)));
                }
            }
        }

        let body = node.child_by_field_name("body");
        class.docstring = body.and_then(|b| docstring(b, self.code));
        let id = self.ast.add_child(parent, class);
        if let Some(body) = body {
            self.visit_children(body, id, depth + 1);
        }
    }

    fn function(&mut self, node: Node, parent: NodeId, depth: usize) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let kind = if self.parent_kind(parent) == NodeKind::Class {
            NodeKind::Method
        } else {
            NodeKind::Function
        };

        let mut function = ast_node(kind, self.text(name_node), node)
            .with_signature(signature_of(node, self.code));
        if let Some(return_type) = node.child_by_field_name("return_type") {
            function.set_property("return_type", self.text(return_type));
        }
        let body = node.child_by_field_name("body");
        function.docstring = body.and_then(|b| docstring(b, self.code));
        let id = self.ast.add_child(parent, function);

        if let Some(return_type) = node.child_by_field_name("return_type") {
            self.annotation(return_type, id);
        }
        if let Some(params) = node.child_by_field_name("parameters") {
            self.parameters(params, id);
        }
        if let Some(body) = body {
            self.visit_children(body, id, depth + 1);
        }
    }

    fn parameters(&mut self, params: Node, owner: NodeId) {
        for param in params.named_children(&mut params.walk()) {
            let name_node = match param.kind() {
                "identifier" => Some(param),
                "typed_parameter" => param.named_child(0),
                "default_parameter" | "typed_default_parameter" => {
                    param.child_by_field_name("name")
                }
                _ => None,
            };
            let Some(name_node) = name_node.filter(|n| n.kind() == "identifier") else {
                continue;
            };
            let mut parameter = ast_node(NodeKind::Parameter, self.text(name_node), param)
                .with_signature(self.text(param));
            let ty = param.child_by_field_name("type");
            if let Some(ty) = ty {
                parameter.set_property("type", self.text(ty));
            }
            self.ast.add_child(owner, parameter);
            if let Some(ty) = ty {
                self.annotation(ty, owner);
            }
        }
    }

    /// One `Type` node per class named in an annotation: `Optional[User]`
    /// yields `Optional` and `User`, `models.User` stays dotted
    fn annotation(&mut self, node: Node, parent: NodeId) {
        match node.kind() {
            "identifier" => {
                let name = self.text(node);
                if !BUILTIN_TYPES.contains(&name) {
                    self.ast.add_child(parent, ast_node(NodeKind::Type, name, node));
                }
            }
            "attribute" => {
                let name: String = self.text(node).split_whitespace().collect();
                self.ast.add_child(parent, ast_node(NodeKind::Type, &name, node));
            }
            "string" | "comment" => {}
            _ => {
                for child in node.named_children(&mut node.walk()) {
                    self.annotation(child, parent);
                }
            }
        }
    }

    fn assignment(&mut self, node: Node, parent: NodeId, depth: usize) {
        if let Some(left) = node.child_by_field_name("left") {
            if left.kind() == "identifier" {
                let text = self.text(node);
                let first_line = text.lines().next().unwrap_or(text).trim();
                let mut variable =
                    ast_node(NodeKind::Variable, self.text(left), node).with_signature(first_line);
                if let Some(ty) = node.child_by_field_name("type") {
                    variable.set_property("type", self.text(ty));
                }
                self.ast.add_child(parent, variable);
            }
        }
        if let Some(ty) = node.child_by_field_name("type") {
            self.annotation(ty, parent);
        }
        if let Some(right) = node.child_by_field_name("right") {
            self.visit(right, parent, depth + 1);
        }
    }

    fn call(&mut self, node: Node, parent: NodeId, depth: usize) {
        if let Some(function) = node.child_by_field_name("function") {
            let callee: String = self.text(function).split_whitespace().collect();
            self.ast.add_child(parent, ast_node(NodeKind::Call, &callee, node));
            if function.kind() != "identifier" {
                self.visit_children(function, parent, depth + 1);
            }
        }
        if let Some(arguments) = node.child_by_field_name("arguments") {
            self.visit_children(arguments, parent, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#""""Zoo module."""
import os.path
from .models import User, Admin as A
from util import *

LIMIT = 10

class Animal:
    """Base class."""

    def speak(self, volume: int = 1):
        return self.sound()

class Dog(Animal):
    @staticmethod
    def create():
        return Dog()
"#;

    fn find(ast: &FileAst, kind: NodeKind, name: &str) -> NodeId {
        ast.iter()
            .find(|(_, n)| n.kind == kind && n.name == name)
            .map(|(id, _)| id)
            .unwrap_or_else(|| panic!("no {kind} named {name}"))
    }

    fn parse() -> FileAst {
        let mut parser = PythonParser::new().unwrap();
        parser.parse(SOURCE, FileId(1), Path::new("pkg/zoo.py")).unwrap()
    }

    #[test]
    fn test_module_root_and_imports() {
        let ast = parse();
        assert_eq!(ast.root().kind, NodeKind::Module);
        assert_eq!(ast.root().name, "zoo");
        assert_eq!(ast.root().docstring.as_deref(), Some("Zoo module."));

        find(&ast, NodeKind::Import, "os.path");
        find(&ast, NodeKind::Import, ".models.User");
        let aliased = ast.node(find(&ast, NodeKind::Import, ".models.Admin")).unwrap();
        assert_eq!(aliased.property("alias"), Some("A"));
        let wildcard = ast.node(find(&ast, NodeKind::Import, "util")).unwrap();
        assert_eq!(wildcard.property("wildcard"), Some("true"));

        let limit = ast.node(find(&ast, NodeKind::Variable, "LIMIT")).unwrap();
        assert_eq!(limit.parent, Some(NodeId::ROOT));
    }

    #[test]
    fn test_classes_methods_and_calls() {
        let ast = parse();

        let animal = find(&ast, NodeKind::Class, "Animal");
        assert_eq!(ast.node(animal).unwrap().docstring.as_deref(), Some("Base class."));
        let speak = ast.find_child(animal, "speak").unwrap();
        assert_eq!(ast.node(speak).unwrap().kind, NodeKind::Method);
        assert!(ast.find_child(speak, "volume").is_some());

        let call = ast.node(find(&ast, NodeKind::Call, "self.sound")).unwrap();
        assert_eq!(call.parent, Some(speak));

        let dog = ast.node(find(&ast, NodeKind::Class, "Dog")).unwrap();
        assert_eq!(dog.pending.len(), 1);
        assert_eq!(dog.pending[0].name, "Animal");
        assert_eq!(dog.signature.as_deref(), Some("class Dog(Animal)"));

        let create = find(&ast, NodeKind::Method, "create");
        let construct = ast.node(find(&ast, NodeKind::Call, "Dog")).unwrap();
        assert_eq!(construct.parent, Some(create));
    }

    #[test]
    fn test_annotations_become_type_nodes() {
        let code = "def load(user: User, n: int = 1) -> Optional[models.Account]:\n    cache: Cache = make()\n";
        let mut parser = PythonParser::new().unwrap();
        let ast = parser.parse(code, FileId(1), Path::new("svc.py")).unwrap();

        let load = find(&ast, NodeKind::Function, "load");
        let types: Vec<_> = ast
            .iter()
            .filter(|(_, n)| n.kind == NodeKind::Type)
            .map(|(_, n)| (n.name.as_str(), n.parent))
            .collect();
        assert_eq!(types.len(), 4);
        for name in ["User", "Optional", "models.Account", "Cache"] {
            assert!(
                types.contains(&(name, Some(load))),
                "missing type {name}: {types:?}"
            );
        }
    }
}
