//! C language parser implementation
//!
//! Builds the per-file AST from a tree-sitter-c syntax tree. The extractor
//! is shared with the C++ parser, which layers its own node kinds on top.

use crate::ast::{FileAst, NodeFlags, NodeKind};
use crate::error::{ParseError, ParseResult};
use crate::parsing::parser::{
    ast_node, check_recursion_depth, doc_comment_before, node_text, signature_of,
};
use crate::parsing::{Language, LanguageParser};
use crate::types::{FileId, NodeId};
use std::path::Path;
use tree_sitter::{Node, Parser};

pub struct CParser {
    parser: Parser,
}

impl std::fmt::Debug for CParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CParser").field("language", &"C").finish()
    }
}

impl CParser {
    pub fn new() -> Result<Self, String> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_c::LANGUAGE.into())
            .map_err(|e| format!("Failed to set C language: {e}"))?;

        Ok(Self { parser })
    }
}

impl LanguageParser for CParser {
    fn parse(&mut self, code: &str, file_id: FileId, path: &Path) -> ParseResult<FileAst> {
        let tree = self
            .parser
            .parse(code, None)
            .ok_or_else(|| ParseError::NoTree {
                path: path.to_path_buf(),
            })?;

        let mut extractor = CFamilyExtractor::new(file_id, path, Language::C, code);
        extractor.visit_children(tree.root_node(), NodeId::ROOT, 0);
        Ok(extractor.finish())
    }

    fn language(&self) -> Language {
        Language::C
    }
}

/// Collapse runs of whitespace so multi-line expressions get stable names
pub(crate) fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether a declaration carries `static` storage
fn is_static(node: Node, code: &str) -> bool {
    node.children(&mut node.walk())
        .any(|child| child.kind() == "storage_class_specifier" && node_text(child, code) == "static")
}

/// Name node buried in a (possibly nested) declarator
pub(crate) fn declarator_name(node: Node) -> Option<Node> {
    match node.kind() {
        "identifier" | "field_identifier" | "type_identifier" | "qualified_identifier"
        | "destructor_name" | "operator_name" => Some(node),
        "function_declarator" | "pointer_declarator" | "array_declarator" | "init_declarator"
        | "parenthesized_declarator" | "reference_declarator" | "parameter_declaration"
        | "optional_parameter_declaration" => match node.child_by_field_name("declarator") {
            Some(inner) => declarator_name(inner),
            None => node
                .named_children(&mut node.walk())
                .find_map(declarator_name),
        },
        _ => None,
    }
}

/// The function declarator inside a declarator, if this declares a function
pub(crate) fn function_declarator(node: Node) -> Option<Node> {
    match node.kind() {
        "function_declarator" => {
            // `int (*fp)(void)` declares a function pointer variable
            let pointer = node
                .child_by_field_name("declarator")
                .is_some_and(|inner| inner.kind() == "parenthesized_declarator");
            (!pointer).then_some(node)
        }
        "pointer_declarator" | "reference_declarator" => node
            .child_by_field_name("declarator")
            .or_else(|| node.named_children(&mut node.walk()).last())
            .and_then(function_declarator),
        _ => None,
    }
}

/// Walks a C-family syntax tree into a [`FileAst`]
pub(crate) struct CFamilyExtractor<'a> {
    pub(crate) ast: FileAst,
    pub(crate) code: &'a str,
    pub(crate) cpp: bool,
}

impl<'a> CFamilyExtractor<'a> {
    pub(crate) fn new(file_id: FileId, path: &Path, language: Language, code: &'a str) -> Self {
        let mut ast = FileAst::new(file_id, path, language);
        let lines = code.lines().count() as u32;
        ast.root_mut().range = crate::types::SourceRange::new(0, 0, lines, 0).with_bytes(0, code.len());
        Self {
            ast,
            code,
            cpp: language == Language::Cpp,
        }
    }

    pub(crate) fn finish(self) -> FileAst {
        self.ast
    }

    pub(crate) fn text(&self, node: Node) -> &'a str {
        node_text(node, self.code)
    }

    pub(crate) fn visit_children(&mut self, node: Node, parent: NodeId, depth: usize) {
        for child in node.children(&mut node.walk()) {
            self.visit(child, parent, depth + 1);
        }
    }

    pub(crate) fn visit(&mut self, node: Node, parent: NodeId, depth: usize) {
        if !check_recursion_depth(depth, node) {
            return;
        }
        if self.cpp && self.visit_cpp(node, parent, depth) {
            return;
        }

        match node.kind() {
            "preproc_include" => self.include(node, parent),
            "preproc_def" | "preproc_function_def" => self.macro_definition(node, parent),
            "function_definition" => self.function(node, parent, depth),
            "declaration" => self.declaration(node, parent, depth),
            "type_definition" => self.type_definition(node, parent, depth),
            "struct_specifier" | "union_specifier" | "enum_specifier" | "class_specifier" => {
                if self.aggregate(node, parent, depth, None).is_none() {
                    self.visit_children(node, parent, depth);
                }
            }
            "call_expression" => self.call(node, parent, depth),
            "field_expression" => self.field_access(node, parent, depth),
            "comment" => {}
            _ => self.visit_children(node, parent, depth),
        }
    }

    fn include(&mut self, node: Node, parent: NodeId) {
        let Some(path_node) = node.child_by_field_name("path") else {
            return;
        };
        let path_text = self.text(path_node);
        let system = path_text.starts_with('<');
        let clean_path = path_text.trim_matches(|c| c == '"' || c == '<' || c == '>');

        let mut include = ast_node(NodeKind::Include, clean_path, node)
            .with_raw_content(self.text(node).trim());
        if system {
            include.set_property("system", "true");
        }
        self.ast.add_child(parent, include);
    }

    fn macro_definition(&mut self, node: Node, parent: NodeId) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let text = self.text(node);
        let first_line = text.lines().next().unwrap_or(text);
        let macro_node = ast_node(NodeKind::Macro, self.text(name_node), node)
            .with_signature(collapse(first_line))
            .with_raw_content(text.trim_end());
        self.ast.add_child(parent, macro_node);
    }

    fn callable_kind(&self, name_node: Node, parent: NodeId) -> NodeKind {
        if name_node.kind() == "operator_name" {
            return NodeKind::Operator;
        }
        let in_type = self
            .ast
            .node(parent)
            .is_some_and(|p| matches!(p.kind, NodeKind::Class | NodeKind::Struct));
        if in_type || (self.cpp && name_node.kind() == "qualified_identifier") {
            NodeKind::Method
        } else {
            NodeKind::Function
        }
    }

    fn function(&mut self, node: Node, parent: NodeId, depth: usize) {
        let Some(name_node) = node
            .child_by_field_name("declarator")
            .and_then(declarator_name)
        else {
            self.visit_children(node, parent, depth);
            return;
        };

        let kind = self.callable_kind(name_node, parent);
        let mut function = ast_node(kind, &collapse(self.text(name_node)), node)
            .with_signature(signature_of(node, self.code));
        function.docstring = doc_comment_before(node, self.code);
        if is_static(node, self.code) {
            function.flags |= NodeFlags::STATIC;
        }
        if let Some(return_type) = node.child_by_field_name("type") {
            function.set_property("return_type", self.text(return_type));
        }
        let id = self.ast.add_child(parent, function);
        if let Some(return_type) = node.child_by_field_name("type") {
            self.type_reference(return_type, id);
        }

        if let Some(declarator) = node
            .child_by_field_name("declarator")
            .and_then(function_declarator)
        {
            self.parameters(declarator, id);
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.visit_children(body, id, depth + 1);
        }
    }

    fn parameters(&mut self, declarator: Node, owner: NodeId) {
        let Some(list) = declarator.child_by_field_name("parameters") else {
            return;
        };
        for param in list.named_children(&mut list.walk()) {
            let Some(name_node) = declarator_name(param) else {
                continue;
            };
            let parameter = ast_node(NodeKind::Parameter, self.text(name_node), param)
                .with_signature(collapse(self.text(param)));
            self.ast.add_child(owner, parameter);
            if let Some(ty) = param.child_by_field_name("type") {
                self.type_reference(ty, owner);
            }
        }
    }

    /// Record a use of a named type (`Point`, `struct Point`, `geo::Shape`).
    /// Builtin and anonymous types are skipped.
    pub(crate) fn type_reference(&mut self, ty: Node, parent: NodeId) {
        let name = match ty.kind() {
            "type_identifier" | "qualified_identifier" | "template_type" => Some(ty),
            "struct_specifier" | "union_specifier" | "enum_specifier" | "class_specifier" => {
                if ty.child_by_field_name("body").is_some() {
                    None
                } else {
                    ty.child_by_field_name("name")
                }
            }
            _ => None,
        };
        if let Some(name) = name {
            let reference = ast_node(NodeKind::Type, &collapse(self.text(name)), ty);
            self.ast.add_child(parent, reference);
        }
    }

    fn declaration(&mut self, node: Node, parent: NodeId, depth: usize) {
        let storage_static = is_static(node, self.code);

        // `struct Point { ... } origin;` defines the struct too
        if let Some(ty) = node.child_by_field_name("type") {
            if ty.child_by_field_name("body").is_some() {
                self.visit(ty, parent, depth + 1);
            } else {
                self.type_reference(ty, parent);
            }
        }

        let declarators: Vec<Node> = node
            .children_by_field_name("declarator", &mut node.walk())
            .collect();
        for declarator in declarators {
            let Some(name_node) = declarator_name(declarator) else {
                continue;
            };
            let name = collapse(self.text(name_node));

            if function_declarator(declarator).is_some() {
                let kind = self.callable_kind(name_node, parent);
                let mut prototype = ast_node(kind, &name, node)
                    .with_signature(signature_of(node, self.code))
                    .with_flags(NodeFlags::DECLARATION);
                prototype.docstring = doc_comment_before(node, self.code);
                if storage_static {
                    prototype.flags |= NodeFlags::STATIC;
                }
                self.ast.add_child(parent, prototype);
                continue;
            }

            let mut variable = ast_node(NodeKind::Variable, &name, declarator)
                .with_signature(signature_of(node, self.code));
            if storage_static {
                variable.flags |= NodeFlags::STATIC;
            }
            if self.text(node).trim_start().starts_with("extern") {
                variable.flags |= NodeFlags::DECLARATION;
            }
            self.ast.add_child(parent, variable);

            if let Some(value) = declarator.child_by_field_name("value") {
                self.visit(value, parent, depth + 1);
            }
        }
    }

    fn type_definition(&mut self, node: Node, parent: NodeId, depth: usize) {
        let alias = node
            .children_by_field_name("declarator", &mut node.walk())
            .filter_map(declarator_name)
            .last()
            .map(|n| self.text(n));
        let Some(alias) = alias else {
            return;
        };

        if let Some(ty) = node.child_by_field_name("type") {
            let defines_body = ty.child_by_field_name("body").is_some();
            let named = ty.child_by_field_name("name").is_some();
            if defines_body && !named {
                // typedef struct { ... } Point;
                self.aggregate(ty, parent, depth, Some(alias));
                return;
            }
            if defines_body {
                self.aggregate(ty, parent, depth, None);
            }
        }

        let mut typedef = ast_node(NodeKind::Typedef, alias, node)
            .with_signature(signature_of(node, self.code));
        if let Some(ty) = node.child_by_field_name("type") {
            let target = ty
                .child_by_field_name("name")
                .map_or_else(|| self.text(ty), |n| self.text(n));
            typedef.set_property("type", collapse(target));
        }
        self.ast.add_child(parent, typedef);
    }

    /// Struct, union, enum or class with a body. Returns `None` for bare
    /// type references such as `struct Point *p`.
    pub(crate) fn aggregate(
        &mut self,
        node: Node,
        parent: NodeId,
        depth: usize,
        alias: Option<&str>,
    ) -> Option<NodeId> {
        let kind = match node.kind() {
            "struct_specifier" => NodeKind::Struct,
            "union_specifier" => NodeKind::Union,
            "enum_specifier" => NodeKind::Enum,
            "class_specifier" => NodeKind::Class,
            _ => return None,
        };
        let body = node.child_by_field_name("body")?;
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n))
            .or(alias);
        let Some(name) = name else {
            // Anonymous aggregate: members belong to the enclosing scope
            self.visit_children(body, parent, depth);
            return None;
        };

        let mut aggregate = ast_node(kind, &collapse(name), node)
            .with_signature(signature_of(node, self.code));
        aggregate.docstring = doc_comment_before(node, self.code);
        if alias.is_some() {
            aggregate.set_property("typedef", "true");
        }
        let id = self.ast.add_child(parent, aggregate);

        if self.cpp {
            self.base_classes(node, id);
        }

        for member in body.children(&mut body.walk()) {
            match member.kind() {
                "field_declaration" => self.field(member, id, depth + 1),
                "enumerator" => {
                    if let Some(name_node) = member.child_by_field_name("name") {
                        let enumerator = ast_node(NodeKind::Property, self.text(name_node), member)
                            .with_signature(collapse(self.text(member)));
                        self.ast.add_child(id, enumerator);
                    }
                }
                _ => self.visit(member, id, depth + 1),
            }
        }
        Some(id)
    }

    fn field(&mut self, node: Node, owner: NodeId, depth: usize) {
        if let Some(ty) = node.child_by_field_name("type") {
            if ty.child_by_field_name("body").is_some() {
                self.visit(ty, owner, depth + 1);
            }
        }

        let declarators: Vec<Node> = node
            .children_by_field_name("declarator", &mut node.walk())
            .collect();
        for declarator in declarators {
            let Some(name_node) = declarator_name(declarator) else {
                continue;
            };
            let name = collapse(self.text(name_node));

            if function_declarator(declarator).is_some() {
                let kind = self.callable_kind(name_node, owner);
                let method = ast_node(kind, &name, node)
                    .with_signature(signature_of(node, self.code))
                    .with_flags(NodeFlags::DECLARATION);
                let id = self.ast.add_child(owner, method);
                if let Some(func) = function_declarator(declarator) {
                    self.parameters(func, id);
                }
                continue;
            }

            let mut field = ast_node(NodeKind::Property, &name, node)
                .with_signature(signature_of(node, self.code));
            if let Some(ty) = node.child_by_field_name("type") {
                field.set_property("type", collapse(self.text(ty)));
            }
            if is_static(node, self.code) {
                field.flags |= NodeFlags::STATIC;
            }
            self.ast.add_child(owner, field);
        }

        // After the members so a same-named field is still found first
        if let Some(ty) = node.child_by_field_name("type") {
            self.type_reference(ty, owner);
        }
    }

    fn call(&mut self, node: Node, parent: NodeId, depth: usize) {
        let Some(function) = node.child_by_field_name("function") else {
            self.visit_children(node, parent, depth);
            return;
        };
        let callee = collapse(self.text(function));
        self.ast.add_child(parent, ast_node(NodeKind::Call, &callee, node));

        // Receivers may hold calls of their own: make()->run()
        if !matches!(function.kind(), "identifier" | "qualified_identifier") {
            self.visit_children(function, parent, depth + 1);
        }
        if let Some(arguments) = node.child_by_field_name("arguments") {
            self.visit_children(arguments, parent, depth + 1);
        }
    }

    fn field_access(&mut self, node: Node, parent: NodeId, depth: usize) {
        let access = collapse(self.text(node));
        self.ast
            .add_child(parent, ast_node(NodeKind::Identifier, &access, node));
        if let Some(argument) = node.child_by_field_name("argument") {
            if argument.kind() != "identifier" {
                self.visit(argument, parent, depth + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(code: &str) -> FileAst {
        let mut parser = CParser::new().unwrap();
        parser.parse(code, FileId(1), Path::new("test.c")).unwrap()
    }

    fn find(ast: &FileAst, kind: NodeKind, name: &str) -> NodeId {
        ast.iter()
            .find(|(_, n)| n.kind == kind && n.name == name)
            .map(|(id, _)| id)
            .unwrap_or_else(|| panic!("no {kind} named {name}"))
    }

    #[test]
    fn test_functions_prototypes_and_static() {
        let code = r#"
int helper(void);
static int counter = 0;

/** Entry point */
int main(int argc, char **argv) {
    helper();
    return 0;
}
"#;
        let ast = parse(code);

        let proto = ast.node(find(&ast, NodeKind::Function, "helper")).unwrap();
        assert!(proto.flags.contains(NodeFlags::DECLARATION));

        let counter = ast.node(find(&ast, NodeKind::Variable, "counter")).unwrap();
        assert!(counter.flags.contains(NodeFlags::STATIC));

        let main_id = find(&ast, NodeKind::Function, "main");
        let main = ast.node(main_id).unwrap();
        assert!(main.is_definition());
        assert_eq!(main.signature.as_deref(), Some("int main(int argc, char **argv)"));
        assert_eq!(main.docstring.as_deref(), Some("Entry point"));

        let call = ast.node(find(&ast, NodeKind::Call, "helper")).unwrap();
        assert_eq!(call.parent, Some(main_id));
        let params: Vec<_> = main
            .children
            .iter()
            .filter_map(|id| ast.node(*id))
            .filter(|n| n.kind == NodeKind::Parameter)
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(params, vec!["argc", "argv"]);
    }

    #[test]
    fn test_includes_macros_and_structs() {
        let code = r#"
#include "helper.h"
#include <stdio.h>
#define MAX_LEN 64

struct Point { int x; int y; };
typedef struct { float w; } Size;

int norm(struct Point *p) { return p->x; }
"#;
        let ast = parse(code);

        let local = ast.node(find(&ast, NodeKind::Include, "helper.h")).unwrap();
        assert_eq!(local.raw_content.as_deref(), Some("#include \"helper.h\""));
        let system = ast.node(find(&ast, NodeKind::Include, "stdio.h")).unwrap();
        assert_eq!(system.property("system"), Some("true"));

        find(&ast, NodeKind::Macro, "MAX_LEN");

        let point = find(&ast, NodeKind::Struct, "Point");
        assert!(ast.find_child(point, "x").is_some());
        assert!(ast.find_child(point, "y").is_some());

        let size = find(&ast, NodeKind::Struct, "Size");
        assert!(ast.find_child(size, "w").is_some());

        let access = ast.node(find(&ast, NodeKind::Identifier, "p->x")).unwrap();
        assert_eq!(access.parent, Some(find(&ast, NodeKind::Function, "norm")));
    }

    #[test]
    fn test_named_types_become_type_nodes() {
        let code = r#"
typedef struct Point Point;
struct List { struct List *next; };

Point make(struct Point *p, int n) {
    Size s;
    return *p;
}
"#;
        let ast = parse(code);
        let make = find(&ast, NodeKind::Function, "make");

        let types: Vec<_> = ast
            .node(make)
            .unwrap()
            .children
            .iter()
            .filter_map(|id| ast.node(*id))
            .filter(|n| n.kind == NodeKind::Type)
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(types, vec!["Point", "Point", "Size"]);

        let list = find(&ast, NodeKind::Struct, "List");
        assert_eq!(ast.node(find(&ast, NodeKind::Type, "List")).unwrap().parent, Some(list));
        assert!(ast.iter().all(|(_, n)| n.kind != NodeKind::Type || n.name != "int"));
    }

    #[test]
    fn test_declarator_helpers() {
        let code = "int (*handler)(int);\nchar *name(void);\n";
        let ast = parse(code);
        find(&ast, NodeKind::Variable, "handler");
        let name = ast.node(find(&ast, NodeKind::Function, "name")).unwrap();
        assert!(name.flags.contains(NodeFlags::DECLARATION));
        assert_eq!(collapse("a  ->\n b"), "a -> b");
    }
}
