//! C++ parser implementation
//!
//! Reuses the C extractor and adds namespaces, classes with base clauses,
//! using declarations, friends and `new` expressions.

use crate::ast::{FileAst, NodeKind};
use crate::error::{ParseError, ParseResult};
use crate::parsing::c::parser::{CFamilyExtractor, collapse, declarator_name};
use crate::parsing::parser::{ast_node, signature_of};
use crate::parsing::resolution::ReferenceKind;
use crate::parsing::{Language, LanguageParser};
use crate::types::{FileId, NodeId};
use std::path::Path;
use tree_sitter::{Node, Parser};

pub struct CppParser {
    parser: Parser,
}

impl std::fmt::Debug for CppParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CppParser").field("language", &"C++").finish()
    }
}

impl CppParser {
    pub fn new() -> Result<Self, String> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_cpp::LANGUAGE.into())
            .map_err(|e| format!("Failed to set C++ language: {e}"))?;

        Ok(Self { parser })
    }
}

impl LanguageParser for CppParser {
    fn parse(&mut self, code: &str, file_id: FileId, path: &Path) -> ParseResult<FileAst> {
        let tree = self
            .parser
            .parse(code, None)
            .ok_or_else(|| ParseError::NoTree {
                path: path.to_path_buf(),
            })?;

        let mut extractor = CFamilyExtractor::new(file_id, path, Language::Cpp, code);
        extractor.visit_children(tree.root_node(), NodeId::ROOT, 0);
        Ok(extractor.finish())
    }

    fn language(&self) -> Language {
        Language::Cpp
    }
}

impl CFamilyExtractor<'_> {
    /// C++-only node kinds. Returns `false` to fall through to the C rules.
    pub(crate) fn visit_cpp(&mut self, node: Node, parent: NodeId, depth: usize) -> bool {
        match node.kind() {
            "namespace_definition" => self.namespace(node, parent, depth),
            "using_declaration" | "alias_declaration" | "namespace_alias_definition" => {
                self.using(node, parent)
            }
            "friend_declaration" => self.friend(node, parent),
            "new_expression" => self.construction(node, parent, depth),
            "template_declaration" => {
                for child in node.children(&mut node.walk()) {
                    if child.kind() != "template_parameter_list" {
                        self.visit(child, parent, depth + 1);
                    }
                }
            }
            _ => return false,
        }
        true
    }

    fn namespace(&mut self, node: Node, parent: NodeId, depth: usize) {
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        let Some(name_node) = node.child_by_field_name("name") else {
            // Anonymous namespace
            self.visit_children(body, parent, depth);
            return;
        };

        let namespace = ast_node(NodeKind::Namespace, self.text(name_node), node)
            .with_signature(signature_of(node, self.code));
        let id = self.ast.add_child(parent, namespace);
        self.visit_children(body, id, depth + 1);
    }

    fn using(&mut self, node: Node, parent: NodeId) {
        let (name, target) = match node.child_by_field_name("name") {
            // using Alias = Target; namespace Alias = target;
            Some(alias) => {
                let target = node
                    .child_by_field_name("type")
                    .or_else(|| node.named_children(&mut node.walk()).last())
                    .map(|t| collapse(self.text(t)))
                    .unwrap_or_default();
                (self.text(alias).to_string(), target)
            }
            None => {
                let Some(last) = node.named_children(&mut node.walk()).last() else {
                    return;
                };
                let target = collapse(self.text(last));
                (target.clone(), target)
            }
        };

        let mut using = ast_node(NodeKind::Using, &name, node)
            .with_signature(signature_of(node, self.code));
        using.set_property("target", target);
        if self.text(node).contains("namespace") {
            using.set_property("namespace", "true");
        }
        self.ast.add_child(parent, using);
    }

    fn friend(&mut self, node: Node, parent: NodeId) {
        let name = node
            .named_children(&mut node.walk())
            .find_map(|child| match child.kind() {
                "declaration" => child
                    .child_by_field_name("declarator")
                    .and_then(declarator_name),
                "type_identifier" | "qualified_identifier" => Some(child),
                "class_specifier" | "struct_specifier" => child.child_by_field_name("name"),
                _ => None,
            });
        let Some(name) = name else {
            return;
        };
        let friend = ast_node(NodeKind::Friend, &collapse(self.text(name)), node)
            .with_signature(signature_of(node, self.code));
        self.ast.add_child(parent, friend);
    }

    fn construction(&mut self, node: Node, parent: NodeId, depth: usize) {
        if let Some(ty) = node.child_by_field_name("type") {
            let call = ast_node(NodeKind::Call, &collapse(self.text(ty)), node);
            self.ast.add_child(parent, call);
        }
        if let Some(arguments) = node.child_by_field_name("arguments") {
            self.visit_children(arguments, parent, depth + 1);
        }
    }

    /// Record `class D : public B` as a pending inheritance reference on `D`
    pub(crate) fn base_classes(&mut self, node: Node, class: NodeId) {
        let Some(clause) = node
            .children(&mut node.walk())
            .find(|c| c.kind() == "base_class_clause")
        else {
            return;
        };
        let bases: Vec<String> = clause
            .named_children(&mut clause.walk())
            .filter(|c| {
                matches!(
                    c.kind(),
                    "type_identifier" | "qualified_identifier" | "template_type"
                )
            })
            .map(|c| collapse(self.text(c)))
            .collect();

        if let Some(class_node) = self.ast.node_mut(class) {
            for base in bases {
                class_node
                    .pending
                    .push(crate::ast::PendingReference::new(ReferenceKind::Inheritance, base));
            }
        }
    }
}
