//! TypeScript parser implementation
//!
//! Extends the JavaScript extractor with interfaces, type aliases, enums,
//! namespaces and type annotations. Every named type used in an annotation
//! becomes a `Type` node so it can be resolved like any other reference.

use crate::ast::{FileAst, NodeFlags, NodeKind, PendingReference};
use crate::error::{ParseError, ParseResult};
use crate::parsing::c::parser::collapse;
use crate::parsing::javascript::parser::ScriptExtractor;
use crate::parsing::parser::{ast_node, signature_of};
use crate::parsing::resolution::ReferenceKind;
use crate::parsing::{Language, LanguageParser};
use crate::types::{FileId, NodeId};
use std::path::Path;
use tree_sitter::{Node, Parser};

pub struct TypeScriptParser {
    parser: Parser,
}

impl std::fmt::Debug for TypeScriptParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeScriptParser")
            .field("language", &"TypeScript")
            .finish()
    }
}

impl TypeScriptParser {
    pub fn new() -> Result<Self, String> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            .map_err(|e| format!("Failed to set TypeScript language: {e}"))?;

        Ok(Self { parser })
    }
}

impl LanguageParser for TypeScriptParser {
    fn parse(&mut self, code: &str, file_id: FileId, path: &Path) -> ParseResult<FileAst> {
        let tree = self
            .parser
            .parse(code, None)
            .ok_or_else(|| ParseError::NoTree {
                path: path.to_path_buf(),
            })?;

        let mut extractor = ScriptExtractor::new(file_id, path, Language::TypeScript, code);
        extractor.visit_children(tree.root_node(), NodeId::ROOT, 0);
        Ok(extractor.ast)
    }

    fn language(&self) -> Language {
        Language::TypeScript
    }
}

impl ScriptExtractor<'_> {
    /// TypeScript-only node kinds. Returns `false` to fall through to the
    /// JavaScript rules.
    pub(crate) fn visit_typescript(&mut self, node: Node, parent: NodeId, depth: usize) -> bool {
        match node.kind() {
            "interface_declaration" => self.interface(node, parent, depth),
            "type_alias_declaration" => self.type_alias(node, parent, depth),
            "enum_declaration" => self.enumeration(node, parent),
            "internal_module" | "module" => self.namespace(node, parent, depth),
            "method_signature" | "abstract_method_signature" => {
                if let Some(name) = node.child_by_field_name("name") {
                    let name = self.text(name);
                    self.callable(node, name, NodeKind::Method, parent, depth);
                }
            }
            "function_signature" => {
                if let Some(name) = node.child_by_field_name("name") {
                    let name = self.text(name);
                    self.callable(node, name, NodeKind::Function, parent, depth);
                }
            }
            "property_signature" => self.property_signature(node, parent, depth),
            "type_annotation" => {
                for child in node.named_children(&mut node.walk()) {
                    self.type_reference(child, parent, depth + 1);
                }
            }
            "type_identifier" | "generic_type" | "nested_type_identifier" | "array_type"
            | "union_type" | "intersection_type" => self.type_reference(node, parent, depth),
            "predefined_type" | "type_parameters" => {}
            _ => return false,
        }
        true
    }

    /// Record a `Type` node for each named type inside a type expression
    fn type_reference(&mut self, node: Node, parent: NodeId, depth: usize) {
        if depth > crate::parsing::parser::MAX_AST_DEPTH {
            return;
        }
        match node.kind() {
            "type_identifier" | "nested_type_identifier" | "array_type" => {
                let name = collapse(self.text(node));
                self.ast.add_child(parent, ast_node(NodeKind::Type, &name, node));
            }
            "generic_type" => {
                let name = collapse(self.text(node));
                self.ast.add_child(parent, ast_node(NodeKind::Type, &name, node));
                if let Some(arguments) = node.child_by_field_name("type_arguments") {
                    for argument in arguments.named_children(&mut arguments.walk()) {
                        self.type_reference(argument, parent, depth + 1);
                    }
                }
            }
            "union_type" | "intersection_type" | "parenthesized_type" => {
                for child in node.named_children(&mut node.walk()) {
                    self.type_reference(child, parent, depth + 1);
                }
            }
            _ => {}
        }
    }

    fn interface(&mut self, node: Node, parent: NodeId, depth: usize) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let mut interface = ast_node(NodeKind::Interface, self.text(name_node), node)
            .with_signature(signature_of(node, self.code));
        interface.docstring = self.doc_for(node);

        for clause in node
            .children(&mut node.walk())
            .filter(|c| c.kind() == "extends_type_clause")
        {
            for base in clause.named_children(&mut clause.walk()) {
                interface.pending.push(PendingReference::new(
                    ReferenceKind::Extension,
                    collapse(self.text(base)),
                ));
            }
        }

        let id = self.ast.add_child(parent, interface);
        if let Some(body) = node.child_by_field_name("body") {
            for member in body.named_children(&mut body.walk()) {
                self.visit(member, id, depth + 1);
            }
        }
    }

    fn property_signature(&mut self, node: Node, owner: NodeId, depth: usize) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let property = ast_node(NodeKind::Property, self.text(name_node), node)
            .with_signature(signature_of(node, self.code))
            .with_flags(NodeFlags::DECLARATION);
        let id = self.ast.add_child(owner, property);
        if let Some(ty) = node.child_by_field_name("type") {
            self.visit(ty, id, depth + 1);
        }
    }

    fn type_alias(&mut self, node: Node, parent: NodeId, depth: usize) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let mut alias = ast_node(NodeKind::Typedef, self.text(name_node), node)
            .with_signature(signature_of(node, self.code));
        alias.docstring = self.doc_for(node);
        let id = self.ast.add_child(parent, alias);
        if let Some(value) = node.child_by_field_name("value") {
            self.type_reference(value, id, depth + 1);
        }
    }

    fn enumeration(&mut self, node: Node, parent: NodeId) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let mut enumeration = ast_node(NodeKind::Enum, self.text(name_node), node)
            .with_signature(signature_of(node, self.code));
        enumeration.docstring = self.doc_for(node);
        let id = self.ast.add_child(parent, enumeration);

        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        for member in body.named_children(&mut body.walk()) {
            let name = match member.kind() {
                "property_identifier" | "string" => Some(member),
                "enum_assignment" => member.child_by_field_name("name"),
                _ => None,
            };
            if let Some(name) = name {
                let variant = ast_node(
                    NodeKind::Property,
                    self.text(name).trim_matches(|c| c == '\'' || c == '"'),
                    member,
                );
                self.ast.add_child(id, variant);
            }
        }
    }

    fn namespace(&mut self, node: Node, parent: NodeId, depth: usize) {
        let Some(name_node) = node.child_by_field_name("name") else {
            self.visit_children(node, parent, depth);
            return;
        };
        let name = self.text(name_node).trim_matches(|c| c == '\'' || c == '"');
        let namespace = ast_node(NodeKind::Namespace, name, node)
            .with_signature(signature_of(node, self.code));
        let id = self.ast.add_child(parent, namespace);
        if let Some(body) = node.child_by_field_name("body") {
            self.visit_children(body, id, depth + 1);
        }
    }
}
