//! JavaScript parser implementation
//!
//! Shares its extractor with the TypeScript parser. Each file is a module
//! named after its stem; ES imports and `require()` calls both become
//! `Import` nodes carrying the module specifier.

use crate::ast::{FileAst, NodeFlags, NodeKind, PendingReference};
use crate::error::{ParseError, ParseResult};
use crate::parsing::c::parser::collapse;
use crate::parsing::parser::{
    ast_node, check_recursion_depth, doc_comment_before, make_module_root, node_text, signature_of,
};
use crate::parsing::resolution::ReferenceKind;
use crate::parsing::{Language, LanguageParser};
use crate::types::{FileId, NodeId};
use std::path::Path;
use tree_sitter::{Node, Parser};

pub struct JavaScriptParser {
    parser: Parser,
}

impl std::fmt::Debug for JavaScriptParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JavaScriptParser")
            .field("language", &"JavaScript")
            .finish()
    }
}

impl JavaScriptParser {
    pub fn new() -> Result<Self, String> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_javascript::LANGUAGE.into())
            .map_err(|e| format!("Failed to set JavaScript language: {e}"))?;

        Ok(Self { parser })
    }
}

impl LanguageParser for JavaScriptParser {
    fn parse(&mut self, code: &str, file_id: FileId, path: &Path) -> ParseResult<FileAst> {
        let tree = self
            .parser
            .parse(code, None)
            .ok_or_else(|| ParseError::NoTree {
                path: path.to_path_buf(),
            })?;

        let mut extractor = ScriptExtractor::new(file_id, path, Language::JavaScript, code);
        extractor.visit_children(tree.root_node(), NodeId::ROOT, 0);
        Ok(extractor.ast)
    }

    fn language(&self) -> Language {
        Language::JavaScript
    }
}

/// Strip the quotes from a string literal node's text
fn unquote(text: &str) -> &str {
    text.trim_matches(|c| c == '\'' || c == '"' || c == '`')
}

/// Walks a JavaScript or TypeScript syntax tree into a [`FileAst`]
pub(crate) struct ScriptExtractor<'a> {
    pub(crate) ast: FileAst,
    pub(crate) code: &'a str,
    pub(crate) typescript: bool,
}

impl<'a> ScriptExtractor<'a> {
    pub(crate) fn new(file_id: FileId, path: &Path, language: Language, code: &'a str) -> Self {
        let mut ast = FileAst::new(file_id, path, language);
        make_module_root(&mut ast, code);
        Self {
            ast,
            code,
            typescript: language == Language::TypeScript,
        }
    }

    pub(crate) fn text(&self, node: Node) -> &'a str {
        node_text(node, self.code)
    }

    /// Doc comment for a declaration, looking past a wrapping `export`
    pub(crate) fn doc_for(&self, node: Node) -> Option<String> {
        let anchor = node
            .parent()
            .filter(|p| p.kind() == "export_statement")
            .unwrap_or(node);
        doc_comment_before(anchor, self.code)
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
        if self.typescript && self.visit_typescript(node, parent, depth) {
            return;
        }

        match node.kind() {
            "import_statement" => self.import(node, parent),
            "export_statement" => self.export(node, parent, depth),
            "function_declaration" | "generator_function_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    let name = self.text(name);
                    self.callable(node, name, NodeKind::Function, parent, depth);
                }
            }
            "class_declaration" | "class" | "abstract_class_declaration" => {
                self.class(node, parent, depth)
            }
            "method_definition" => {
                if let Some(name) = node.child_by_field_name("name") {
                    let name = self.text(name);
                    self.callable(node, name, NodeKind::Method, parent, depth);
                }
            }
            "field_definition" | "public_field_definition" => self.field(node, parent, depth),
            "lexical_declaration" | "variable_declaration" => {
                self.declarations(node, parent, depth)
            }
            "call_expression" => self.call(node, parent, depth),
            "new_expression" => self.construction(node, parent, depth),
            "comment" => {}
            _ => self.visit_children(node, parent, depth),
        }
    }

    fn import(&mut self, node: Node, parent: NodeId) {
        let Some(source) = node.child_by_field_name("source") else {
            return;
        };
        let specifier = unquote(self.text(source));
        let mut import = ast_node(NodeKind::Import, specifier, node)
            .with_raw_content(self.text(node).trim());
        if self.text(node).starts_with("import type") {
            import.set_property("type_only", "true");
        }
        self.ast.add_child(parent, import);
    }

    /// Visit the exported declaration and flag what it added at this level
    fn export(&mut self, node: Node, parent: NodeId, depth: usize) {
        let first_new = self.ast.len();
        match node.child_by_field_name("declaration") {
            Some(declaration) => self.visit(declaration, parent, depth + 1),
            None => self.visit_children(node, parent, depth),
        }

        let added: Vec<NodeId> = (first_new..self.ast.len())
            .map(|i| NodeId(i as u32))
            .collect();
        for id in added {
            if let Some(n) = self.ast.node_mut(id) {
                if n.parent == Some(parent) && n.kind != NodeKind::Call {
                    n.flags |= NodeFlags::EXPORTED;
                }
            }
        }
    }

    /// Function, method or arrow function bound to `name`
    pub(crate) fn callable(
        &mut self,
        node: Node,
        name: &str,
        kind: NodeKind,
        parent: NodeId,
        depth: usize,
    ) -> NodeId {
        let mut function = ast_node(kind, name, node).with_signature(signature_of(node, self.code));
        function.docstring = self.doc_for(node);
        if node.child_by_field_name("body").is_none() {
            function.flags |= NodeFlags::DECLARATION;
        }
        let id = self.ast.add_child(parent, function);

        if let Some(params) = node
            .child_by_field_name("parameters")
            .or_else(|| node.child_by_field_name("parameter"))
        {
            self.parameters(params, id, depth);
        }
        if let Some(return_type) = node.child_by_field_name("return_type") {
            self.visit(return_type, id, depth + 1);
        }
        if let Some(body) = node.child_by_field_name("body") {
            if body.kind() == "statement_block" {
                self.visit_children(body, id, depth + 1);
            } else {
                // Expression-bodied arrow function
                self.visit(body, id, depth + 1);
            }
        }
        id
    }

    fn parameters(&mut self, params: Node, owner: NodeId, depth: usize) {
        let list: Vec<Node> = if params.kind() == "identifier" {
            vec![params]
        } else {
            params.named_children(&mut params.walk()).collect()
        };

        for param in list {
            let name_node = match param.kind() {
                "identifier" => Some(param),
                "required_parameter" | "optional_parameter" => param
                    .child_by_field_name("pattern")
                    .filter(|p| p.kind() == "identifier"),
                "assignment_pattern" => param
                    .child_by_field_name("left")
                    .filter(|p| p.kind() == "identifier"),
                _ => None,
            };
            let Some(name_node) = name_node else {
                continue;
            };

            let mut parameter = ast_node(NodeKind::Parameter, self.text(name_node), param)
                .with_signature(collapse(self.text(param)));
            let annotation = param.child_by_field_name("type");
            if let Some(ty) = annotation {
                parameter.set_property("type", self.text(ty).trim_start_matches(':').trim());
            }
            self.ast.add_child(owner, parameter);
            if let Some(ty) = annotation {
                self.visit(ty, owner, depth + 1);
            }
        }
    }

    fn class(&mut self, node: Node, parent: NodeId, depth: usize) {
        let body = node.child_by_field_name("body");
        let Some(name_node) = node.child_by_field_name("name") else {
            if let Some(body) = body {
                self.visit_children(body, parent, depth);
            }
            return;
        };

        let mut class = ast_node(NodeKind::Class, self.text(name_node), node)
            .with_signature(signature_of(node, self.code));
        class.docstring = self.doc_for(node);

        for heritage in node
            .children(&mut node.walk())
            .filter(|c| c.kind() == "class_heritage")
        {
            for clause in heritage.named_children(&mut heritage.walk()) {
                match clause.kind() {
                    "extends_clause" => {
                        for base in clause.named_children(&mut clause.walk()) {
                            if base.kind() != "type_arguments" {
                                class.pending.push(PendingReference::new(
                                    ReferenceKind::Inheritance,
                                    collapse(self.text(base)),
                                ));
                            }
                        }
                    }
                    "implements_clause" => {
                        for interface in clause.named_children(&mut clause.walk()) {
                            class.pending.push(PendingReference::new(
                                ReferenceKind::Implementation,
                                collapse(self.text(interface)),
                            ));
                        }
                    }
                    // JavaScript: `extends <expression>`
                    _ => class.pending.push(PendingReference::new(
                        ReferenceKind::Inheritance,
                        collapse(self.text(clause)),
                    )),
                }
            }
        }

        let id = self.ast.add_child(parent, class);
        if let Some(body) = body {
            for member in body.named_children(&mut body.walk()) {
                self.visit(member, id, depth + 1);
            }
        }
    }

    fn field(&mut self, node: Node, owner: NodeId, depth: usize) {
        let Some(name_node) = node
            .child_by_field_name("property")
            .or_else(|| node.child_by_field_name("name"))
        else {
            return;
        };

        let mut field = ast_node(NodeKind::Property, self.text(name_node), node)
            .with_signature(signature_of(node, self.code));
        if self.text(node).trim_start().starts_with("static") {
            field.flags |= NodeFlags::STATIC;
        }
        let id = self.ast.add_child(owner, field);

        if let Some(ty) = node.child_by_field_name("type") {
            self.visit(ty, id, depth + 1);
        }
        if let Some(value) = node.child_by_field_name("value") {
            self.visit(value, owner, depth + 1);
        }
    }

    fn declarations(&mut self, node: Node, parent: NodeId, depth: usize) {
        let declarators: Vec<Node> = node
            .named_children(&mut node.walk())
            .filter(|c| c.kind() == "variable_declarator")
            .collect();

        for declarator in declarators {
            let Some(name_node) = declarator
                .child_by_field_name("name")
                .filter(|n| n.kind() == "identifier")
            else {
                if let Some(value) = declarator.child_by_field_name("value") {
                    self.visit(value, parent, depth + 1);
                }
                continue;
            };
            let name = self.text(name_node);
            let value = declarator.child_by_field_name("value");

            if let Some(function) = value.filter(|v| {
                matches!(
                    v.kind(),
                    "arrow_function" | "function_expression" | "function" | "generator_function"
                )
            }) {
                let id = self.callable(function, name, NodeKind::Function, parent, depth);
                if let Some(n) = self.ast.node_mut(id) {
                    n.signature = Some(signature_of(node, self.code));
                }
                continue;
            }

            let text = self.text(node);
            let first_line = text.lines().next().unwrap_or(text);
            let mut variable = ast_node(NodeKind::Variable, name, declarator)
                .with_signature(collapse(first_line).trim_end_matches(';').to_string());
            variable.docstring = self.doc_for(node);
            let annotation = declarator.child_by_field_name("type");
            if let Some(ty) = annotation {
                variable.set_property("type", self.text(ty).trim_start_matches(':').trim());
            }
            let id = self.ast.add_child(parent, variable);

            if let Some(ty) = annotation {
                self.visit(ty, id, depth + 1);
            }
            if let Some(value) = value {
                self.visit(value, parent, depth + 1);
            }
        }
    }

    fn call(&mut self, node: Node, parent: NodeId, depth: usize) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        let arguments = node.child_by_field_name("arguments");

        // require('./x') and import('./x') load a module
        let loads_module = matches!(function.kind(), "import")
            || (function.kind() == "identifier" && self.text(function) == "require");
        if loads_module {
            let specifier = arguments
                .and_then(|args| args.named_child(0))
                .filter(|arg| arg.kind() == "string");
            if let Some(specifier) = specifier {
                let import = ast_node(NodeKind::Import, unquote(self.text(specifier)), node)
                    .with_raw_content(collapse(self.text(node)));
                self.ast.add_child(parent, import);
                return;
            }
        }

        let callee: String = self.text(function).split_whitespace().collect();
        self.ast.add_child(parent, ast_node(NodeKind::Call, &callee, node));

        if function.kind() != "identifier" {
            self.visit_children(function, parent, depth + 1);
        }
        if let Some(arguments) = arguments {
            self.visit_children(arguments, parent, depth + 1);
        }
    }

    fn construction(&mut self, node: Node, parent: NodeId, depth: usize) {
        if let Some(constructor) = node.child_by_field_name("constructor") {
            let callee = collapse(self.text(constructor));
            self.ast.add_child(parent, ast_node(NodeKind::Call, &callee, node));
        }
        if let Some(arguments) = node.child_by_field_name("arguments") {
            self.visit_children(arguments, parent, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
import { format } from './lib/util';
const helper = require('./helper');

/** Greets someone */
export function greet(name) {
  return format(name);
}

class Greeter extends Base {
  constructor() { this.count = 0; }
  hello() { return greet('x'); }
}

const shout = (s) => s.toUpperCase();
"#;

    fn find(ast: &FileAst, kind: NodeKind, name: &str) -> NodeId {
        ast.iter()
            .find(|(_, n)| n.kind == kind && n.name == name)
            .map(|(id, _)| id)
            .unwrap_or_else(|| panic!("no {kind} named {name}"))
    }

    fn parse() -> FileAst {
        let mut parser = JavaScriptParser::new().unwrap();
        parser.parse(SOURCE, FileId(2), Path::new("src/app.js")).unwrap()
    }

    #[test]
    fn test_imports_and_exports() {
        let ast = parse();
        assert_eq!(ast.root().kind, NodeKind::Module);
        assert_eq!(ast.root().name, "app");

        find(&ast, NodeKind::Import, "./lib/util");
        find(&ast, NodeKind::Import, "./helper");
        find(&ast, NodeKind::Variable, "helper");

        let greet = ast.node(find(&ast, NodeKind::Function, "greet")).unwrap();
        assert!(greet.flags.contains(NodeFlags::EXPORTED));
        assert_eq!(greet.docstring.as_deref(), Some("Greets someone"));
        assert_eq!(greet.signature.as_deref(), Some("function greet(name)"));
    }

    #[test]
    fn test_classes_and_calls() {
        let ast = parse();

        let greeter_id = find(&ast, NodeKind::Class, "Greeter");
        let greeter = ast.node(greeter_id).unwrap();
        assert!(!greeter.flags.contains(NodeFlags::EXPORTED));
        assert_eq!(greeter.pending.len(), 1);
        assert_eq!(greeter.pending[0].kind, ReferenceKind::Inheritance);
        assert_eq!(greeter.pending[0].name, "Base");

        let hello = ast.find_child(greeter_id, "hello").unwrap();
        assert!(ast.find_child(greeter_id, "constructor").is_some());
        let call = ast.node(find(&ast, NodeKind::Call, "greet")).unwrap();
        assert_eq!(call.parent, Some(hello));

        let format = ast.node(find(&ast, NodeKind::Call, "format")).unwrap();
        assert_eq!(format.parent, Some(find(&ast, NodeKind::Function, "greet")));

        let shout = find(&ast, NodeKind::Function, "shout");
        assert!(ast.find_child(shout, "s").is_some());
        let upper = ast.node(find(&ast, NodeKind::Call, "s.toUpperCase")).unwrap();
        assert_eq!(upper.parent, Some(shout));
    }
}
