//! Registration of a parsed file's declarations into the global table

use super::table::{GlobalSymbolTable, SymbolEntry, SymbolScope};
use crate::ast::{FileAst, NodeFlags, NodeKind};
use crate::types::{EntryId, NodeId};
use tracing::debug;

fn is_registrable(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Function
            | NodeKind::Method
            | NodeKind::Class
            | NodeKind::Struct
            | NodeKind::Union
            | NodeKind::Enum
            | NodeKind::Variable
            | NodeKind::Typedef
            | NodeKind::Namespace
            | NodeKind::Interface
            | NodeKind::Module
            | NodeKind::Macro
            | NodeKind::Using
            | NodeKind::Friend
            | NodeKind::Operator
    )
}

fn scope_for(kind: NodeKind, flags: NodeFlags) -> SymbolScope {
    if flags.contains(NodeFlags::STATIC) {
        SymbolScope::File
    } else if flags.contains(NodeFlags::EXPORTED) {
        SymbolScope::Global
    } else if matches!(kind, NodeKind::Module | NodeKind::Namespace) {
        SymbolScope::Global
    } else {
        SymbolScope::File
    }
}

/// Walk `ast` and register every declaration worth indexing.
///
/// Qualified names are built by joining the enclosing scope and the node's
/// name with the language separator, and are written back onto the nodes.
/// Variables are only registered at file or module level. Returns the
/// number of entries added.
pub fn register_file_symbols(table: &mut GlobalSymbolTable, ast: &mut FileAst) -> usize {
    let language = ast.language();
    let sep = language.scope_separator();
    let file_path = ast.path().to_path_buf();
    let module_path = match ast.root().kind {
        NodeKind::Module if !ast.root().name.is_empty() => Some(ast.root().name.clone()),
        _ => None,
    };

    let mut count = 0;
    // (node, enclosing scope, enclosing entry)
    let mut stack: Vec<(NodeId, String, Option<EntryId>)> = vec![(NodeId::ROOT, String::new(), None)];

    while let Some((id, scope, parent_entry)) = stack.pop() {
        let Some(node) = ast.node(id) else {
            continue;
        };

        let mut child_scope = scope.clone();
        let mut child_parent = parent_entry;

        let file_level = node
            .parent
            .and_then(|p| ast.node(p))
            .is_some_and(|p| matches!(p.kind, NodeKind::Root | NodeKind::Module));
        let wanted = is_registrable(node.kind)
            && !node.name.is_empty()
            && (node.kind != NodeKind::Variable || file_level);

        if wanted {
            let qualified = if scope.is_empty() {
                node.name.clone()
            } else {
                format!("{scope}{sep}{}", node.name)
            };

            let mut entry = SymbolEntry::new(
                qualified.clone(),
                ast.node_ref(id),
                node.kind,
                file_path.clone(),
                scope_for(node.kind, node.flags),
                language,
            )
            .with_definition(node.is_definition())
            .with_parent(parent_entry);
            if let Some(module) = &module_path {
                entry = entry.with_module_path(module.clone());
            }

            let kind = node.kind;
            let entry_id = table.register(entry);
            count += 1;
            debug!("Registered {kind} symbol: {qualified}");

            if kind.opens_scope() {
                child_scope = qualified.clone();
                child_parent = Some(entry_id);
            }
            if let Some(node) = ast.node_mut(id) {
                node.qualified_name = qualified;
            }
        }

        if let Some(node) = ast.node(id) {
            for child in node.children.iter().rev() {
                stack.push((*child, child_scope.clone(), child_parent));
            }
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstNode;
    use crate::parsing::Language;
    use crate::types::FileId;

    #[test]
    fn test_nested_scopes_build_qualified_names() {
        let mut ast = FileAst::new(FileId(1), "geo.cpp", Language::Cpp);
        let ns = ast.add_child(NodeId::ROOT, AstNode::new(NodeKind::Namespace, "geo"));
        let class = ast.add_child(ns, AstNode::new(NodeKind::Class, "Point"));
        let method = ast.add_child(class, AstNode::new(NodeKind::Method, "norm"));
        let func = ast.add_child(NodeId::ROOT, AstNode::new(NodeKind::Function, "main"));
        let local = ast.add_child(func, AstNode::new(NodeKind::Variable, "tmp"));

        let mut table = GlobalSymbolTable::new(16);
        let count = register_file_symbols(&mut table, &mut ast);

        assert_eq!(count, 4);
        assert!(table.lookup("geo").is_some());
        assert!(table.lookup("geo::Point").is_some());
        let norm = table.lookup("geo::Point::norm").unwrap();
        assert_eq!(norm.node.node, method);
        let parent = table.entry(norm.parent.unwrap()).unwrap();
        assert_eq!(parent.qualified_name, "geo::Point");
        assert!(table.lookup("tmp").is_none());
        assert_eq!(ast.node(class).unwrap().qualified_name, "geo::Point");
        assert!(ast.node(local).unwrap().qualified_name.is_empty());
    }

    #[test]
    fn test_flags_drive_scope_and_definition() {
        let mut ast = FileAst::new(FileId(2), "util.c", Language::C);
        ast.add_child(
            NodeId::ROOT,
            AstNode::new(NodeKind::Function, "helper").with_flags(NodeFlags::STATIC),
        );
        ast.add_child(
            NodeId::ROOT,
            AstNode::new(NodeKind::Function, "proto").with_flags(NodeFlags::DECLARATION),
        );
        ast.add_child(NodeId::ROOT, AstNode::new(NodeKind::Variable, "counter"));

        let mut table = GlobalSymbolTable::new(16);
        assert_eq!(register_file_symbols(&mut table, &mut ast), 3);
        assert_eq!(table.lookup("helper").unwrap().scope, SymbolScope::File);
        assert!(!table.lookup("proto").unwrap().is_definition);
        assert_eq!(table.lookup("counter").unwrap().kind, NodeKind::Variable);
    }

    #[test]
    fn test_module_root_sets_module_path() {
        let mut ast = FileAst::new(FileId(3), "pkg/models.py", Language::Python);
        {
            let root = ast.root_mut();
            root.kind = NodeKind::Module;
            root.name = "models".to_string();
        }
        ast.add_child(NodeId::ROOT, AstNode::new(NodeKind::Class, "User"));

        let mut table = GlobalSymbolTable::new(16);
        assert_eq!(register_file_symbols(&mut table, &mut ast), 2);
        let module = table.lookup("models").unwrap();
        assert_eq!(module.kind, NodeKind::Module);
        assert_eq!(module.scope, SymbolScope::Global);
        let user = table.lookup("User").unwrap();
        assert_eq!(user.module_path.as_deref(), Some("models"));
    }
}
