//! C-specific reference resolution
//!
//! C scoping is flat: a name is either global, file-static or a struct
//! member. Lookup order:
//! 1. exact name
//! 2. enclosing scope + `::` + name
//! 3. struct/union member access (`p->x`, `p.x`)
//! 4. generic scope lookup

use crate::ast::{AstNode, NodeKind};
use crate::parsing::resolution::{
    LanguageResolver, ReferenceKind, ReferenceRequest, Resolution, ResolveContext, ResolverStats,
    resolve_generic,
};
use crate::symbol::SymbolEntry;
use crate::types::NodeRef;

/// Words that can precede a type name in a declaration
const TYPE_QUALIFIERS: &[&str] = &[
    "struct", "union", "enum", "class", "const", "volatile", "static", "extern", "register",
    "unsigned", "signed", "inline", "restrict", "mutable", "auto",
];

#[derive(Debug, Default)]
pub struct CResolver {
    stats: ResolverStats,
}

impl CResolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LanguageResolver for CResolver {
    fn resolve(&mut self, cx: &ResolveContext<'_>, request: &ReferenceRequest<'_>) -> Resolution {
        let outcome = resolve_c(cx, request);
        self.stats.record(outcome.status);
        outcome
    }

    fn cleanup(&mut self) {
        self.stats = ResolverStats::default();
    }

    fn stats(&self) -> ResolverStats {
        self.stats
    }
}

/// C lookup ladder, also the last stage of C++ resolution
pub(crate) fn resolve_c(cx: &ResolveContext<'_>, request: &ReferenceRequest<'_>) -> Resolution {
    match request.kind {
        // Header targets are files, not symbols
        ReferenceKind::Include => return Resolution::not_supported(),
        ReferenceKind::Macro => {
            return cx
                .lookup_kind(request.name, |k| k == NodeKind::Macro)
                .into();
        }
        ReferenceKind::Member => return resolve_member_access(cx, request),
        _ => {}
    }

    if let Some(entry) = cx.table.lookup(request.name) {
        return Resolution::found(entry.node);
    }

    if let Some(scope) = cx.enclosing_scope(request.source) {
        let qualified = format!("{scope}::{}", request.name);
        if let Some(entry) = cx.table.lookup(&qualified) {
            return Resolution::found(entry.node);
        }
    }

    if split_member_access(request.name).is_some() {
        let member = resolve_member_access(cx, request);
        if member.is_success() {
            return member;
        }
    }

    resolve_generic(cx, request)
}

/// Split `base->field` or `base.field` at the last accessor
pub(crate) fn split_member_access(name: &str) -> Option<(&str, &str)> {
    let arrow = name.rfind("->").map(|i| (i, 2));
    let dot = name.rfind('.').map(|i| (i, 1));
    let (index, width) = match (arrow, dot) {
        (Some(a), Some(d)) => {
            if a.0 > d.0 {
                a
            } else {
                d
            }
        }
        (Some(a), None) => a,
        (None, Some(d)) => d,
        (None, None) => return None,
    };
    let base = name[..index].trim();
    let field = name[index + width..].trim();
    if base.is_empty() || field.is_empty() {
        None
    } else {
        Some((base, field))
    }
}

/// Resolve `p->x` by finding `p`'s declared type and scanning that
/// struct's fields for `x`
fn resolve_member_access(cx: &ResolveContext<'_>, request: &ReferenceRequest<'_>) -> Resolution {
    let Some((base, field)) = split_member_access(request.name) else {
        return Resolution::not_found();
    };

    // Chained access (a.b->c) resolves only the final hop against the
    // nearest identifier
    let base_name = split_member_access(base).map_or(base, |(_, last)| last);

    let type_name = declared_type_of(cx, request.source, base_name)
        .unwrap_or_else(|| base_name.to_string());

    let Some(owner) = find_aggregate(cx, &type_name) else {
        return Resolution::not_found();
    };

    cx.find_member(owner.node, field)
        .map_or_else(Resolution::not_found, Resolution::found)
}

/// Typedef chains longer than this are treated as unresolvable
const MAX_TYPEDEF_HOPS: usize = 8;

fn is_aggregate(kind: NodeKind) -> bool {
    matches!(kind, NodeKind::Struct | NodeKind::Union | NodeKind::Class)
}

/// Struct, union or class entry for `type_name`.
///
/// A real aggregate wins over a typedef of the same name
/// (`typedef struct Point Point;`). A typedef alone is followed to the
/// type it aliases.
pub(crate) fn find_aggregate<'a>(
    cx: &ResolveContext<'a>,
    type_name: &str,
) -> Option<&'a SymbolEntry> {
    let mut name = type_name.to_string();
    for _ in 0..MAX_TYPEDEF_HOPS {
        let entry = cx
            .lookup_kind(&name, is_aggregate)
            .or_else(|| cx.lookup_kind(&name, |k| k == NodeKind::Typedef))
            .or_else(|| {
                let hit = cx
                    .table
                    .scope_lookup(&name, None, crate::parsing::Language::C)?;
                (is_aggregate(hit.kind) || hit.kind == NodeKind::Typedef).then_some(hit)
            })?;
        if is_aggregate(entry.kind) {
            return Some(entry);
        }

        let target = cx
            .node(entry.node)
            .and_then(|alias| alias.property("type"))
            .and_then(|ty| {
                ty.split_whitespace()
                    .filter(|w| !TYPE_QUALIFIERS.contains(w))
                    .last()
            })?;
        if target == name {
            return None;
        }
        name = target.to_string();
    }
    None
}

/// Declared type of the variable `var` visible from `source`.
///
/// Searches enclosing blocks innermost first, then file-level variables in
/// the symbol table.
fn declared_type_of(cx: &ResolveContext<'_>, source: NodeRef, var: &str) -> Option<String> {
    let is_binding = |n: &AstNode| {
        n.name == var
            && matches!(
                n.kind,
                NodeKind::Variable | NodeKind::Parameter | NodeKind::VariableDeclaration
            )
    };

    let file = cx.nodes.file(source.file)?;
    for ancestor in file.ancestors(source.node) {
        let Some(scope) = file.node(ancestor) else {
            continue;
        };
        let found = scope
            .children
            .iter()
            .filter_map(|id| file.node(*id))
            .find(|n| is_binding(n));
        if let Some(binding) = found {
            return type_of_binding(binding);
        }
    }

    cx.lookup_kind(var, |k| k == NodeKind::Variable)
        .and_then(|entry| cx.node(entry.node))
        .and_then(type_of_binding)
}

fn type_of_binding(node: &AstNode) -> Option<String> {
    if let Some(ty) = node.property("type") {
        return Some(ty.to_string());
    }
    node.signature
        .as_deref()
        .and_then(|sig| type_from_declaration(sig, &node.name))
}

/// Extract the type name from a declaration such as `struct Point *p`
pub(crate) fn type_from_declaration(declaration: &str, var: &str) -> Option<String> {
    let words: Vec<&str> = declaration
        .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == ':'))
        .filter(|w| !w.is_empty() && !TYPE_QUALIFIERS.contains(w))
        .collect();
    let position = words.iter().position(|w| *w == var)?;
    position
        .checked_sub(1)
        .map(|i| words[i].trim_start_matches("::").to_string())
}
