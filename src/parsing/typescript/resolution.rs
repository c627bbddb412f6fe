//! TypeScript-specific reference resolution
//!
//! Type-level references are handled here; everything else is delegated to
//! the JavaScript resolver.
//! - primitive types resolve without a target
//! - generic instantiations resolve to their base type
//! - type parameters of an enclosing declaration resolve without a target
//! - interfaces win over other declarations of the same name

use crate::ast::NodeKind;
use crate::parsing::javascript::resolution::resolve_javascript;
use crate::parsing::resolution::{
    LanguageResolver, ReferenceKind, ReferenceRequest, Resolution, ResolveContext, ResolverStats,
};
use crate::types::NodeRef;

const PRIMITIVE_TYPES: &[&str] = &[
    "string",
    "number",
    "boolean",
    "any",
    "unknown",
    "never",
    "void",
    "undefined",
    "null",
    "object",
    "symbol",
    "bigint",
];

#[derive(Debug, Default)]
pub struct TypeScriptResolver {
    stats: ResolverStats,
}

impl TypeScriptResolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LanguageResolver for TypeScriptResolver {
    fn resolve(&mut self, cx: &ResolveContext<'_>, request: &ReferenceRequest<'_>) -> Resolution {
        let outcome = resolve_typescript(cx, request);
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

fn is_type_reference(kind: ReferenceKind) -> bool {
    matches!(
        kind,
        ReferenceKind::Type
            | ReferenceKind::Interface
            | ReferenceKind::Implementation
            | ReferenceKind::Extension
            | ReferenceKind::Inheritance
            | ReferenceKind::Template
    )
}

/// `Map<string, User>` -> `Map`, `User[]` -> `User`
fn base_type(name: &str) -> &str {
    let name = name.trim();
    let name = name.split('<').next().unwrap_or(name);
    name.trim_end_matches("[]").trim()
}

/// Type parameter names declared in a signature such as
/// `class Box<T, U extends Base>`
fn type_parameters(signature: &str) -> Vec<&str> {
    let Some(open) = signature.find('<') else {
        return Vec::new();
    };
    let Some(close) = signature[open..].find('>') else {
        return Vec::new();
    };
    signature[open + 1..open + close]
        .split(',')
        .filter_map(|param| param.split_whitespace().next())
        .collect()
}

/// Whether `name` is a type parameter of a declaration enclosing `source`
fn is_enclosing_type_parameter(cx: &ResolveContext<'_>, source: NodeRef, name: &str) -> bool {
    cx.node(source)
        .into_iter()
        .chain(cx.ancestors(source))
        .filter_map(|node| node.signature.as_deref())
        .any(|sig| type_parameters(sig).contains(&name))
}

fn resolve_typescript(cx: &ResolveContext<'_>, request: &ReferenceRequest<'_>) -> Resolution {
    let name = request.name.trim();
    let base = base_type(name);

    if PRIMITIVE_TYPES.contains(&base) {
        return Resolution::builtin();
    }

    if is_type_reference(request.kind) {
        if is_enclosing_type_parameter(cx, request.source, base) {
            return Resolution::builtin();
        }

        if let Some(entry) = cx.lookup_kind(base, |k| k == NodeKind::Interface) {
            return Resolution::found(entry.node);
        }
        if let Some(entry) = cx.lookup_kind(base, |k| k.is_type_like()) {
            return Resolution::found(entry.node);
        }
    }

    let narrowed = ReferenceRequest {
        name: base,
        ..*request
    };
    resolve_javascript(cx, &narrowed)
}
