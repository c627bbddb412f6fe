//! C++-specific reference resolution
//!
//! Extends the C ladder with:
//! - `::name` global-scope lookup
//! - template names (`vector<int>` resolves to `vector`)
//! - `ns::name`, `Namespace::Class` and `Class::method` paths
//!
//! Anything left over goes through the C resolver.

use crate::ast::NodeKind;
use crate::parsing::c::resolution::resolve_c;
use crate::parsing::resolution::{
    LanguageResolver, ReferenceRequest, Resolution, ResolveContext, ResolverStats,
};

#[derive(Debug, Default)]
pub struct CppResolver {
    stats: ResolverStats,
}

impl CppResolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LanguageResolver for CppResolver {
    fn resolve(&mut self, cx: &ResolveContext<'_>, request: &ReferenceRequest<'_>) -> Resolution {
        let outcome = resolve_cpp(cx, request);
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

/// Drop template arguments: `std::map<K, V>::iterator` -> `std::map::iterator`
pub(crate) fn strip_template_args(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut depth = 0usize;
    for c in name.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

fn resolve_cpp(cx: &ResolveContext<'_>, request: &ReferenceRequest<'_>) -> Resolution {
    let mut name = request.name.trim();

    if let Some(global) = name.strip_prefix("::") {
        if let Some(entry) = cx.table.lookup(global) {
            return Resolution::found(entry.node);
        }
        name = global;
    }

    let stripped;
    if name.contains('<') {
        stripped = strip_template_args(name);
        if let Some(entry) = cx.table.lookup(&stripped) {
            return Resolution::found(entry.node);
        }
        name = &stripped;
    }

    if let Some((owner, member)) = name.rsplit_once("::") {
        if let Some(entry) = cx.table.lookup(name) {
            return Resolution::found(entry.node);
        }

        let scoped_owner = |k: NodeKind| {
            matches!(
                k,
                NodeKind::Namespace | NodeKind::Class | NodeKind::Struct | NodeKind::Union
            )
        };
        if let Some(owner_entry) = cx.lookup_kind(owner, scoped_owner) {
            if let Some(found) = cx.find_member(owner_entry.node, member) {
                return Resolution::found(found);
            }
        }

        // Qualified path relative to the enclosing namespace
        if let Some(scope) = cx.enclosing_scope(request.source) {
            if let Some(entry) = cx.table.lookup(&format!("{scope}::{name}")) {
                return Resolution::found(entry.node);
            }
        }
    }

    let narrowed = ReferenceRequest { name, ..*request };
    resolve_c(cx, &narrowed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::Language;
    use crate::parsing::resolution::testing::*;
    use crate::parsing::resolution::{ReferenceKind, ResolutionStatus};
    use crate::types::{NodeId, NodeRef};

    fn request(source: NodeRef, name: &str) -> ReferenceRequest<'_> {
        ReferenceRequest {
            source,
            kind: ReferenceKind::Call,
            name,
            language: Language::Cpp,
        }
    }

    #[test]
    fn test_namespace_and_method_paths() {
        let mut fx = Fixture::new();
        let mut ast = fx.file("geo.cpp", Language::Cpp);
        let ns = child(&mut ast, NodeId::ROOT, NodeKind::Namespace, "geo");
        let class = child(&mut ast, ns, NodeKind::Class, "Point");
        let norm = child(&mut ast, class, NodeKind::Method, "norm");
        let call = child(&mut ast, NodeId::ROOT, NodeKind::Call, "geo::Point::norm");
        let file = fx.add(ast);

        let cx = ResolveContext::new(&fx.table, &fx.store);
        let source = NodeRef::new(file, call);
        let mut resolver = CppResolver::new();

        let outcome = resolver.resolve(&cx, &request(source, "geo::Point::norm"));
        assert_eq!(outcome.target, Some(NodeRef::new(file, norm)));

        let outcome = resolver.resolve(&cx, &request(source, "::geo::Point"));
        assert_eq!(outcome.target, Some(NodeRef::new(file, class)));
        assert_eq!(resolver.stats().resolved, 2);
    }

    #[test]
    fn test_template_and_relative_paths() {
        let mut fx = Fixture::new();
        let mut ast = fx.file("box.hpp", Language::Cpp);
        let ns = child(&mut ast, NodeId::ROOT, NodeKind::Namespace, "util");
        let boxed = child(&mut ast, ns, NodeKind::Class, "Box");
        let inner = child(&mut ast, ns, NodeKind::Namespace, "detail");
        let helper = child(&mut ast, inner, NodeKind::Function, "pack");
        let func = child(&mut ast, ns, NodeKind::Function, "run");
        let call = child(&mut ast, func, NodeKind::Call, "detail::pack");
        let file = fx.add(ast);

        let cx = ResolveContext::new(&fx.table, &fx.store);
        let source = NodeRef::new(file, call);

        let outcome = resolve_cpp(&cx, &request(source, "util::Box<int>"));
        assert_eq!(outcome.target, Some(NodeRef::new(file, boxed)));

        let outcome = resolve_cpp(&cx, &request(source, "detail::pack"));
        assert_eq!(outcome.status, ResolutionStatus::Success);
        assert_eq!(outcome.target, Some(NodeRef::new(file, helper)));

        let outcome = resolve_cpp(&cx, &request(source, "::missing"));
        assert_eq!(outcome.status, ResolutionStatus::NotFound);
    }

    #[test]
    fn test_strip_template_args() {
        assert_eq!(strip_template_args("vector<int>"), "vector");
        assert_eq!(
            strip_template_args("std::map<K, std::pair<A, B>>::iterator"),
            "std::map::iterator"
        );
    }
}
