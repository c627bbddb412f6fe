//! Reference resolution orchestrator
//!
//! Holds the per-language resolver registry, dispatches each unresolved
//! reference to the resolver for the node's language (or the generic
//! fallback), records resolved edges on the AST and keeps running counts.

use crate::ast::{AstNode, AstStore, NodeKind};
use crate::parsing::Language;
use crate::parsing::c::CResolver;
use crate::parsing::cpp::CppResolver;
use crate::parsing::javascript::JavaScriptResolver;
use crate::parsing::python::PythonResolver;
use crate::parsing::resolution::{
    GenericResolver, LanguageResolver, ReferenceKind, ReferenceRequest, Resolution,
    ResolutionStatus, ResolveContext, ResolverStats,
};
use crate::parsing::typescript::TypeScriptResolver;
use crate::symbol::GlobalSymbolTable;
use crate::types::{FileId, NodeId, NodeRef};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// Running totals across every `resolve_*` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionStats {
    pub total: usize,
    pub resolved: usize,
    pub unresolved: usize,
}

/// Outcome of resolving one file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FileResolution {
    pub total: usize,
    pub resolved: usize,
}

impl FileResolution {
    pub fn unresolved(&self) -> usize {
        self.total - self.resolved
    }
}

/// One reference found on a node. `pending` is the index into the node's
/// front-end reference list when it came from there.
struct NodeReference {
    pending: Option<usize>,
    kind: ReferenceKind,
    name: String,
}

/// Path named by an include node: `#include "util.h"` -> `util.h`
fn include_path(node: &AstNode) -> String {
    let raw = node.raw_content.as_deref().unwrap_or(&node.name);
    let raw = raw.trim().trim_start_matches("#include").trim();
    raw.trim_matches(|c| c == '"' || c == '<' || c == '>')
        .to_string()
}

/// References carried by `node`: the ones recorded by the front end plus the
/// one implied by its kind
fn references_of(node: &AstNode) -> Vec<NodeReference> {
    let mut refs: Vec<NodeReference> = node
        .pending
        .iter()
        .enumerate()
        .map(|(i, pending)| NodeReference {
            pending: Some(i),
            kind: pending.kind,
            name: pending.name.clone(),
        })
        .collect();

    let implied = match node.kind {
        NodeKind::Call => Some((ReferenceKind::Call, node.name.clone())),
        NodeKind::Identifier => Some((ReferenceKind::Use, node.name.clone())),
        NodeKind::Type => Some((ReferenceKind::Type, node.name.clone())),
        NodeKind::Import => Some((ReferenceKind::Import, node.name.clone())),
        NodeKind::Include => Some((ReferenceKind::Include, include_path(node))),
        _ => None,
    };

    if let Some((kind, name)) = implied {
        let duplicate = refs.iter().any(|r| r.kind == kind && r.name == name);
        if !name.is_empty() && !duplicate {
            refs.push(NodeReference {
                pending: None,
                kind,
                name,
            });
        }
    }

    refs
}

/// Drives resolution over single nodes, files or whole projects.
///
/// Borrows the symbol table for its lifetime; it never owns it.
pub struct ReferenceResolver<'t> {
    table: &'t GlobalSymbolTable,
    resolvers: HashMap<Language, Box<dyn LanguageResolver>>,
    generic: GenericResolver,
    total_references: usize,
    resolved_references: usize,
}

impl std::fmt::Debug for ReferenceResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut languages: Vec<_> = self.resolvers.keys().collect();
        languages.sort();
        f.debug_struct("ReferenceResolver")
            .field("languages", &languages)
            .field("total_references", &self.total_references)
            .field("resolved_references", &self.resolved_references)
            .finish()
    }
}

impl<'t> ReferenceResolver<'t> {
    /// Create a resolver with no language resolvers registered
    pub fn new(table: &'t GlobalSymbolTable) -> Self {
        Self {
            table,
            resolvers: HashMap::new(),
            generic: GenericResolver::new(),
            total_references: 0,
            resolved_references: 0,
        }
    }

    /// Create a resolver with every built-in language registered
    pub fn with_builtin(table: &'t GlobalSymbolTable) -> Self {
        let mut resolver = Self::new(table);
        resolver.init_builtin();
        resolver
    }

    /// Register the built-in C, C++, Python, JavaScript and TypeScript resolvers
    pub fn init_builtin(&mut self) {
        self.register(Language::C, Box::new(CResolver::new()));
        self.register(Language::Cpp, Box::new(CppResolver::new()));
        self.register(Language::Python, Box::new(PythonResolver::new()));
        self.register(Language::JavaScript, Box::new(JavaScriptResolver::new()));
        self.register(Language::TypeScript, Box::new(TypeScriptResolver::new()));
    }

    /// Register `resolver` for `language`, cleaning up and replacing any
    /// previous one. Returns `true` when a resolver was replaced.
    pub fn register(&mut self, language: Language, resolver: Box<dyn LanguageResolver>) -> bool {
        match self.resolvers.insert(language, resolver) {
            Some(mut previous) => {
                previous.cleanup();
                debug!("Replaced {language} resolver");
                true
            }
            None => false,
        }
    }

    /// Remove the resolver for `language`. Returns `false` if none was registered.
    pub fn unregister(&mut self, language: Language) -> bool {
        match self.resolvers.remove(&language) {
            Some(mut previous) => {
                previous.cleanup();
                true
            }
            None => false,
        }
    }

    pub fn has_resolver(&self, language: Language) -> bool {
        self.resolvers.contains_key(&language)
    }

    pub fn stats(&self) -> ResolutionStats {
        ResolutionStats {
            total: self.total_references,
            resolved: self.resolved_references,
            unresolved: self.total_references - self.resolved_references,
        }
    }

    /// Counters kept by the resolver registered for `language`
    pub fn resolver_stats(&self, language: Language) -> Option<ResolverStats> {
        self.resolvers.get(&language).map(|r| r.stats())
    }

    fn dispatch(&mut self, cx: &ResolveContext<'_>, request: &ReferenceRequest<'_>) -> Resolution {
        match self.resolvers.get_mut(&request.language) {
            Some(resolver) => resolver.resolve(cx, request),
            None => self.generic.resolve(cx, request),
        }
    }

    fn record(&mut self, status: ResolutionStatus) {
        self.total_references += 1;
        if status.is_success() {
            self.resolved_references += 1;
        }
    }

    /// Resolve one reference carried by `source` and record the edge on
    /// success
    pub fn resolve_node(
        &mut self,
        store: &mut AstStore,
        source: NodeRef,
        kind: ReferenceKind,
        name: &str,
        language: Language,
    ) -> ResolutionStatus {
        let request = ReferenceRequest {
            source,
            kind,
            name,
            language,
        };
        let table = self.table;
        let outcome = {
            let cx = ResolveContext::new(table, &*store);
            self.dispatch(&cx, &request)
        };
        self.record(outcome.status);

        if let (true, Some(target)) = (outcome.is_success(), outcome.target) {
            if target != source {
                if let Some(node) = store.node_mut(source) {
                    node.add_reference(target);
                }
            }
        }
        outcome.status
    }

    /// Resolve every reference in one file. Returns the number resolved.
    pub fn resolve_file(&mut self, store: &mut AstStore, file: FileId) -> usize {
        self.resolve_file_with_stats(store, file).resolved
    }

    /// Resolve every reference in one file, visiting nodes breadth-first
    pub fn resolve_file_with_stats(&mut self, store: &mut AstStore, file: FileId) -> FileResolution {
        let table = self.table;
        let mut outcomes: Vec<(NodeId, Option<usize>, Resolution)> = Vec::new();

        {
            let Some(ast) = store.get(file) else {
                return FileResolution::default();
            };
            let cx = ResolveContext::new(table, &*store);

            for id in ast.bfs() {
                let Some(node) = ast.node(id) else {
                    continue;
                };
                let language = node.language.unwrap_or(ast.language());
                for reference in references_of(node) {
                    let request = ReferenceRequest {
                        source: ast.node_ref(id),
                        kind: reference.kind,
                        name: &reference.name,
                        language,
                    };
                    let outcome = self.dispatch(&cx, &request);
                    crate::debug_print!(
                        self,
                        "{} {} '{}' -> {:?}",
                        language,
                        reference.kind,
                        reference.name,
                        outcome.status
                    );
                    outcomes.push((id, reference.pending, outcome));
                }
            }
        }

        let mut result = FileResolution::default();
        let Some(ast) = store.get_mut(file) else {
            return result;
        };

        for (id, pending, outcome) in outcomes {
            self.record(outcome.status);
            result.total += 1;

            let source = ast.node_ref(id);
            let target = outcome
                .target
                .filter(|t| outcome.is_success() && *t != source);
            if outcome.is_success() {
                result.resolved += 1;
            }

            let Some(node) = ast.node_mut(id) else {
                continue;
            };
            if let Some(target) = target {
                node.add_reference(target);
            }
            // Front-end references stay on the node; only their target is refreshed
            if let Some(slot) = pending.and_then(|i| node.pending.get_mut(i)) {
                slot.resolved = target;
            }
        }

        debug!(
            "Resolved {}/{} references in {}",
            result.resolved,
            result.total,
            ast.path().display()
        );
        result
    }

    /// Resolve every file in `store`. Returns the number of resolved references.
    pub fn resolve_all(&mut self, store: &mut AstStore) -> usize {
        let mut resolved = 0;
        for file in store.ids() {
            resolved += self.resolve_file(store, file);
        }
        let stats = self.stats();
        info!(
            "Resolution pass complete: {} of {} references resolved",
            stats.resolved, stats.total
        );
        resolved
    }
}

impl Drop for ReferenceResolver<'_> {
    fn drop(&mut self) {
        for resolver in self.resolvers.values_mut() {
            resolver.cleanup();
        }
    }
}
