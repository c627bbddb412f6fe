//! Language-agnostic resolution framework
//!
//! Each language implements [`LanguageResolver`] with its own lookup ladder
//! and falls back to [`resolve_generic`], which runs the symbol table's
//! scope-aware lookup. Resolvers only read: they return a [`Resolution`]
//! and the orchestrator records the edge on the source node.

use crate::ast::{AstNode, NodeKind, NodeLookup};
use crate::parsing::Language;
use crate::symbol::{GlobalSymbolTable, SymbolEntry};
use crate::types::NodeRef;
use serde::{Deserialize, Serialize};

/// What a textual reference is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReferenceKind {
    #[default]
    Unknown,
    Call,
    Type,
    Inheritance,
    Import,
    Include,
    Implementation,
    Override,
    Use,
    Extension,
    Template,
    /// Struct field or property access (`a->b`, `a.b`)
    Member,
    Interface,
    Macro,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Call => "call",
            Self::Type => "type",
            Self::Inheritance => "inheritance",
            Self::Import => "import",
            Self::Include => "include",
            Self::Implementation => "implementation",
            Self::Override => "override",
            Self::Use => "use",
            Self::Extension => "extension",
            Self::Template => "template",
            Self::Member => "member",
            Self::Interface => "interface",
            Self::Macro => "macro",
        }
    }
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome category of a resolution attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionStatus {
    Success,
    NotFound,
    /// Reserved. Lookups are first-match-wins and never report ambiguity.
    Ambiguous,
    /// Reserved for cyclic import chains.
    Circular,
    NotSupported,
    Error,
    Failed,
}

impl ResolutionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Result of one resolution attempt.
///
/// `Success` without a target means the name needs no declaration, e.g. a
/// TypeScript primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub status: ResolutionStatus,
    pub target: Option<NodeRef>,
}

impl Resolution {
    pub fn found(target: NodeRef) -> Self {
        Self {
            status: ResolutionStatus::Success,
            target: Some(target),
        }
    }

    pub fn builtin() -> Self {
        Self {
            status: ResolutionStatus::Success,
            target: None,
        }
    }

    pub fn with_status(status: ResolutionStatus) -> Self {
        Self {
            status,
            target: None,
        }
    }

    pub fn not_found() -> Self {
        Self::with_status(ResolutionStatus::NotFound)
    }

    pub fn not_supported() -> Self {
        Self::with_status(ResolutionStatus::NotSupported)
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Keep this outcome if it succeeded, otherwise try `next`
    pub fn or_else(self, next: impl FnOnce() -> Resolution) -> Resolution {
        if self.is_success() { self } else { next() }
    }
}

impl From<Option<&SymbolEntry>> for Resolution {
    fn from(entry: Option<&SymbolEntry>) -> Self {
        entry.map_or_else(Resolution::not_found, |e| Resolution::found(e.node))
    }
}

/// A reference waiting to be resolved
#[derive(Debug, Clone, Copy)]
pub struct ReferenceRequest<'a> {
    /// Node carrying the reference
    pub source: NodeRef,
    pub kind: ReferenceKind,
    pub name: &'a str,
    pub language: Language,
}

/// Read-only view handed to resolvers
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    pub table: &'a GlobalSymbolTable,
    pub nodes: &'a dyn NodeLookup,
}

impl<'a> ResolveContext<'a> {
    pub fn new(table: &'a GlobalSymbolTable, nodes: &'a dyn NodeLookup) -> Self {
        Self { table, nodes }
    }

    pub fn node(&self, target: NodeRef) -> Option<&'a AstNode> {
        self.nodes.node(target)
    }

    /// Nodes enclosing `source`, nearest first
    pub fn ancestors(&self, source: NodeRef) -> Vec<&'a AstNode> {
        let Some(file) = self.nodes.file(source.file) else {
            return Vec::new();
        };
        file.ancestors(source.node)
            .into_iter()
            .filter_map(|id| file.node(id))
            .collect()
    }

    /// Qualified name of the nearest enclosing class, namespace, struct or
    /// interface
    pub fn enclosing_scope(&self, source: NodeRef) -> Option<String> {
        self.ancestors(source)
            .into_iter()
            .find(|n| n.kind.opens_scope() && !n.qualified_name.is_empty())
            .map(|n| n.qualified_name.clone())
    }

    /// Direct child of `owner` named `member`
    pub fn find_member(&self, owner: NodeRef, member: &str) -> Option<NodeRef> {
        let file = self.nodes.file(owner.file)?;
        file.find_child(owner.node, member)
            .map(|id| NodeRef::new(owner.file, id))
    }

    /// First entry under `qualified_name` whose kind satisfies `accept`
    pub fn lookup_kind<F>(&self, qualified_name: &str, accept: F) -> Option<&'a SymbolEntry>
    where
        F: Fn(NodeKind) -> bool,
    {
        let table: &'a GlobalSymbolTable = self.table;
        table
            .lookup_all(qualified_name)
            .into_iter()
            .find(|e| accept(e.kind))
    }
}

/// Per-resolver counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolverStats {
    pub attempts: usize,
    pub resolved: usize,
    pub not_found: usize,
    pub not_supported: usize,
}

impl ResolverStats {
    pub fn record(&mut self, status: ResolutionStatus) {
        self.attempts += 1;
        match status {
            ResolutionStatus::Success => self.resolved += 1,
            ResolutionStatus::NotFound => self.not_found += 1,
            ResolutionStatus::NotSupported => self.not_supported += 1,
            _ => {}
        }
    }
}

/// Per-language resolution strategy
///
/// Implementations keep their own state (counters, caches). `cleanup` runs
/// when the resolver is replaced or unregistered.
pub trait LanguageResolver: Send {
    /// Resolve one reference against the global table
    fn resolve(&mut self, cx: &ResolveContext<'_>, request: &ReferenceRequest<'_>) -> Resolution;

    /// Release resolver-owned state
    fn cleanup(&mut self) {}

    fn stats(&self) -> ResolverStats {
        ResolverStats::default()
    }
}

/// Scope-aware lookup shared by every language
pub fn resolve_generic(cx: &ResolveContext<'_>, request: &ReferenceRequest<'_>) -> Resolution {
    if request.name.is_empty() {
        return Resolution::with_status(ResolutionStatus::Error);
    }
    let scope = cx.enclosing_scope(request.source);
    cx.table
        .scope_lookup(request.name, scope.as_deref(), request.language)
        .into()
}

/// Fallback for languages without a registered resolver
#[derive(Debug, Default)]
pub struct GenericResolver {
    stats: ResolverStats,
}

impl GenericResolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LanguageResolver for GenericResolver {
    fn resolve(&mut self, cx: &ResolveContext<'_>, request: &ReferenceRequest<'_>) -> Resolution {
        let outcome = resolve_generic(cx, request);
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
