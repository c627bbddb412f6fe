//! Python-specific reference resolution
//!
//! Python resolves through modules: every file is a module named after its
//! stem, and top-level definitions live in that module's file. Lookup order:
//! 1. `self.x` / `cls.x` through the enclosing class
//! 2. `module.symbol`, verified against a registered module
//! 3. import targets (`import pkg.mod`, `from mod import name`)
//! 4. `builtins.<name>`
//! 5. generic scope lookup

use crate::ast::NodeKind;
use crate::parsing::resolution::{
    LanguageResolver, ReferenceKind, ReferenceRequest, Resolution, ResolveContext, ResolverStats,
    resolve_generic,
};
use crate::symbol::SymbolEntry;

#[derive(Debug, Default)]
pub struct PythonResolver {
    stats: ResolverStats,
}

impl PythonResolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LanguageResolver for PythonResolver {
    fn resolve(&mut self, cx: &ResolveContext<'_>, request: &ReferenceRequest<'_>) -> Resolution {
        let outcome = resolve_python(cx, request);
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

/// Module entry for a dotted module path, matching on the last segment
/// when the full path is not registered
fn find_module<'a>(cx: &ResolveContext<'a>, module_path: &str) -> Option<&'a SymbolEntry> {
    let is_module = |k: NodeKind| k == NodeKind::Module;
    cx.lookup_kind(module_path, is_module).or_else(|| {
        let last = module_path.rsplit('.').next()?;
        cx.lookup_kind(last, is_module)
    })
}

/// `symbol` as defined inside `module`
fn symbol_in_module<'a>(
    cx: &ResolveContext<'a>,
    module: &SymbolEntry,
    symbol: &str,
) -> Option<&'a SymbolEntry> {
    let qualified = format!("{}.{symbol}", module.qualified_name);
    if let Some(entry) = cx.table.lookup(&qualified) {
        return Some(entry);
    }
    // Top-level definitions are registered by bare name; tell them apart by file
    cx.table
        .lookup_all(symbol)
        .into_iter()
        .find(|e| e.file_path == module.file_path)
}

fn resolve_python(cx: &ResolveContext<'_>, request: &ReferenceRequest<'_>) -> Resolution {
    let name = request.name.trim();

    if request.kind == ReferenceKind::Import {
        return resolve_import(cx, name);
    }

    if let Some(attr) = name
        .strip_prefix("self.")
        .or_else(|| name.strip_prefix("cls."))
    {
        if let Some(class) = cx.enclosing_scope(request.source) {
            if let Some(entry) = cx.table.lookup(&format!("{class}.{attr}")) {
                return Resolution::found(entry.node);
            }
        }
    }

    if let Some((module_path, symbol)) = name.rsplit_once('.') {
        if let Some(module) = find_module(cx, module_path) {
            if let Some(entry) = symbol_in_module(cx, module, symbol) {
                return Resolution::found(entry.node);
            }
        }
    }

    if let Some(entry) = cx.table.lookup(&format!("builtins.{name}")) {
        return Resolution::found(entry.node);
    }

    resolve_generic(cx, request)
}

/// `import a.b` targets module `b`; `from a import x` arrives as `a.x` and
/// targets `x` inside module `a`
fn resolve_import(cx: &ResolveContext<'_>, name: &str) -> Resolution {
    let name = name.trim_start_matches('.');
    if let Some(module) = find_module(cx, name) {
        return Resolution::found(module.node);
    }
    if let Some((module_path, symbol)) = name.rsplit_once('.') {
        if let Some(module) = find_module(cx, module_path) {
            return symbol_in_module(cx, module, symbol).into();
        }
    }
    Resolution::not_found()
}
