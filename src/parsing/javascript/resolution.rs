//! JavaScript-specific reference resolution
//!
//! Handles ES module and CommonJS forms:
//! - `import x from './util'` and `require('./util')` resolve to the module
//!   named after the specifier's file stem
//! - `module.exports.X` and `exports.X` resolve to `X`
//! - `this.x` and dotted property paths
//! - `global.<name>` as the last named scope
//!
//! Prototype chains are not walked.

use crate::ast::NodeKind;
use crate::parsing::resolution::{
    LanguageResolver, ReferenceKind, ReferenceRequest, Resolution, ResolveContext, ResolverStats,
    resolve_generic,
};
use crate::symbol::SymbolEntry;
use regex::Regex;
use std::sync::LazyLock;

static IMPORT_SPECIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:from\s+|require\s*\(\s*|import\s+)['"]([^'"]+)['"]"#).expect("Invalid regex")
});

#[derive(Debug, Default)]
pub struct JavaScriptResolver {
    stats: ResolverStats,
}

impl JavaScriptResolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LanguageResolver for JavaScriptResolver {
    fn resolve(&mut self, cx: &ResolveContext<'_>, request: &ReferenceRequest<'_>) -> Resolution {
        let outcome = resolve_javascript(cx, request);
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

/// Module specifier of an import statement, or the text itself when it is
/// already a bare specifier
pub(crate) fn import_specifier(text: &str) -> &str {
    IMPORT_SPECIFIER
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or_else(
            || text.trim().trim_matches(|c| c == '\'' || c == '"'),
            |m| m.as_str(),
        )
}

/// `./lib/util.js` -> `util`
pub(crate) fn module_stem(specifier: &str) -> &str {
    let last = specifier.rsplit('/').next().unwrap_or(specifier);
    match last.find('.') {
        Some(0) | None => last,
        Some(dot) => &last[..dot],
    }
}

fn find_module<'a>(cx: &ResolveContext<'a>, name: &str) -> Option<&'a SymbolEntry> {
    cx.lookup_kind(name, |k| k == NodeKind::Module)
}

/// Definition of `symbol` declared in the same file as `module`
fn symbol_in_module<'a>(
    cx: &ResolveContext<'a>,
    module: &SymbolEntry,
    symbol: &str,
) -> Option<&'a SymbolEntry> {
    cx.table
        .lookup(&format!("{}.{symbol}", module.qualified_name))
        .or_else(|| {
            cx.table
                .lookup_all(symbol)
                .into_iter()
                .find(|e| e.file_path == module.file_path)
        })
}

pub(crate) fn resolve_javascript(
    cx: &ResolveContext<'_>,
    request: &ReferenceRequest<'_>,
) -> Resolution {
    let name = request.name.trim();

    if request.kind == ReferenceKind::Import || name.contains("require(") {
        let specifier = import_specifier(name);
        return find_module(cx, module_stem(specifier)).into();
    }

    if let Some(exported) = name
        .strip_prefix("module.exports.")
        .or_else(|| name.strip_prefix("exports."))
    {
        return cx.table.lookup(exported).into();
    }

    if name.contains(".prototype.") || name.ends_with(".prototype") {
        return Resolution::not_supported();
    }

    if let Some(entry) = cx.table.lookup(name) {
        return Resolution::found(entry.node);
    }

    if let Some(member) = name.strip_prefix("this.") {
        if let Some(class) = cx.enclosing_scope(request.source) {
            if let Some(entry) = cx.table.lookup(&format!("{class}.{member}")) {
                return Resolution::found(entry.node);
            }
        }
    }

    if let Some((head, rest)) = name.split_once('.') {
        // Namespace import: `utils.format` where `utils` is a module
        if let Some(module) = find_module(cx, head) {
            let member = rest.split('.').next().unwrap_or(rest);
            if let Some(entry) = symbol_in_module(cx, module, member) {
                return Resolution::found(entry.node);
            }
        }
        // Static member on a class: `Config.load`
        if let Some(entry) = cx.table.lookup(&format!("{head}.{rest}")) {
            return Resolution::found(entry.node);
        }
    }

    if let Some(entry) = cx.table.lookup(&format!("global.{name}")) {
        return Resolution::found(entry.node);
    }

    resolve_generic(cx, request)
}
