//! Chained hash table keyed by qualified name
//!
//! Entries live in a slab addressed by [`EntryId`]; buckets only hold ids.
//! A bucket chain is stored oldest-first and scanned from the back, so the
//! most recently registered entry is found first. Rehashing rebuilds the
//! bucket vector and never moves an entry.

use crate::ast::NodeKind;
use crate::parsing::Language;
use crate::types::{EntryId, NodeRef};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Smallest bucket count a table is created with
pub const MIN_BUCKETS: usize = 8;

/// Load factor above which the table doubles its bucket count
pub const REHASH_THRESHOLD: f64 = 0.75;

/// Multiplicative string hash reduced to `table_size` buckets.
///
/// Not collision resistant. Keys come from parsed source code.
pub fn hash_string(s: &str, table_size: usize) -> usize {
    let hash = s
        .bytes()
        .fold(0u32, |hash, byte| hash.wrapping_mul(31).wrapping_add(byte as u32));
    if table_size == 0 {
        0
    } else {
        hash as usize % table_size
    }
}

/// Visibility scope of a registered symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SymbolScope {
    #[default]
    Unknown,
    Local,
    File,
    Module,
    Global,
    External,
}

/// One registered symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolEntry {
    pub qualified_name: String,
    pub simple_name: String,
    pub file_path: PathBuf,
    /// Declaring node. The table indexes it but never owns it.
    pub node: NodeRef,
    pub kind: NodeKind,
    pub scope: SymbolScope,
    pub language: Language,
    pub is_definition: bool,
    pub module_path: Option<String>,
    /// Enclosing symbol, e.g. method to class
    pub parent: Option<EntryId>,
}

impl SymbolEntry {
    pub fn new(
        qualified_name: impl Into<String>,
        node: NodeRef,
        kind: NodeKind,
        file_path: impl Into<PathBuf>,
        scope: SymbolScope,
        language: Language,
    ) -> Self {
        let qualified_name = qualified_name.into();
        let simple_name = simple_name_of(&qualified_name).to_string();
        Self {
            qualified_name,
            simple_name,
            file_path: file_path.into(),
            node,
            kind,
            scope,
            language,
            is_definition: true,
            module_path: None,
            parent: None,
        }
    }

    pub fn with_definition(mut self, is_definition: bool) -> Self {
        self.is_definition = is_definition;
        self
    }

    pub fn with_module_path(mut self, module_path: impl Into<String>) -> Self {
        self.module_path = Some(module_path.into());
        self
    }

    pub fn with_parent(mut self, parent: Option<EntryId>) -> Self {
        self.parent = parent;
        self
    }
}

/// Last segment of a `::` or `.` qualified name
fn simple_name_of(qualified: &str) -> &str {
    let after_colons = qualified.rsplit("::").next().unwrap_or(qualified);
    after_colons.rsplit('.').next().unwrap_or(after_colons)
}

/// Snapshot of table occupancy
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TableStats {
    pub capacity: usize,
    pub size: usize,
    pub collisions: usize,
    pub load_factor: f64,
}

/// Project-wide registry of symbols.
///
/// Slots freed by [`GlobalSymbolTable::remove_by_file`] are reused, so an
/// [`EntryId`] is only meaningful while its entry is live.
#[derive(Debug)]
pub struct GlobalSymbolTable {
    buckets: Vec<Vec<EntryId>>,
    entries: Vec<Option<SymbolEntry>>,
    free: Vec<EntryId>,
    num_symbols: usize,
    collisions: usize,
    scopes: Vec<String>,
}

impl Default for GlobalSymbolTable {
    fn default() -> Self {
        Self::new(MIN_BUCKETS)
    }
}

impl GlobalSymbolTable {
    /// Create a table with at least [`MIN_BUCKETS`] buckets
    pub fn new(initial_capacity: usize) -> Self {
        let capacity = initial_capacity.max(MIN_BUCKETS);
        Self {
            buckets: vec![Vec::new(); capacity],
            entries: Vec::new(),
            free: Vec::new(),
            num_symbols: 0,
            collisions: 0,
            scopes: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.num_symbols
    }

    pub fn is_empty(&self) -> bool {
        self.num_symbols == 0
    }

    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn collisions(&self) -> usize {
        self.collisions
    }

    pub fn load_factor(&self) -> f64 {
        self.num_symbols as f64 / self.buckets.len() as f64
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            capacity: self.capacity(),
            size: self.num_symbols,
            collisions: self.collisions,
            load_factor: self.load_factor(),
        }
    }

    /// Insert an entry. Duplicate qualified names are kept side by side and
    /// counted as collisions.
    pub fn register(&mut self, entry: SymbolEntry) -> EntryId {
        if self.lookup_id(&entry.qualified_name).is_some() {
            self.collisions += 1;
            debug!(
                "Symbol collision on '{}' ({} total)",
                entry.qualified_name, self.collisions
            );
        }

        let bucket = hash_string(&entry.qualified_name, self.buckets.len());
        let id = match self.free.pop() {
            Some(id) => {
                self.entries[id.index()] = Some(entry);
                id
            }
            None => {
                self.entries.push(Some(entry));
                EntryId(self.entries.len() as u32 - 1)
            }
        };
        self.buckets[bucket].push(id);
        self.num_symbols += 1;

        if self.should_rehash() {
            let new_capacity = self.buckets.len() * 2;
            self.rehash(new_capacity);
        }

        id
    }

    pub fn entry(&self, id: EntryId) -> Option<&SymbolEntry> {
        self.entries.get(id.index()).and_then(Option::as_ref)
    }

    /// Ids chained under `qualified_name`, newest first
    fn chain<'a>(&'a self, qualified_name: &'a str) -> impl Iterator<Item = EntryId> + 'a {
        let bucket = hash_string(qualified_name, self.buckets.len());
        self.buckets[bucket]
            .iter()
            .rev()
            .copied()
            .filter(move |id| {
                self.entry(*id)
                    .is_some_and(|e| e.qualified_name == qualified_name)
            })
    }

    /// Find an entry by qualified name.
    ///
    /// Returns the newest definition when one exists, otherwise the newest
    /// entry with that name.
    pub fn lookup_id(&self, qualified_name: &str) -> Option<EntryId> {
        let mut newest = None;
        for id in self.chain(qualified_name) {
            if self.entry(id).is_some_and(|e| e.is_definition) {
                return Some(id);
            }
            newest.get_or_insert(id);
        }
        newest
    }

    pub fn lookup(&self, qualified_name: &str) -> Option<&SymbolEntry> {
        self.lookup_id(qualified_name).and_then(|id| self.entry(id))
    }

    /// Every entry registered under `qualified_name`, newest first
    pub fn lookup_all(&self, qualified_name: &str) -> Vec<&SymbolEntry> {
        self.chain(qualified_name)
            .filter_map(|id| self.entry(id))
            .collect()
    }

    /// Resolve `name` as seen from `current_scope`.
    ///
    /// Tries, in order: the name as given, `current_scope` + separator +
    /// name, each registered scope prefix, then the language's fallback
    /// namespace. The first hit wins.
    pub fn scope_lookup_id(
        &self,
        name: &str,
        current_scope: Option<&str>,
        language: Language,
    ) -> Option<EntryId> {
        if let Some(id) = self.lookup_id(name) {
            return Some(id);
        }

        let sep = language.scope_separator();
        if let Some(scope) = current_scope.filter(|s| !s.is_empty()) {
            if let Some(id) = self.lookup_id(&format!("{scope}{sep}{name}")) {
                return Some(id);
            }
        }

        for prefix in &self.scopes {
            if let Some(id) = self.lookup_id(&format!("{prefix}{sep}{name}")) {
                return Some(id);
            }
        }

        language
            .fallback_scope()
            .and_then(|fallback| self.lookup_id(&format!("{fallback}.{name}")))
    }

    pub fn scope_lookup(
        &self,
        name: &str,
        current_scope: Option<&str>,
        language: Language,
    ) -> Option<&SymbolEntry> {
        self.scope_lookup_id(name, current_scope, language)
            .and_then(|id| self.entry(id))
    }

    /// Register a scope prefix used to widen unqualified lookups.
    /// Returns `false` if it was already present.
    pub fn add_scope(&mut self, prefix: impl Into<String>) -> bool {
        let prefix = prefix.into();
        if prefix.is_empty() || self.scopes.contains(&prefix) {
            return false;
        }
        self.scopes.push(prefix);
        true
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn should_rehash(&self) -> bool {
        self.load_factor() > REHASH_THRESHOLD
    }

    /// Redistribute every live entry over `new_capacity` buckets.
    ///
    /// Old chains are replayed in order. Entries sharing a qualified name
    /// always share a chain, so lookup precedence is unchanged.
    pub fn rehash(&mut self, new_capacity: usize) {
        let new_capacity = new_capacity.max(MIN_BUCKETS);
        let mut buckets = vec![Vec::new(); new_capacity];
        for id in self.buckets.iter().flatten() {
            if let Some(entry) = self.entry(*id) {
                let bucket = hash_string(&entry.qualified_name, new_capacity);
                buckets[bucket].push(*id);
            }
        }
        debug!(
            "Rehashed symbol table from {} to {} buckets ({} symbols)",
            self.buckets.len(),
            new_capacity,
            self.num_symbols
        );
        self.buckets = buckets;
    }

    /// Unlink and drop every entry declared in `file_path`.
    /// Returns the number removed.
    pub fn remove_by_file(&mut self, file_path: &Path) -> usize {
        let mut removed = Vec::new();
        for bucket in &mut self.buckets {
            bucket.retain(|id| {
                let matches = self.entries[id.index()]
                    .as_ref()
                    .is_some_and(|e| e.file_path == file_path);
                if matches {
                    removed.push(*id);
                }
                !matches
            });
        }

        for id in &removed {
            self.entries[id.index()] = None;
        }
        self.free.extend(removed.iter().copied());
        for entry in self.entries.iter_mut().flatten() {
            if entry.parent.is_some_and(|p| removed.contains(&p)) {
                entry.parent = None;
            }
        }

        self.num_symbols -= removed.len();
        if !removed.is_empty() {
            debug!(
                "Removed {} symbols declared in {}",
                removed.len(),
                file_path.display()
            );
        }
        removed.len()
    }

    /// Live entries in bucket order, newest first within a bucket
    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &SymbolEntry)> {
        self.buckets.iter().flat_map(move |bucket| {
            bucket
                .iter()
                .rev()
                .filter_map(move |id| self.entry(*id).map(|e| (*id, e)))
        })
    }

    /// Count entries matching `predicate`, copying ids into `out` until it is
    /// full. The returned count is always the full number of matches.
    fn collect_matching<F>(&self, mut out: Option<&mut [EntryId]>, predicate: F) -> usize
    where
        F: Fn(&SymbolEntry) -> bool,
    {
        let mut count = 0;
        for (id, entry) in self.iter() {
            if !predicate(entry) {
                continue;
            }
            if let Some(slot) = out.as_deref_mut().and_then(|buf| buf.get_mut(count)) {
                *slot = id;
            }
            count += 1;
        }
        count
    }

    /// Entries whose declaring node has the given kind
    pub fn get_by_type(&self, kind: NodeKind, out: Option<&mut [EntryId]>) -> usize {
        self.collect_matching(out, |e| e.kind == kind)
    }

    /// Entries declared in `file_path`
    pub fn get_by_file(&self, file_path: &Path, out: Option<&mut [EntryId]>) -> usize {
        self.collect_matching(out, |e| e.file_path == file_path)
    }

    pub fn get_by_language(&self, language: Language, out: Option<&mut [EntryId]>) -> usize {
        self.collect_matching(out, |e| e.language == language)
    }

    /// Entries whose qualified name lives under `scope`
    pub fn get_by_scope(&self, scope: &str) -> Vec<EntryId> {
        self.iter()
            .filter(|(_, e)| {
                e.qualified_name
                    .strip_prefix(scope)
                    .is_some_and(|rest| rest.starts_with("::") || rest.starts_with('.'))
            })
            .map(|(id, _)| id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FileId, NodeId};

    fn node(n: u32) -> NodeRef {
        NodeRef::new(FileId(1), NodeId(n))
    }

    fn entry(name: &str, n: u32) -> SymbolEntry {
        SymbolEntry::new(
            name,
            node(n),
            NodeKind::Function,
            "main.py",
            SymbolScope::File,
            Language::Python,
        )
    }

    #[test]
    fn test_hash_is_pure() {
        assert_eq!(hash_string("foo", 16), hash_string("foo", 16));
        assert!(hash_string("foo", 16) < 16);
        assert_eq!(hash_string("anything", 0), 0);
        // 'a' = 97
        assert_eq!(hash_string("a", 1000), 97);
        assert_eq!(hash_string("ab", 10_000), 97 * 31 + 98);
    }

    #[test]
    fn test_create_enforces_minimum() {
        assert_eq!(GlobalSymbolTable::new(0).capacity(), MIN_BUCKETS);
        assert_eq!(GlobalSymbolTable::new(256).capacity(), 256);
    }

    #[test]
    fn test_duplicate_registration_is_collision() {
        let mut table = GlobalSymbolTable::new(64);
        table.register(entry("foo", 1));
        table.register(entry("foo", 2));

        assert_eq!(table.len(), 2);
        assert_eq!(table.collisions(), 1);
        assert_eq!(table.lookup_all("foo").len(), 2);
        // Newest chained entry wins when both are definitions
        assert_eq!(table.lookup("foo").unwrap().node, node(2));
    }

    #[test]
    fn test_lookup_prefers_definition() {
        let mut table = GlobalSymbolTable::new(64);
        table.register(entry("helper", 1));
        table.register(entry("helper", 2).with_definition(false));

        assert_eq!(table.lookup("helper").unwrap().node, node(1));
    }

    #[test]
    fn test_rehash_preserves_lookups() {
        let mut table = GlobalSymbolTable::new(8);
        for i in 0..100 {
            table.register(entry(&format!("sym_{i}"), i + 1));
        }

        assert!(table.capacity() > 8);
        assert!(table.load_factor() <= REHASH_THRESHOLD);
        for i in 0..100 {
            let found = table.lookup(&format!("sym_{i}")).unwrap();
            assert_eq!(found.node, node(i + 1));
        }

        table.rehash(512);
        assert_eq!(table.capacity(), 512);
        assert_eq!(table.lookup("sym_42").unwrap().node, node(43));
    }

    #[test]
    fn test_scope_lookup_ladder() {
        let mut table = GlobalSymbolTable::new(16);
        table.register(entry("NS.foo", 1));

        assert!(table.scope_lookup("foo", Some("NS"), Language::Python).is_some());
        assert!(table.scope_lookup("foo", Some("OTHER"), Language::Python).is_none());

        table.register(entry("builtins.foo", 2));
        let hit = table.scope_lookup("foo", Some("OTHER"), Language::Python).unwrap();
        assert_eq!(hit.qualified_name, "builtins.foo");
    }

    #[test]
    fn test_scope_prefixes_use_language_separator() {
        let mut table = GlobalSymbolTable::new(16);
        table.register(SymbolEntry::new(
            "std::vector",
            node(1),
            NodeKind::Class,
            "vector.hpp",
            SymbolScope::Global,
            Language::Cpp,
        ));

        assert!(table.scope_lookup("vector", None, Language::Cpp).is_none());
        assert!(table.add_scope("std"));
        assert!(!table.add_scope("std"));
        assert_eq!(table.scopes().len(), 1);
        assert!(table.scope_lookup("vector", None, Language::Cpp).is_some());
    }

    #[test]
    fn test_count_queries_report_full_total() {
        let mut table = GlobalSymbolTable::new(16);
        for i in 0..5 {
            table.register(entry(&format!("f{i}"), i + 1));
        }

        let mut buf = [EntryId(u32::MAX); 2];
        assert_eq!(table.get_by_type(NodeKind::Function, Some(&mut buf[..])), 5);
        assert!(buf.iter().all(|id| id.0 != u32::MAX));
        assert_eq!(table.get_by_type(NodeKind::Class, None), 0);
        assert_eq!(table.get_by_file(Path::new("main.py"), None), 5);
        assert_eq!(table.get_by_language(Language::Python, None), 5);
    }

    #[test]
    fn test_remove_by_file() {
        let mut table = GlobalSymbolTable::new(16);
        table.register(entry("keep", 1));
        table.register(SymbolEntry::new(
            "gone",
            node(2),
            NodeKind::Function,
            "other.py",
            SymbolScope::File,
            Language::Python,
        ));

        assert_eq!(table.remove_by_file(Path::new("other.py")), 1);
        assert_eq!(table.len(), 1);
        assert!(table.lookup("gone").is_none());
        assert!(table.lookup("keep").is_some());
        assert_eq!(table.get_by_file(Path::new("other.py"), None), 0);
    }

    #[test]
    fn test_removed_slots_are_reused() {
        let in_file = |n: u32, path: &str| {
            SymbolEntry::new(
                "f",
                node(n),
                NodeKind::Function,
                path,
                SymbolScope::File,
                Language::Python,
            )
        };

        let mut table = GlobalSymbolTable::new(16);
        table.register(in_file(1, "a.py"));
        table.register(in_file(2, "b.py"));

        for round in 0..10 {
            assert_eq!(table.remove_by_file(Path::new("a.py")), 1);
            table.register(in_file(10 + round, "a.py"));
        }
        assert_eq!(table.entries.len(), 2);
        assert_eq!(table.len(), 2);

        // The re-registered entry is still the newest, also after a rehash
        assert_eq!(table.lookup("f").unwrap().node, node(19));
        table.rehash(64);
        assert_eq!(table.lookup("f").unwrap().node, node(19));
        assert_eq!(table.lookup_all("f").len(), 2);
    }

    #[test]
    fn test_get_by_scope_and_simple_name() {
        let mut table = GlobalSymbolTable::new(16);
        table.register(entry("Shape.area", 1));
        table.register(entry("Shapes", 2));

        let ids = table.get_by_scope("Shape");
        assert_eq!(ids.len(), 1);
        assert_eq!(table.entry(ids[0]).unwrap().simple_name, "area");
        assert_eq!(simple_name_of("ns::Point::x"), "x");
    }
}
