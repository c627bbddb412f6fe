//! Project context
//!
//! Owns everything that belongs to one analysed project: the discovered
//! files, one AST arena per parsed file, the global symbol table and the
//! last error. Parsing runs to a fixed point: every parsed file can discover
//! new files through its includes and imports, which are parsed in the next
//! round until a round discovers nothing new.
//!
//! Failures never abort a pass. They are logged, stored as the project's
//! last error and the offending file is skipped.

use crate::ast::{AstNode, AstStore, FileAst, NodeKind, NodeLookup};
use crate::config::{ProjectConfig, Settings};
use crate::error::{ProjectError, ProjectErrorCode};
use crate::indexing::dependencies::{clean_path, collect_dependencies};
use crate::indexing::files::FileWalker;
use crate::indexing::resolver::ReferenceResolver;
use crate::parsing::{Language, ParserFactory, SourceParser, TreeSitterFrontEnd};
use crate::symbol::{GlobalSymbolTable, register_file_symbols};
use crate::types::{EntryId, FileId, NodeRef};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Last error recorded on the project. A newer error replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectErrorState {
    pub code: ProjectErrorCode,
    pub message: String,
}

/// Reference counts of one file's last resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FileStats {
    pub total_references: usize,
    pub unresolved_references: usize,
}

/// Aggregate numbers over the whole project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProjectStats {
    pub total_files: usize,
    pub total_symbols: usize,
    pub total_references: usize,
    pub unresolved_references: usize,
}

/// A file that has been parsed and registered
#[derive(Debug, Clone, Serialize)]
pub struct ParsedFile {
    pub id: FileId,
    pub path: PathBuf,
    pub language: Language,
    /// Symbols registered from this file
    pub symbols: usize,
    pub stats: FileStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryState {
    Pending,
    Parsed,
    Failed,
}

/// A file known to the project, parsed or not
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    /// Explicit language, otherwise detected from the extension
    pub language: Option<Language>,
    /// Include/import hops from an explicitly added file
    pub depth: usize,
    pub state: DiscoveryState,
}

pub struct ProjectContext {
    root: PathBuf,
    settings: Settings,
    table: GlobalSymbolTable,
    asts: AstStore,
    files: Vec<ParsedFile>,
    discovered: Vec<DiscoveredFile>,
    parser: Box<dyn SourceParser>,
    error: Option<ProjectErrorState>,
    include_depth: usize,
    next_file_id: u32,
}

impl std::fmt::Debug for ProjectContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectContext")
            .field("root", &self.root)
            .field("files", &self.files.len())
            .field("discovered", &self.discovered.len())
            .field("symbols", &self.table.len())
            .field("error", &self.error)
            .finish()
    }
}

impl ProjectContext {
    /// Project rooted at `root` with default settings
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_settings(root, Settings::default())
    }

    pub fn with_config(root: impl Into<PathBuf>, config: ProjectConfig) -> Self {
        let settings = Settings {
            project: config,
            ..Settings::default()
        };
        Self::with_settings(root, settings)
    }

    /// Project using `settings`; disabled languages are not parsed
    pub fn with_settings(root: impl Into<PathBuf>, settings: Settings) -> Self {
        let factory = ParserFactory::new(Arc::new(settings.clone()));
        Self {
            root: root.into(),
            table: GlobalSymbolTable::new(settings.project.symbol_table_buckets),
            settings,
            asts: AstStore::new(),
            files: Vec::new(),
            discovered: Vec::new(),
            parser: Box::new(TreeSitterFrontEnd::new(factory)),
            error: None,
            include_depth: 0,
            next_file_id: 1,
        }
    }

    /// Replace the project options. Files already discovered are kept.
    pub fn set_config(&mut self, config: ProjectConfig) {
        self.settings.project = config;
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.settings.project
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Swap the parsing front end
    pub fn set_parser(&mut self, parser: Box<dyn SourceParser>) {
        self.parser = parser;
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ----- error state -----

    pub fn last_error(&self) -> Option<&ProjectErrorState> {
        self.error.as_ref()
    }

    pub fn set_error(&mut self, code: ProjectErrorCode, message: impl Into<String>) {
        self.error = Some(ProjectErrorState {
            code,
            message: message.into(),
        });
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn record(&mut self, error: ProjectError) {
        warn!("{error}");
        self.set_error(error.code(), error.to_string());
    }

    // ----- discovery -----

    /// Absolute paths pass through, relative ones are joined to the root.
    /// `.` and `..` segments are folded lexically; symlinks are not followed.
    fn normalize(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            clean_path(path)
        } else {
            clean_path(&self.root.join(path))
        }
    }

    /// Queue `path` for the next parse. Returns `true` if the file is part
    /// of the project afterwards, including when it already was.
    pub fn add_file(&mut self, path: impl AsRef<Path>, language: Option<Language>) -> bool {
        self.enqueue(path.as_ref(), language, 0)
    }

    fn enqueue(&mut self, path: &Path, language: Option<Language>, depth: usize) -> bool {
        if path.as_os_str().is_empty() {
            self.record(ProjectError::InvalidPath {
                path: path.to_path_buf(),
                reason: "empty path".to_string(),
            });
            return false;
        }

        let path = self.normalize(path);
        if self.discovered.iter().any(|f| f.path == path) {
            return true;
        }

        let limit = self.settings.project.max_files;
        if limit > 0 && self.discovered.len() >= limit {
            self.record(ProjectError::TooManyFiles { path, limit });
            return false;
        }

        let max_depth = self.settings.project.max_include_depth;
        if depth > max_depth {
            self.record(ProjectError::IncludeDepthExceeded {
                depth,
                limit: max_depth,
            });
            return false;
        }

        debug!("Discovered {} (depth {depth})", path.display());
        self.discovered.push(DiscoveredFile {
            path,
            language,
            depth,
            state: DiscoveryState::Pending,
        });
        true
    }

    /// Add every file under `path` whose extension is in `extensions` (all
    /// files when `None`). Returns the number of files newly added.
    pub fn add_directory(
        &mut self,
        path: impl AsRef<Path>,
        extensions: Option<&[&str]>,
        recursive: bool,
    ) -> usize {
        let dir = self.normalize(path.as_ref());
        if !dir.is_dir() {
            self.record(ProjectError::DirectoryRead {
                path: dir,
                reason: "not a directory".to_string(),
            });
            return 0;
        }

        let mut walker = FileWalker::new().recursive(recursive);
        if let Some(extensions) = extensions {
            walker = walker.with_extensions(extensions);
        }

        let before = self.discovered.len();
        for file in walker.walk(&dir) {
            let language = Language::from_path(&file);
            if !self.add_file(&file, language)
                && self.error.as_ref().map(|e| e.code) == Some(ProjectErrorCode::TooManyFiles)
            {
                break;
            }
        }

        let added = self.discovered.len() - before;
        info!("Added {added} files from {}", dir.display());
        added
    }

    // ----- parsing -----

    /// Parse every pending file, following includes and imports until no
    /// new file turns up. Returns `false` if any file failed.
    pub fn parse_all_files(&mut self) -> bool {
        let mut failures = 0;
        let mut round = 0;

        loop {
            let pending: Vec<usize> = self
                .discovered
                .iter()
                .enumerate()
                .filter(|(_, f)| f.state == DiscoveryState::Pending)
                .map(|(i, _)| i)
                .collect();
            if pending.is_empty() {
                break;
            }

            round += 1;
            let before = self.files.len();
            for index in pending {
                if !self.parse_discovered(index) {
                    failures += 1;
                }
            }
            debug!(
                "Parse round {round}: {} files parsed",
                self.files.len() - before
            );
        }

        info!(
            "Parsed {} files, {} symbols registered, {failures} failures",
            self.files.len(),
            self.table.len()
        );
        failures == 0
    }

    fn parse_discovered(&mut self, index: usize) -> bool {
        let (path, hint, depth) = {
            let file = &self.discovered[index];
            (file.path.clone(), file.language, file.depth)
        };
        self.discovered[index].state = DiscoveryState::Failed;

        let Some(language) = hint.or_else(|| Language::from_path(&path)) else {
            let extension = path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.record(ProjectError::UnsupportedFileType { path, extension });
            return false;
        };

        let code = match std::fs::read_to_string(&path) {
            Ok(code) => code,
            Err(source) => {
                self.record(ProjectError::FileRead { path, source });
                return false;
            }
        };

        let file_id = FileId(self.next_file_id);
        self.next_file_id += 1;

        let mut ast = match self.parser.parse_source(file_id, &path, &code, language) {
            Ok(ast) => ast,
            Err(e) => {
                self.record(ProjectError::Parse {
                    path,
                    language: language.name().to_string(),
                    reason: e.to_string(),
                });
                return false;
            }
        };

        if self.settings.project.follow_includes {
            self.include_depth += 1;
            self.discover_dependencies(&ast, depth);
            self.include_depth -= 1;
        }

        let symbols = register_file_symbols(&mut self.table, &mut ast);
        crate::debug_print!(
            self,
            "{}: {} nodes, {symbols} symbols",
            path.display(),
            ast.len()
        );
        self.asts.insert(ast);
        self.files.push(ParsedFile {
            id: file_id,
            path,
            language,
            symbols,
            stats: FileStats::default(),
        });
        self.discovered[index].state = DiscoveryState::Parsed;
        true
    }

    fn discover_dependencies(&mut self, ast: &FileAst, depth: usize) {
        for dependency in collect_dependencies(ast, &self.settings.project, &self.root) {
            self.enqueue(&dependency.path, dependency.language, depth + 1);
        }
    }

    /// Drop a file, its symbols and every edge pointing into it
    pub fn remove_file(&mut self, path: impl AsRef<Path>) -> bool {
        let path = self.normalize(path.as_ref());
        let discovered_before = self.discovered.len();
        self.discovered.retain(|f| f.path != path);

        let Some(index) = self.files.iter().position(|f| f.path == path) else {
            if self.discovered.len() != discovered_before {
                return true;
            }
            self.record(ProjectError::InvalidPath {
                path,
                reason: "file is not part of the project".to_string(),
            });
            return false;
        };

        let parsed = self.files.remove(index);
        self.asts.remove(parsed.id);
        let swept = self.table.remove_by_file(&parsed.path);
        info!("Removed {} ({swept} symbols)", parsed.path.display());
        true
    }

    // ----- resolution -----

    /// Resolve the references of every parsed file against the symbol table
    pub fn resolve_references(&mut self) -> bool {
        let mut resolver = ReferenceResolver::with_builtin(&self.table);
        for parsed in &mut self.files {
            let outcome = resolver.resolve_file_with_stats(&mut self.asts, parsed.id);
            parsed.stats = FileStats {
                total_references: outcome.total,
                unresolved_references: outcome.unresolved(),
            };
        }

        let stats = resolver.stats();
        info!(
            "Resolved {} of {} references across {} files",
            stats.resolved,
            stats.total,
            self.files.len()
        );
        true
    }

    // ----- queries -----

    /// Node registered under `qualified_name` (the definition when one exists)
    pub fn get_symbol(&self, qualified_name: &str) -> Option<&AstNode> {
        self.get_symbol_ref(qualified_name)
            .and_then(|target| self.node(target))
    }

    pub fn get_symbol_ref(&self, qualified_name: &str) -> Option<NodeRef> {
        self.table.lookup(qualified_name).map(|entry| entry.node)
    }

    pub fn get_symbols_by_type(&self, kind: NodeKind) -> Vec<NodeRef> {
        let count = self.table.get_by_type(kind, None);
        let mut ids = vec![EntryId(0); count];
        self.table.get_by_type(kind, Some(ids.as_mut_slice()));
        ids.iter()
            .filter_map(|id| self.table.entry(*id))
            .map(|entry| entry.node)
            .collect()
    }

    /// Every node holding a resolved edge to `target`
    pub fn find_references(&self, target: NodeRef) -> Vec<NodeRef> {
        self.asts
            .iter()
            .flat_map(|ast| {
                ast.iter()
                    .filter(move |(_, node)| node.has_reference(target))
                    .map(move |(id, _)| ast.node_ref(id))
            })
            .collect()
    }

    pub fn node(&self, target: NodeRef) -> Option<&AstNode> {
        self.asts.node(target)
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<&FileAst> {
        let path = self.normalize(path.as_ref());
        let parsed = self.files.iter().find(|f| f.path == path)?;
        self.asts.get(parsed.id)
    }

    pub fn files(&self) -> &[ParsedFile] {
        &self.files
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn discovered_files(&self) -> &[DiscoveredFile] {
        &self.discovered
    }

    pub fn symbol_table(&self) -> &GlobalSymbolTable {
        &self.table
    }

    pub fn current_include_depth(&self) -> usize {
        self.include_depth
    }

    pub fn stats(&self) -> ProjectStats {
        let (total_references, unresolved_references) = self
            .files
            .iter()
            .fold((0, 0), |(total, unresolved), f| {
                (
                    total + f.stats.total_references,
                    unresolved + f.stats.unresolved_references,
                )
            });
        ProjectStats {
            total_files: self.files.len(),
            total_symbols: self.table.len(),
            total_references,
            unresolved_references,
        }
    }
}
