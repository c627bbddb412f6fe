//! File system walker for discovering project source files
//!
//! Unlike an indexer that honours `.gitignore`, project discovery considers
//! every regular file under the directory; callers narrow the result with an
//! extension allow-list.

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Walks directories to find candidate project files
#[derive(Debug, Clone, Default)]
pub struct FileWalker {
    extensions: Option<Vec<String>>,
    recursive: bool,
}

impl FileWalker {
    /// Walker accepting every file, recursing into subdirectories
    pub fn new() -> Self {
        Self {
            extensions: None,
            recursive: true,
        }
    }

    /// Only yield files whose extension is in `extensions`.
    /// A leading dot is accepted (`".c"` and `"c"` are the same filter).
    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = Some(
            extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .collect(),
        );
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    fn accepts(&self, path: &Path) -> bool {
        let Some(allowed) = &self.extensions else {
            return true;
        };
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| allowed.iter().any(|a| a == ext))
    }

    /// Walk `root` and return the matching files in a stable order.
    /// Entries that cannot be read are skipped.
    pub fn walk(&self, root: &Path) -> Vec<PathBuf> {
        let mut builder = WalkBuilder::new(root);
        builder
            .standard_filters(false)
            .follow_links(false)
            .max_depth(if self.recursive { None } else { Some(1) })
            .sort_by_file_name(|a, b| a.cmp(b));

        builder
            .build()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .map(|entry| entry.into_path())
            .filter(|path| self.accepts(path))
            .collect()
    }

    /// Count files that would be added
    pub fn count_files(&self, root: &Path) -> usize {
        self.walk(root).len()
    }
}
