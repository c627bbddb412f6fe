//! Include and import discovery
//!
//! Maps the `Include`/`Import` nodes of a parsed file onto files on disk so
//! the project can pull them into the next parse round. Targets that do not
//! exist are skipped.

use crate::ast::{AstNode, FileAst, NodeKind};
use crate::config::ProjectConfig;
use crate::parsing::Language;
use crate::parsing::javascript::resolution::import_specifier;
use std::path::{Component, Path, PathBuf};

/// Extensions tried for an extension-less JS/TS specifier, in order
const SCRIPT_EXTENSIONS: &[&str] = &["js", "ts", "jsx", "tsx", "mjs", "cjs"];

/// A file named by an include or import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub path: PathBuf,
    pub language: Option<Language>,
}

/// Every existing file `ast` includes or imports, deduplicated, in source
/// order
pub fn collect_dependencies(ast: &FileAst, config: &ProjectConfig, root: &Path) -> Vec<Dependency> {
    let base = ast.path().parent().unwrap_or(root);
    let mut found: Vec<Dependency> = Vec::new();

    for (_, node) in ast.iter() {
        let candidates = match (node.kind, ast.language()) {
            (NodeKind::Include, Language::C | Language::Cpp) => include_candidates(node, config, base, root),
            (NodeKind::Import, Language::Python) => python_candidates(node, base, root),
            (NodeKind::Import, Language::JavaScript | Language::TypeScript) => {
                script_candidates(&node.name, base)
            }
            _ => continue,
        };

        let Some(path) = candidates
            .into_iter()
            .map(|p| clean_path(&p))
            .find(|p| p.is_file())
        else {
            tracing::debug!(
                "No file found for {} '{}' in {}",
                node.kind,
                node.name,
                ast.path().display()
            );
            continue;
        };
        if path == ast.path() || found.iter().any(|d| d.path == path) {
            continue;
        }

        let language = match Language::from_path(&path) {
            // Headers follow the including file's dialect
            Some(Language::C) if ast.language() == Language::Cpp => Some(Language::Cpp),
            Some(language) => Some(language),
            None => Some(ast.language()),
        };
        found.push(Dependency { path, language });
    }

    found
}

/// `"x.h"` is relative to the including file, then the project root.
/// `<x.h>` is searched in the system include directories.
fn include_candidates(
    node: &AstNode,
    config: &ProjectConfig,
    base: &Path,
    root: &Path,
) -> Vec<PathBuf> {
    let name = node.name.trim();
    if name.is_empty() {
        return Vec::new();
    }

    if node.property("system") == Some("true") {
        if !config.parse_headers {
            return Vec::new();
        }
        return config
            .system_include_dirs
            .iter()
            .map(|dir| dir.join(name))
            .collect();
    }

    vec![base.join(name), root.join(name)]
}

/// `import a.b` -> `a/b.py` or `a/b/__init__.py`; a from-import also tries the
/// module it names (`from a import f` -> `a.py`)
fn python_candidates(node: &AstNode, base: &Path, root: &Path) -> Vec<PathBuf> {
    let mut modules: Vec<&str> = vec![node.name.as_str()];
    if let Some(module) = node.property("module") {
        modules.push(module);
    }

    let mut candidates = Vec::new();
    for module in modules {
        let relative = module.starts_with('.');
        let dotted = module.trim_start_matches('.');
        if dotted.is_empty() {
            continue;
        }
        let as_path: PathBuf = dotted.split('.').collect();

        let dirs: &[&Path] = if relative { &[base] } else { &[base, root] };
        for dir in dirs {
            candidates.push(dir.join(&as_path).with_extension("py"));
            candidates.push(dir.join(&as_path).join("__init__.py"));
        }
    }
    candidates
}

/// Only relative specifiers (`./x`, `../x`) name project files
fn script_candidates(specifier: &str, base: &Path) -> Vec<PathBuf> {
    let specifier = import_specifier(specifier);
    if !specifier.starts_with("./") && !specifier.starts_with("../") {
        return Vec::new();
    }

    let target = base.join(specifier);
    let mut candidates = vec![target.clone()];
    for ext in SCRIPT_EXTENSIONS {
        candidates.push(append_extension(&target, ext));
    }
    for ext in SCRIPT_EXTENSIONS {
        candidates.push(target.join(format!("index.{ext}")));
    }
    candidates
}

/// Drop `.` segments and fold `dir/..` pairs without touching the disk
pub fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(
                    cleaned.components().next_back(),
                    Some(Component::Normal(_))
                ) {
                    cleaned.pop();
                } else {
                    cleaned.push(component);
                }
            }
            other => cleaned.push(other),
        }
    }
    if cleaned.as_os_str().is_empty() {
        cleaned.push(".");
    }
    cleaned
}

/// `util.service` + `ts` -> `util.service.ts` (not `util.ts`)
fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".");
    os.push(ext);
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FileId, NodeId};
    use std::fs;
    use tempfile::TempDir;

    fn names(deps: &[Dependency], root: &Path) -> Vec<String> {
        deps.iter()
            .map(|d| {
                d.path
                    .strip_prefix(root)
                    .unwrap_or(&d.path)
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path(Path::new("/a/./b/../c.h")), PathBuf::from("/a/c.h"));
        assert_eq!(clean_path(Path::new("../x/./y")), PathBuf::from("../x/y"));
        assert_eq!(clean_path(Path::new("./.")), PathBuf::from("."));
    }

    #[test]
    fn test_c_quoted_and_system_includes() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let system = root.join("sysroot");
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(&system).unwrap();
        fs::write(root.join("src/util.h"), "int util(void);").unwrap();
        fs::write(root.join("common.h"), "").unwrap();
        fs::write(system.join("stdio.h"), "").unwrap();

        let mut ast = FileAst::new(FileId(1), root.join("src/main.c"), Language::C);
        ast.add_child(NodeId::ROOT, AstNode::new(NodeKind::Include, "util.h"));
        ast.add_child(NodeId::ROOT, AstNode::new(NodeKind::Include, "common.h"));
        ast.add_child(NodeId::ROOT, AstNode::new(NodeKind::Include, "missing.h"));
        let mut stdio = AstNode::new(NodeKind::Include, "stdio.h");
        stdio.set_property("system", "true");
        ast.add_child(NodeId::ROOT, stdio);

        let mut config = ProjectConfig {
            system_include_dirs: vec![system.clone()],
            ..ProjectConfig::default()
        };
        let deps = collect_dependencies(&ast, &config, root);
        assert_eq!(
            names(&deps, root),
            vec!["src/util.h", "common.h", "sysroot/stdio.h"]
        );
        assert!(deps.iter().all(|d| d.language == Some(Language::C)));

        config.parse_headers = false;
        let deps = collect_dependencies(&ast, &config, root);
        assert_eq!(names(&deps, root), vec!["src/util.h", "common.h"]);
    }

    #[test]
    fn test_cpp_headers_keep_cpp_dialect() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("shape.h"), "class Shape {};").unwrap();

        let mut ast = FileAst::new(FileId(1), root.join("main.cpp"), Language::Cpp);
        ast.add_child(NodeId::ROOT, AstNode::new(NodeKind::Include, "shape.h"));

        let deps = collect_dependencies(&ast, &ProjectConfig::default(), root);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].language, Some(Language::Cpp));
    }

    #[test]
    fn test_python_imports() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("pkg/sub")).unwrap();
        fs::write(root.join("pkg/models.py"), "class User: pass").unwrap();
        fs::write(root.join("pkg/sub/__init__.py"), "").unwrap();
        fs::write(root.join("helpers.py"), "def helper(): pass").unwrap();

        let mut ast = FileAst::new(FileId(1), root.join("app.py"), Language::Python);
        ast.add_child(NodeId::ROOT, AstNode::new(NodeKind::Import, "pkg.models"));
        ast.add_child(NodeId::ROOT, AstNode::new(NodeKind::Import, "pkg.sub"));
        ast.add_child(NodeId::ROOT, AstNode::new(NodeKind::Import, "os.path"));
        let mut from = AstNode::new(NodeKind::Import, "helpers.helper");
        from.set_property("module", "helpers");
        ast.add_child(NodeId::ROOT, from);

        let deps = collect_dependencies(&ast, &ProjectConfig::default(), root);
        assert_eq!(
            names(&deps, root),
            vec!["pkg/models.py", "pkg/sub/__init__.py", "helpers.py"]
        );
    }

    #[test]
    fn test_script_relative_specifiers() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("lib/widgets")).unwrap();
        fs::write(root.join("lib/util.js"), "export function pad() {}").unwrap();
        fs::write(root.join("lib/widgets/index.ts"), "").unwrap();
        fs::write(root.join("lib/user.service.ts"), "").unwrap();

        let mut ast = FileAst::new(FileId(1), root.join("app.ts"), Language::TypeScript);
        ast.add_child(NodeId::ROOT, AstNode::new(NodeKind::Import, "./lib/util"));
        ast.add_child(NodeId::ROOT, AstNode::new(NodeKind::Import, "./lib/widgets"));
        ast.add_child(NodeId::ROOT, AstNode::new(NodeKind::Import, "./lib/user.service"));
        ast.add_child(NodeId::ROOT, AstNode::new(NodeKind::Import, "react"));

        let deps = collect_dependencies(&ast, &ProjectConfig::default(), root);
        assert_eq!(
            names(&deps, root),
            vec!["lib/util.js", "lib/widgets/index.ts", "lib/user.service.ts"]
        );
        assert_eq!(deps[0].language, Some(Language::JavaScript));
        assert_eq!(deps[1].language, Some(Language::TypeScript));
    }
}
