//! JavaScript and TypeScript projects with relative imports

use crate::common::TestProject;
use symgraph::{NodeKind, ProjectContext};

#[test]
fn test_javascript_import_and_call() {
    let fixture = TestProject::new();
    fixture.add_file("lib/util.js", "export function pad(s) {\n  return s;\n}\n");
    fixture.add_file(
        "app.js",
        "import { pad } from './lib/util';\n\nexport function run() {\n  return pad('x');\n}\n",
    );

    let mut project = ProjectContext::new(fixture.path());
    project.add_file("app.js", None);
    assert!(project.parse_all_files());
    assert_eq!(project.file_count(), 2);
    project.resolve_references();

    let util = project.get_symbol_ref("util").expect("module registered");
    let importers = project.find_references(util);
    assert_eq!(importers.len(), 1);
    assert_eq!(project.node(importers[0]).unwrap().kind, NodeKind::Import);

    let pad = project.get_symbol_ref("pad").unwrap();
    let callers = project.find_references(pad);
    assert_eq!(callers.len(), 1);
    assert_eq!(project.node(callers[0]).unwrap().kind, NodeKind::Call);
}

#[test]
fn test_typescript_interface_references() {
    let fixture = TestProject::new();
    fixture.add_file("model.ts", "export interface User {\n  name: string;\n}\n");
    fixture.add_file(
        "repo.ts",
        "import { User } from './model';\n\nexport function load(u: User): User {\n  return u;\n}\n",
    );

    let mut project = ProjectContext::new(fixture.path());
    project.add_file("repo.ts", None);
    project.parse_all_files();
    project.resolve_references();

    let user = project.get_symbol("User").expect("interface registered");
    assert_eq!(user.kind, NodeKind::Interface);

    let user_ref = project.get_symbol_ref("User").unwrap();
    let uses = project.find_references(user_ref);
    assert!(!uses.is_empty());
    assert!(uses.iter().all(|r| {
        project
            .node(*r)
            .is_some_and(|n| n.kind == NodeKind::Type && n.file_path.ends_with("repo.ts"))
    }));
}
