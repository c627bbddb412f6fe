//! End-to-end C projects: include discovery, symbol registration and
//! reference resolution through the project context.

use crate::common::TestProject;
use symgraph::{NodeKind, ProjectConfig, ProjectContext, ProjectErrorCode};

const HELPER_H: &str = "int helper(void);\n";
const HELPER_C: &str = "#include \"helper.h\"\n\nint helper(void) {\n    return 42;\n}\n";
const MAIN_C: &str = "#include \"helper.h\"\n\nint main(void) {\n    return helper();\n}\n";

fn helper_project() -> TestProject {
    let project = TestProject::new();
    project.add_file("helper.h", HELPER_H);
    project.add_file("helper.c", HELPER_C);
    project.add_file("main.c", MAIN_C);
    project
}

#[test]
fn test_call_resolves_to_definition_across_files() {
    let fixture = helper_project();
    let mut project = ProjectContext::new(fixture.path());

    let added = project.add_directory(".", Some(&["c", "h"][..]), true);
    assert_eq!(added, 3);
    assert!(project.parse_all_files());
    assert!(project.resolve_references());

    // The prototype and the body are both registered; lookup prefers the body
    assert_eq!(project.symbol_table().lookup_all("helper").len(), 2);
    let helper_ref = project.get_symbol_ref("helper").expect("helper registered");
    let helper = project.get_symbol("helper").unwrap();
    assert_eq!(helper.kind, NodeKind::Function);
    assert!(helper.is_definition());
    assert!(helper.file_path.ends_with("helper.c"));

    let main_ast = project.file("main.c").expect("main.c parsed");
    let calls: Vec<_> = main_ast
        .iter()
        .filter(|(_, n)| n.kind == NodeKind::Call && n.name == "helper")
        .collect();
    assert_eq!(calls.len(), 1);
    let (_, call) = calls[0];
    assert_eq!(call.references, vec![helper_ref]);

    let callers = project.find_references(helper_ref);
    assert_eq!(callers.len(), 1);
    println!("helper is referenced from {}", callers[0]);

    let stats = project.stats();
    println!("stats: {stats:?}");
    assert_eq!(stats.total_files, 3);
    assert!(stats.total_references >= 1);
    assert!(stats.unresolved_references < stats.total_references);
}

#[test]
fn test_include_is_discovered_during_parse() {
    let fixture = TestProject::new();
    fixture.add_file("main.c", MAIN_C);
    fixture.add_file("helper.h", HELPER_H);

    let mut project = ProjectContext::new(fixture.path());
    assert!(project.add_file("main.c", None));
    assert_eq!(project.discovered_files().len(), 1);

    assert!(project.parse_all_files());
    assert_eq!(project.file_count(), 2);
    assert_eq!(project.current_include_depth(), 0);
    assert!(project.file("helper.h").is_some());

    // Only the prototype exists, so the call resolves to the declaration
    project.resolve_references();
    let prototype = project.get_symbol("helper").unwrap();
    assert!(!prototype.is_definition());
}

#[test]
fn test_struct_field_access() {
    let fixture = TestProject::new();
    fixture.add_file("point.h", "struct Point {\n    int x;\n    int y;\n};\n");
    fixture.add_file(
        "main.c",
        "#include \"point.h\"\n\nint get_x(struct Point *p) {\n    return p->x;\n}\n",
    );

    let mut project = ProjectContext::new(fixture.path());
    project.add_file("main.c", None);
    project.parse_all_files();
    project.resolve_references();

    let point = project.get_symbol_ref("Point").expect("struct registered");
    let point_ast = project.file("point.h").unwrap();
    let x = point_ast
        .find_child(point.node, "x")
        .map(|id| point_ast.node_ref(id))
        .expect("field x");

    let access = project.find_references(x);
    assert_eq!(access.len(), 1);
    assert_eq!(project.node(access[0]).unwrap().name, "p->x");
}

#[test]
fn test_remove_file_sweeps_symbols_and_edges() {
    let fixture = helper_project();
    let mut project = ProjectContext::new(fixture.path());
    project.add_directory(".", Some(&["c", "h"][..]), true);
    project.parse_all_files();
    project.resolve_references();

    let helper_c = fixture.path().join("helper.c");
    let definition = project.get_symbol_ref("helper").unwrap();
    assert!(project.symbol_table().get_by_file(&helper_c, None) > 0);

    assert!(project.remove_file("helper.c"));
    assert_eq!(project.symbol_table().get_by_file(&helper_c, None), 0);
    assert!(project.find_references(definition).is_empty());
    assert_eq!(project.file_count(), 2);

    // The header prototype is what remains
    let remaining = project.get_symbol("helper").unwrap();
    assert!(remaining.file_path.ends_with("helper.h"));
}

#[test]
fn test_max_files_stops_directory_scan() {
    let fixture = helper_project();
    let config = ProjectConfig {
        max_files: 2,
        ..ProjectConfig::default()
    };
    let mut project = ProjectContext::with_config(fixture.path(), config);

    assert_eq!(project.add_directory(".", None, true), 2);
    let error = project.last_error().expect("limit reported");
    assert_eq!(error.code, ProjectErrorCode::TooManyFiles);
}

#[test]
fn test_static_functions_are_file_scoped() {
    let fixture = TestProject::new();
    fixture.add_file(
        "util.c",
        "static int clamp(int v) { return v; }\nint api(int v) { return clamp(v); }\n",
    );

    let mut project = ProjectContext::new(fixture.path());
    project.add_file("util.c", None);
    project.parse_all_files();

    let table = project.symbol_table();
    let clamp = table.lookup("clamp").unwrap();
    assert_eq!(clamp.scope, symgraph::SymbolScope::File);
    assert_eq!(project.get_symbols_by_type(NodeKind::Function).len(), 2);
}

#[test]
fn test_field_access_through_typedef_of_tagged_struct() {
    let fixture = TestProject::new();
    fixture.add_file(
        "point.c",
        "struct Point {\n    int x;\n    int y;\n};\ntypedef struct Point Point;\n\nint f(Point *p) {\n    return p->x;\n}\n",
    );

    let mut project = ProjectContext::new(fixture.path());
    project.add_file("point.c", None);
    project.parse_all_files();
    project.resolve_references();

    let ast = project.file("point.c").unwrap();
    let (point, _) = ast
        .iter()
        .find(|(_, n)| n.kind == NodeKind::Struct && n.name == "Point")
        .expect("struct Point");
    let x = ast.node_ref(ast.find_child(point, "x").expect("field x"));

    let access = project.find_references(x);
    assert_eq!(access.len(), 1);
    assert_eq!(project.node(access[0]).unwrap().name, "p->x");
}

#[test]
fn test_declared_types_reference_struct() {
    let fixture = TestProject::new();
    fixture.add_file("point.h", "struct Point {\n    int x;\n};\n");
    fixture.add_file(
        "main.c",
        "#include \"point.h\"\n\nint get(struct Point *p) {\n    struct Point copy = *p;\n    return copy.x;\n}\n",
    );

    let mut project = ProjectContext::new(fixture.path());
    project.add_file("main.c", None);
    project.parse_all_files();
    project.resolve_references();

    let point = project.get_symbol_ref("Point").unwrap();
    let uses: Vec<_> = project
        .find_references(point)
        .into_iter()
        .filter_map(|r| project.node(r))
        .filter(|n| n.kind == NodeKind::Type)
        .collect();
    assert_eq!(uses.len(), 2);
}
