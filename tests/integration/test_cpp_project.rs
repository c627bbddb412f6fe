//! C++ namespaces across a header and a source file

use crate::common::TestProject;
use symgraph::{Language, NodeKind, ProjectContext};

#[test]
fn test_namespace_qualified_call() {
    let fixture = TestProject::new();
    fixture.add_file(
        "geo.hpp",
        "namespace geo {\nint scale(int v) { return v * 2; }\n}\n",
    );
    fixture.add_file(
        "main.cpp",
        "#include \"geo.hpp\"\n\nint main() {\n    return geo::scale(3);\n}\n",
    );

    let mut project = ProjectContext::new(fixture.path());
    project.add_file("main.cpp", None);
    assert!(project.parse_all_files());
    assert!(project.resolve_references());

    // The header was discovered through the include and parsed as C++
    let header = project
        .files()
        .iter()
        .find(|f| f.path.ends_with("geo.hpp"))
        .expect("header parsed");
    assert_eq!(header.language, Language::Cpp);

    let scale = project.get_symbol_ref("geo::scale").expect("qualified name");
    let geo = project.get_symbol("geo").unwrap();
    assert_eq!(geo.kind, NodeKind::Namespace);

    let callers = project.find_references(scale);
    assert_eq!(callers.len(), 1);
    let call = project.node(callers[0]).unwrap();
    assert_eq!(call.kind, NodeKind::Call);
    assert_eq!(call.name, "geo::scale");
}

#[test]
fn test_class_members_are_scoped() {
    let fixture = TestProject::new();
    fixture.add_file(
        "shape.cpp",
        "namespace geo {\nclass Shape {\npublic:\n    double area() const { return 0; }\n};\n}\n",
    );

    let mut project = ProjectContext::new(fixture.path());
    project.add_file("shape.cpp", None);
    project.parse_all_files();

    let area = project.get_symbol("geo::Shape::area").expect("method registered");
    assert_eq!(area.kind, NodeKind::Method);
    assert_eq!(area.qualified_name, "geo::Shape::area");
    assert_eq!(project.get_symbols_by_type(NodeKind::Class).len(), 1);
}
