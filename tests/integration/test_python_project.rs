//! Python modules and imports

use crate::common::TestProject;
use symgraph::{NodeKind, ProjectContext};

#[test]
fn test_from_import_pulls_in_module() {
    let fixture = TestProject::new();
    fixture.add_file("utils.py", "def helper():\n    return 1\n");
    fixture.add_file(
        "app.py",
        "from utils import helper\n\ndef main():\n    return helper()\n",
    );

    let mut project = ProjectContext::new(fixture.path());
    project.add_file("app.py", None);
    assert!(project.parse_all_files());
    assert_eq!(project.file_count(), 2);
    assert!(project.resolve_references());

    // Every file is a module named after its stem
    let utils = project.get_symbol("utils").expect("module registered");
    assert_eq!(utils.kind, NodeKind::Module);

    let helper = project.get_symbol_ref("helper").unwrap();
    let references = project.find_references(helper);
    let kinds: Vec<NodeKind> = references
        .iter()
        .filter_map(|r| project.node(*r))
        .map(|n| n.kind)
        .collect();
    println!("references to helper: {kinds:?}");
    assert!(kinds.contains(&NodeKind::Import));
    assert!(kinds.contains(&NodeKind::Call));
}

#[test]
fn test_import_statement_targets_module() {
    let fixture = TestProject::new();
    fixture.add_file("pkg/models.py", "class User:\n    pass\n");
    fixture.add_file("app.py", "import pkg.models\n");

    let mut project = ProjectContext::new(fixture.path());
    project.add_file("app.py", None);
    project.parse_all_files();
    project.resolve_references();

    assert!(project.file("pkg/models.py").is_some());
    let models = project.get_symbol_ref("models").expect("module registered");
    assert_eq!(project.find_references(models).len(), 1);
}

#[test]
fn test_repeated_resolution_is_stable() {
    let fixture = TestProject::new();
    fixture.add_file(
        "zoo.py",
        "class Animal:\n    pass\n\nclass Dog(Animal):\n    pass\n",
    );

    let mut project = ProjectContext::new(fixture.path());
    project.add_file("zoo.py", None);
    project.parse_all_files();

    project.resolve_references();
    let first = project.stats();
    project.resolve_references();
    let second = project.stats();

    println!("first={first:?} second={second:?}");
    assert!(first.total_references >= 1);
    assert_eq!(first, second);

    let animal = project.get_symbol_ref("Animal").unwrap();
    assert_eq!(project.find_references(animal).len(), 1);
}

#[test]
fn test_base_class_edge_returns_after_reload() {
    let fixture = TestProject::new();
    fixture.add_file("base.py", "class Animal:\n    pass\n");
    fixture.add_file("dog.py", "class Dog(Animal):\n    pass\n");

    let mut project = ProjectContext::new(fixture.path());
    project.add_file("base.py", None);
    project.add_file("dog.py", None);
    project.parse_all_files();
    project.resolve_references();

    let animal = project.get_symbol_ref("Animal").unwrap();
    assert_eq!(project.find_references(animal).len(), 1);

    assert!(project.remove_file("base.py"));
    assert!(project.get_symbol_ref("Animal").is_none());
    let dog = project.get_symbol("Dog").unwrap();
    assert!(dog.references.is_empty());
    assert_eq!(dog.pending.len(), 1);
    assert_eq!(dog.pending[0].resolved, None);

    project.add_file("base.py", None);
    project.parse_all_files();
    project.resolve_references();

    let animal = project.get_symbol_ref("Animal").unwrap();
    assert_eq!(project.find_references(animal).len(), 1);
    let dog = project.get_symbol("Dog").unwrap();
    assert_eq!(dog.references, vec![animal]);
    assert_eq!(dog.pending[0].resolved, Some(animal));
}

#[test]
fn test_annotations_reference_classes() {
    let fixture = TestProject::new();
    fixture.add_file("models.py", "class User:\n    pass\n");
    fixture.add_file(
        "service.py",
        "from models import User\n\ndef greet(user: User) -> str:\n    return 'hi'\n",
    );

    let mut project = ProjectContext::new(fixture.path());
    project.add_file("service.py", None);
    project.parse_all_files();
    project.resolve_references();

    let user = project.get_symbol_ref("User").unwrap();
    let kinds: Vec<NodeKind> = project
        .find_references(user)
        .iter()
        .filter_map(|r| project.node(*r))
        .map(|n| n.kind)
        .collect();
    assert!(kinds.contains(&NodeKind::Type), "references: {kinds:?}");
}
