use codegraph_graph::RelType;
use codegraph_indexer::ProjectExtractor;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn extracts_a_small_project_with_cross_unit_calls() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.py", "def f():\n    pass\n");
    write(dir.path(), "b.py", "import a\n\ndef g():\n    a.f()\n");

    let output = ProjectExtractor::new(dir.path(), "")
        .unwrap()
        .extract()
        .unwrap();

    assert_eq!(output.stats.files, 2);
    let graph = &output.graph;

    let g = graph.node("b.g").expect("caller node");
    assert!(g
        .relations
        .iter()
        .any(|r| r.rel_type == RelType::Calls && r.target == "a.f"));

    let f = graph.node("a.f").expect("callee node");
    assert!(f
        .relations
        .iter()
        .any(|r| r.rel_type == RelType::CalledBy && r.source == "b.g"));
}

#[test]
fn package_prefix_and_init_modules_shape_qualified_names() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "sub/__init__.py", "");
    write(dir.path(), "sub/mod.py", "class C:\n    pass\n");

    let output = ProjectExtractor::new(dir.path(), "github.com/org/repo")
        .unwrap()
        .extract()
        .unwrap();

    let graph = &output.graph;
    assert!(graph.contains("github.com/org/repo.sub"));
    assert!(graph.contains("github.com/org/repo.sub.mod"));
    assert!(graph.contains("github.com/org/repo.sub.mod.C"));
}

#[test]
fn unreadable_unit_is_skipped_without_aborting_the_run() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "good.py", "x = 1\n");
    fs::write(dir.path().join("bad.py"), [0xff, 0xfe, 0x00, 0x9f]).unwrap();

    let output = ProjectExtractor::new(dir.path(), "")
        .unwrap()
        .extract()
        .unwrap();

    assert_eq!(output.stats.files, 1);
    assert_eq!(output.stats.errors.len(), 1);
    assert!(output.stats.errors[0].contains("bad.py"));
    assert!(output.graph.contains("good"));
}

#[test]
fn extraction_output_is_deterministic_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "m.py",
        "class C(Base):\n    def m(self):\n        return helper()\n\ndef helper():\n    return 1\n",
    );

    let run = || {
        let output = ProjectExtractor::new(dir.path(), "pkg")
            .unwrap()
            .extract()
            .unwrap();
        serde_json::to_string_pretty(&output.graph).unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn missing_root_is_a_fatal_caller_error() {
    let err = ProjectExtractor::new("/definitely/not/here", "").unwrap_err();
    assert!(err.to_string().contains("Invalid project path"));
}
