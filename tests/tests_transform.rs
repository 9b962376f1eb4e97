//! End-to-end runs: resolve a package, transform it, write the support files
//!
//! Run with: cargo test --test tests_transform

use std::fs;
use std::path::{Path, PathBuf};

use rstest::rstest;
use xtrace::syntax::format_source;
use xtrace::{
    CopyOnlyFilter, FsLoader, InstrumentationConfig, Namespace, ResolutionMode, ResolvedPackage,
    TraceCategories, TransformSummary, resolve_package, transform_tree, write_support_files,
};

// ============================================================
// COMMON HELPER FUNCTIONS
// ============================================================

fn write(root: &Path, rel: &str, text: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, text).unwrap();
    path
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

fn namespace_for(resolved: &ResolvedPackage, seed: u64) -> Namespace {
    let namespace = Namespace::from_seed(seed, resolved.mode);
    match resolved.module() {
        Some(module) => namespace.with_module(module),
        None => namespace,
    }
}

/// Resolve `arg`, transform into `out` and write the support files
fn run(
    arg: &str,
    out: &Path,
    seed: u64,
    categories: TraceCategories,
    filter: &CopyOnlyFilter,
) -> (InstrumentationConfig, TransformSummary) {
    let resolved = resolve_package(arg, &FsLoader).unwrap();
    let config =
        InstrumentationConfig::new(namespace_for(&resolved, seed)).with_categories(categories);
    let summary = transform_tree(&config, &resolved.root, &resolved.files, out, filter).unwrap();
    write_support_files(&config, out).unwrap();
    (config, summary)
}

const MAIN: &str = r#"package main

import "fmt"

func add(a, b int) int {
	return a + b
}

func main() {
	total := 0
	for i := 0; i < 3; i++ {
		total = add(total, i)
	}
	switch {
	case total > 2:
		fmt.Println("big", total)
	default:
		fmt.Println("small")
	}
}
"#;

// ============================================================
// LOOSE FILES
// ============================================================

#[test]
fn test_loose_run_writes_program_library_and_manifest() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let main = write(src.path(), "main.go", MAIN);

    let (config, summary) = run(
        &main.to_string_lossy(),
        out.path(),
        7,
        TraceCategories::all(),
        &CopyOnlyFilter::default(),
    );
    assert_eq!(summary, TransformSummary { rewritten: 1, copied: 0 });

    let token = config.namespace.token().to_string();
    let rewritten = read(out.path(), "main.go");
    assert!(rewritten.contains(&format!("PrintlnCall_{token}(")), "{rewritten}");
    assert!(rewritten.contains(&format!("return_1_{token}")), "{rewritten}");
    assert!(rewritten.contains(&format!("PrintlnStatement_{token}(")), "{rewritten}");
    assert!(rewritten.contains("\" [ main.go:10:2 ]\""), "{rewritten}");
    assert!(!rewritten.contains(&format!("xtrace_{token}\"")), "{rewritten}");

    let library = read(out.path(), &format!("xtrace_{token}.go"));
    assert!(library.starts_with("package main\n") || library.contains("\npackage main\n"));
    assert_eq!(
        read(out.path(), "go.mod"),
        format!("module xtrace_{token}\n\ngo 1.21\n")
    );
}

#[test]
fn test_same_seed_gives_identical_output() {
    let src = tempfile::tempdir().unwrap();
    let main = write(src.path(), "main.go", MAIN);
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();

    let (a, _) = run(
        &main.to_string_lossy(),
        first.path(),
        99,
        TraceCategories::all(),
        &CopyOnlyFilter::default(),
    );
    let (b, _) = run(
        &main.to_string_lossy(),
        second.path(),
        99,
        TraceCategories::all(),
        &CopyOnlyFilter::default(),
    );
    assert_eq!(a.namespace.token(), b.namespace.token());
    assert_eq!(read(first.path(), "main.go"), read(second.path(), "main.go"));
    let library = format!("xtrace_{}.go", a.namespace.token());
    assert_eq!(read(first.path(), &library), read(second.path(), &library));
}

#[rstest]
#[case::statement(
    TraceCategories::none().with_statement(true),
    &["PrintlnStatement_"],
    &["PrintlnVariable_", "PrintlnCall_", "PrintlnReturn_"]
)]
#[case::variable(
    TraceCategories::none().with_variable(true),
    &["PrintlnVariable_"],
    &["PrintlnStatement_", "PrintlnCall_", "PrintlnReturn_"]
)]
#[case::call(
    TraceCategories::none().with_call(true),
    &["PrintlnCall_", "PrintlnReturn_", "PrintlnVariable_"],
    &["PrintlnStatement_"]
)]
#[case::clause(
    TraceCategories::none().with_clause(true),
    &["PrintlnStatement_"],
    &["PrintlnVariable_", "PrintlnCall_", "PrintlnReturn_"]
)]
fn test_categories_select_primitives(
    #[case] categories: TraceCategories,
    #[case] present: &[&str],
    #[case] absent: &[&str],
) {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let main = write(src.path(), "main.go", MAIN);

    run(
        &main.to_string_lossy(),
        out.path(),
        1,
        categories,
        &CopyOnlyFilter::default(),
    );
    let rewritten = read(out.path(), "main.go");
    for primitive in present {
        assert!(rewritten.contains(primitive), "missing {primitive} in\n{rewritten}");
    }
    for primitive in absent {
        assert!(!rewritten.contains(primitive), "unexpected {primitive} in\n{rewritten}");
    }
}

#[test]
fn test_no_categories_reproduces_formatted_source() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let main = write(src.path(), "main.go", MAIN);

    run(
        &main.to_string_lossy(),
        out.path(),
        1,
        TraceCategories::none(),
        &CopyOnlyFilter::default(),
    );
    assert_eq!(read(out.path(), "main.go"), format_source(MAIN).unwrap());
}

// ============================================================
// MODULE DIRECTORIES
// ============================================================

fn module_tree(root: &Path) {
    write(root, "go.mod", "module example.com/app\n\ngo 1.21\n");
    write(
        root,
        "cmd/app/main.go",
        "package main\n\nimport \"example.com/app/internal/greet\"\n\nfunc main() {\n\tprintln(greet.Hello())\n}\n",
    );
    write(
        root,
        "internal/greet/greet.go",
        "package greet\n\nfunc Hello() string {\n\treturn \"hi\"\n}\n",
    );
    write(
        root,
        "internal/greet/table_gen.go",
        "package greet\n\nvar table = []int{1, 2, 3}\n",
    );
}

#[test]
fn test_module_run_links_library_by_import() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    module_tree(src.path());

    let (config, summary) = run(
        &src.path().join("cmd/app").to_string_lossy(),
        out.path(),
        3,
        TraceCategories::all(),
        &CopyOnlyFilter::default(),
    );
    assert_eq!(summary, TransformSummary { rewritten: 3, copied: 1 });
    assert_eq!(config.namespace.mode(), ResolutionMode::ModuleDirectory);

    let token = config.namespace.token().to_string();
    let main = read(out.path(), "cmd/app/main.go");
    assert!(
        main.contains(&format!("\"example.com/app/xtrace_{token}\"")),
        "{main}"
    );
    assert!(
        main.contains(&format!("xtrace_{token}.PrintlnStatement_{token}(")),
        "{main}"
    );
    assert!(main.contains("[ cmd/app/main.go:6:2 ]"), "{main}");

    assert_eq!(read(out.path(), "go.mod"), read(src.path(), "go.mod"));
    let library = read(out.path(), &format!("xtrace_{token}/xtrace_{token}.go"));
    assert!(library.contains(&format!("package xtrace_{token}\n")));
    assert!(!out.path().join(format!("xtrace_{token}.go")).exists());
}

#[test]
fn test_copy_only_files_are_copied_verbatim() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    module_tree(src.path());
    let filter = CopyOnlyFilter::new(&["_gen\\.go$".to_string()], None).unwrap();

    let (_, summary) = run(
        &src.path().join("cmd/app").to_string_lossy(),
        out.path(),
        3,
        TraceCategories::all(),
        &filter,
    );
    assert_eq!(summary, TransformSummary { rewritten: 2, copied: 2 });
    assert_eq!(
        read(out.path(), "internal/greet/table_gen.go"),
        read(src.path(), "internal/greet/table_gen.go")
    );
}

#[cfg(unix)]
#[test]
fn test_permissions_follow_source() {
    use std::os::unix::fs::PermissionsExt;

    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let main = write(src.path(), "main.go", MAIN);
    fs::set_permissions(&main, fs::Permissions::from_mode(0o600)).unwrap();

    run(
        &main.to_string_lossy(),
        out.path(),
        1,
        TraceCategories::all(),
        &CopyOnlyFilter::default(),
    );
    let mode = fs::metadata(out.path().join("main.go")).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}
