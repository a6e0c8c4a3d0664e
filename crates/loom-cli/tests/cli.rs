//! Integration tests for the `loom` commands.
//!
//! Units are written to temporary files and run through the same code paths
//! as `loom lower` and `loom check`.

use loom_cli::commands::{check, lower, OutputFormat};
use loom_cli::config;
use loom_lower::ast::{ClassDef, ClassKind, CompilationUnit, FieldDef, Member, MethodDef, Symbol, SymbolKind, Tree, Type};
use loom_lower::LowerOptions;
use std::path::PathBuf;
use tempfile::TempDir;

fn method(id: u32, name: &str, body: Option<Tree>) -> Member {
    Member::Method(MethodDef {
        sym: Symbol::member(id, "A", name, SymbolKind::Method),
        params: Vec::new(),
        ret: Type::Int,
        body,
    })
}

fn unit() -> CompilationUnit {
    CompilationUnit {
        classes: vec![ClassDef {
            sym: Symbol::class(1, "A"),
            kind: ClassKind::Class,
            parent: None,
            interfaces: Vec::new(),
            members: vec![
                Member::Field(FieldDef {
                    sym: Symbol::member(2, "A", "x", SymbolKind::Field),
                    ty: Type::Int,
                    mutable: false,
                }),
                method(3, "one", Some(Tree::int(1))),
                method(4, "abstract", None),
            ],
        }],
    }
}

fn write_unit(dir: &TempDir, unit: &CompilationUnit) -> PathBuf {
    let path = dir.path().join("unit.json");
    std::fs::write(&path, serde_json::to_string(unit).unwrap()).unwrap();
    path
}

// ────────────────────────────────────────────────────────────────────────────
// loom lower
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_lower_prints_text() {
    let dir = TempDir::new().unwrap();
    let path = write_unit(&dir, &unit());
    let output = lower::render(&path, LowerOptions::default(), OutputFormat::Text).unwrap();
    let expected = "\
class A
val A::x: i32
define A::one(class A): i32 {
  %0 = start : unit
  %1 = param 0 : class A
  %2 = return 1 [%0] {%0} : nothing
  ; ends: %2
}
declare A::abstract(class A): i32
";
    assert_eq!(output, expected);
}

#[test]
fn test_lower_prints_json() {
    let dir = TempDir::new().unwrap();
    let path = write_unit(&dir, &unit());
    let output = lower::render(&path, LowerOptions::default(), OutputFormat::Json).unwrap();
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["defns"].as_array().map(Vec::len), Some(4));
}

#[test]
fn test_lower_reports_bad_input() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = lower::render(&path, LowerOptions::default(), OutputFormat::Text).unwrap_err();
    assert!(format!("{:#}", err).contains("not a valid compilation unit"));
}

#[test]
fn test_lower_reports_failing_method() {
    let dir = TempDir::new().unwrap();
    let ghost = Symbol::local(99, "ghost");
    let mut broken = unit();
    broken.classes[0]
        .members
        .push(method(5, "bad", Some(Tree::ident(&ghost, Type::Int))));
    let path = write_unit(&dir, &broken);

    let err = lower::render(&path, LowerOptions::default(), OutputFormat::Text).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("failed to lower"));
    assert!(message.contains("A::bad"));
}

// ────────────────────────────────────────────────────────────────────────────
// loom check
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_check_counts_definitions() {
    let dir = TempDir::new().unwrap();
    let path = write_unit(&dir, &unit());
    let summary = check::summarize(&path, LowerOptions::default()).unwrap();
    assert_eq!(
        summary,
        check::Summary {
            classes: 1,
            fields: 1,
            declared: 1,
            defined: 1,
            nodes: 2,
        }
    );
    assert_eq!(
        summary.to_string(),
        "1 classes, 1 fields, 1 methods defined, 1 declared, 2 nodes"
    );
}

#[test]
fn test_check_with_filter_config() {
    let dir = TempDir::new().unwrap();
    let path = write_unit(&dir, &unit());
    let config_path = dir.path().join("loom.toml");
    std::fs::write(&config_path, "method_filter = \"nothing-matches\"\njobs = 2\n").unwrap();

    let options = config::load(Some(&config_path)).unwrap();
    assert_eq!(options.jobs, 2);
    assert!(options.validate);

    let summary = check::summarize(&path, options).unwrap();
    assert_eq!(summary.defined, 0);
    assert_eq!(summary.declared, 2);
}

#[test]
fn test_invalid_config() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("loom.toml");
    std::fs::write(&config_path, "jobs = \"many\"\n").unwrap();
    let err = config::load(Some(&config_path)).unwrap_err();
    assert!(err.to_string().contains("invalid config"));
}
