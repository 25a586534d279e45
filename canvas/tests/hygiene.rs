//! Hygiene: source-tree budgets for the garden canvas crate.
//!
//! Each pattern has a budget (ideally zero) counted over production files in
//! `canvas/src/`. Test files (`*_test.rs`) are exempt. Some patterns are only
//! legal in the browser host, which is the one place allowed to touch the
//! window, read the clock or draw entropy.
#![allow(clippy::absurd_extreme_comparisons)]

use std::fs;
use std::path::Path;

// Panics: these abort the animation loop.
const MAX_UNWRAP: usize = 0;
const MAX_EXPECT: usize = 0;
const MAX_PANIC: usize = 0;
const MAX_UNREACHABLE: usize = 0;
const MAX_TODO: usize = 0;
const MAX_UNIMPLEMENTED: usize = 0;

// Silent loss: failed writes must reach the controller's rollback path.
const MAX_SILENT_DISCARD: usize = 0;
const MAX_DOT_OK: usize = 0;

// Style.
const MAX_ALLOW_DEAD_CODE: usize = 0;
const MAX_PRINT: usize = 0;

/// Files allowed to use browser globals and unseeded entropy.
const HOST_FILES: &[&str] = &["host.rs"];

struct SourceFile {
    path: String,
    content: String,
}

impl SourceFile {
    fn is_host(&self) -> bool {
        HOST_FILES.iter().any(|name| self.path.ends_with(name))
    }
}

fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect_rs_files(Path::new("src"), &mut files);
    files
}

fn collect_rs_files(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out);
            continue;
        }
        let path_str = path.to_string_lossy().to_string();
        if !path_str.ends_with(".rs") || path_str.ends_with("_test.rs") {
            continue;
        }
        if let Ok(content) = fs::read_to_string(&path) {
            out.push(SourceFile { path: path_str, content });
        }
    }
}

fn hits<'a>(files: impl IntoIterator<Item = &'a SourceFile>, pattern: &str) -> Vec<(String, usize)> {
    files
        .into_iter()
        .filter_map(|file| {
            let count = file.content.lines().filter(|line| line.contains(pattern)).count();
            (count > 0).then(|| (file.path.clone(), count))
        })
        .collect()
}

fn assert_budget(pattern: &str, max: usize, found: &[(String, usize)]) {
    let count: usize = found.iter().map(|(_, c)| c).sum();
    let listing = found
        .iter()
        .map(|(path, c)| format!("  {path}: {c}"))
        .collect::<Vec<_>>()
        .join("\n");
    assert!(count <= max, "`{pattern}` budget exceeded: found {count}, max {max}.\n{listing}");
}

fn check(pattern: &str, max: usize) {
    let files = source_files();
    assert_budget(pattern, max, &hits(&files, pattern));
}

fn check_outside_host(pattern: &str) {
    let files = source_files();
    assert_budget(pattern, 0, &hits(files.iter().filter(|f| !f.is_host()), pattern));
}

#[test]
fn sources_are_found() {
    let files = source_files();
    assert!(files.iter().any(|f| f.path.ends_with("engine.rs")), "run from the canvas crate root");
}

#[test]
fn unwrap_budget() {
    check(".unwrap()", MAX_UNWRAP);
}

#[test]
fn expect_budget() {
    check(".expect(", MAX_EXPECT);
}

#[test]
fn panic_budget() {
    check("panic!(", MAX_PANIC);
}

#[test]
fn unreachable_budget() {
    check("unreachable!(", MAX_UNREACHABLE);
}

#[test]
fn todo_budget() {
    check("todo!(", MAX_TODO);
}

#[test]
fn unimplemented_budget() {
    check("unimplemented!(", MAX_UNIMPLEMENTED);
}

#[test]
fn silent_discard_budget() {
    check("let _ =", MAX_SILENT_DISCARD);
}

#[test]
fn dot_ok_budget() {
    check(".ok()", MAX_DOT_OK);
}

#[test]
fn allow_dead_code_budget() {
    check("#[allow(dead_code)]", MAX_ALLOW_DEAD_CODE);
}

#[test]
fn print_budget() {
    check("println!(", MAX_PRINT);
    check("eprintln!(", MAX_PRINT);
    check("dbg!(", MAX_PRINT);
}

#[test]
fn entropy_only_in_host() {
    check_outside_host("Math::random");
    check_outside_host("rand::rng(");
    check_outside_host("from_os_rng");
}

#[test]
fn browser_globals_only_in_host() {
    check_outside_host("web_sys::window(");
    check_outside_host("Date::now");
}
