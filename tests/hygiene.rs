//! Hygiene: source budgets checked at test time.
//!
//! Scans `src/` (test files excluded) for constructs the overlay must not
//! contain. A render pass has no business crashing the document view, and the
//! library talks through `tracing`, never stdout. Budgets only shrink.
#![allow(clippy::absurd_extreme_comparisons)]

use std::fs;
use std::path::Path;

// Crashes.
const MAX_UNWRAP: usize = 0;
const MAX_EXPECT: usize = 0;
const MAX_PANIC: usize = 0;
const MAX_UNREACHABLE: usize = 0;
const MAX_TODO: usize = 0;
const MAX_UNIMPLEMENTED: usize = 0;

// Silent loss.
const MAX_SILENT_DISCARD: usize = 0;
// One: `OverlayConfig::from_env` treats an unset or non-UTF-8 variable as absent.
const MAX_DOT_OK: usize = 1;

// Output outside tracing. The demo binary prints views and is exempt.
const MAX_LIBRARY_PRINT: usize = 0;
const MAX_DBG: usize = 0;

const MAX_ALLOW_DEAD_CODE: usize = 0;

struct SourceFile {
    path: String,
    content: String,
}

impl SourceFile {
    fn is_binary(&self) -> bool {
        self.path.ends_with("main.rs")
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
        } else if path.extension().is_some_and(|e| e == "rs") {
            let path_str = path.to_string_lossy().to_string();
            if path_str.ends_with("_test.rs") {
                continue;
            }
            if let Ok(content) = fs::read_to_string(&path) {
                out.push(SourceFile { path: path_str, content });
            }
        }
    }
}

fn count_in(files: &[&SourceFile], pattern: &str) -> Vec<(String, usize)> {
    files
        .iter()
        .filter_map(|file| {
            let count = file.content.lines().filter(|line| line.contains(pattern)).count();
            (count > 0).then(|| (file.path.clone(), count))
        })
        .collect()
}

fn total(hits: &[(String, usize)]) -> usize {
    hits.iter().map(|(_, c)| c).sum()
}

fn format_hits(hits: &[(String, usize)]) -> String {
    hits.iter()
        .map(|(path, count)| format!("  {path}: {count}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn check(pattern: &str, max: usize, library_only: bool) {
    let files = source_files();
    assert!(!files.is_empty(), "no sources found under src/");
    let scanned: Vec<&SourceFile> = files.iter().filter(|f| !(library_only && f.is_binary())).collect();
    let hits = count_in(&scanned, pattern);
    let count = total(&hits);
    assert!(
        count <= max,
        "{pattern} budget exceeded: found {count}, max {max}.\n{}",
        format_hits(&hits)
    );
}

#[test]
fn unwrap_budget() {
    check(".unwrap()", MAX_UNWRAP, false);
}

#[test]
fn expect_budget() {
    check(".expect(", MAX_EXPECT, false);
}

#[test]
fn panic_budget() {
    check("panic!(", MAX_PANIC, false);
}

#[test]
fn unreachable_budget() {
    check("unreachable!(", MAX_UNREACHABLE, false);
}

#[test]
fn todo_budget() {
    check("todo!(", MAX_TODO, false);
}

#[test]
fn unimplemented_budget() {
    check("unimplemented!(", MAX_UNIMPLEMENTED, false);
}

#[test]
fn silent_discard_budget() {
    check("let _ =", MAX_SILENT_DISCARD, false);
}

#[test]
fn dot_ok_budget() {
    check(".ok()", MAX_DOT_OK, false);
}

#[test]
fn library_print_budget() {
    check("println!(", MAX_LIBRARY_PRINT, true);
    check("eprintln!(", MAX_LIBRARY_PRINT, true);
}

#[test]
fn dbg_budget() {
    check("dbg!(", MAX_DBG, false);
}

#[test]
fn allow_dead_code_budget() {
    check("#[allow(dead_code)]", MAX_ALLOW_DEAD_CODE, false);
}
