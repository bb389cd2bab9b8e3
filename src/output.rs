//! CLI output formatting for build, check and watch passes.
//!
//! # Information-First Display
//!
//! A report leads with *what was derived* (folders, galleries, projects,
//! clips) and only then lists files, as paths relative to the public dir.
//! Files whose bytes did not change are counted, not listed, so a no-op
//! rebuild prints a short summary.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Stills
//!     1 folder index, 2 galleries, 14 images
//!     1 copied cover
//! Motion
//!     2 projects, 5 clips, 3 leaf videos (8 in registry)
//! Wrote 2 files, 9 unchanged (12ms)
//!     Stills/Cats/manifest.json
//!     Stills/manifest.json
//! ```
//!
//! ## Check
//!
//! ```text
//! Stills
//!     ...
//! Plan (11 operations)
//!     Stills/Cats/.images (3 entries)
//!     Stills/Cats/manifest.json (leaf-gallery)
//!     _covers/0123456789abcdef-hero.jpg ← Stills/Cats/hero.jpg.cover
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::pipeline::{BuildReport, PipelineError};
use crate::watch::Trigger;
use crate::write::{FlushReport, WriteOp, WritePlan};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 gallery`, `2 galleries`.
fn count(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}

/// Display a path relative to the public dir, with `/` separators.
fn display_path(path: &Path, public_dir: &Path) -> String {
    let rel = path.strip_prefix(public_dir).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}

fn format_millis(report: &BuildReport) -> String {
    format!("{}ms", report.elapsed.as_millis())
}

// ============================================================================
// Derived summary (shared by build and check)
// ============================================================================

/// Two sections summarizing what a pass derived from both trees.
pub fn format_summary(report: &BuildReport) -> Vec<String> {
    let mut lines = vec![
        "Stills".to_string(),
        format!(
            "{}{}, {}, {}",
            indent(1),
            count(report.folder_indexes, "folder index", "folder indexes"),
            count(report.galleries, "gallery", "galleries"),
            count(report.images, "image", "images"),
        ),
    ];
    if report.copied_covers > 0 {
        lines.push(format!(
            "{}{}",
            indent(1),
            count(report.copied_covers, "copied cover", "copied covers")
        ));
    }
    lines.push("Motion".to_string());
    lines.push(format!(
        "{}{}, {}, {} ({} in registry)",
        indent(1),
        count(report.projects, "project", "projects"),
        count(report.clips, "clip", "clips"),
        count(report.leaf_videos, "leaf video", "leaf videos"),
        report.registry_entries,
    ));
    lines
}

// ============================================================================
// Build
// ============================================================================

fn format_flush(flush: &FlushReport, report: &BuildReport, public_dir: &Path) -> Vec<String> {
    let mut parts = vec![
        format!("Wrote {}", count(flush.written.len(), "file", "files")),
        format!("{} unchanged", flush.unchanged),
    ];
    if !flush.pruned.is_empty() {
        parts.push(format!(
            "{} pruned",
            count(flush.pruned.len(), "stale cover", "stale covers")
        ));
    }
    if !flush.failed.is_empty() {
        parts.push(format!("{} failed", flush.failed.len()));
    }
    let mut lines = vec![format!("{} ({})", parts.join(", "), format_millis(report))];
    for path in flush.written.iter().chain(&flush.copied) {
        lines.push(format!("{}{}", indent(1), display_path(path, public_dir)));
    }
    for path in &flush.pruned {
        lines.push(format!(
            "{}{} (pruned)",
            indent(1),
            display_path(path, public_dir)
        ));
    }
    for path in &flush.failed {
        lines.push(format!(
            "{}{} (failed)",
            indent(1),
            display_path(path, public_dir)
        ));
    }
    lines
}

/// Format the report of a one-shot build.
pub fn format_build_report(report: &BuildReport, public_dir: &Path) -> Vec<String> {
    let mut lines = format_summary(report);
    match &report.flush {
        Some(flush) => lines.extend(format_flush(flush, report, public_dir)),
        None => lines.push(format!("Nothing written ({})", format_millis(report))),
    }
    lines
}

pub fn print_build_report(report: &BuildReport, public_dir: &Path) {
    for line in format_build_report(report, public_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

fn format_op(op: &WriteOp, public_dir: &Path) -> String {
    match op {
        WriteOp::Manifest { path, manifest } => format!(
            "{} ({})",
            display_path(path, public_dir),
            manifest.manifest.kind()
        ),
        WriteOp::Listing { path, names, .. } => format!(
            "{} ({})",
            display_path(path, public_dir),
            count(names.len(), "entry", "entries")
        ),
        WriteOp::CopyFile { from, to } => format!(
            "{} ← {}",
            display_path(to, public_dir),
            display_path(from, public_dir)
        ),
    }
}

/// Format a dry run: the summary plus every planned operation, in order.
pub fn format_check_plan(plan: &WritePlan, report: &BuildReport, public_dir: &Path) -> Vec<String> {
    let mut lines = format_summary(report);
    lines.push(format!(
        "Plan ({}, {})",
        count(plan.ops.len(), "operation", "operations"),
        format_millis(report)
    ));
    for op in &plan.ops {
        lines.push(format!("{}{}", indent(1), format_op(op, public_dir)));
    }
    lines
}

pub fn print_check_plan(plan: &WritePlan, report: &BuildReport, public_dir: &Path) {
    for line in format_check_plan(plan, report, public_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Watch
// ============================================================================

/// One line per watch pass, plus the error when the pass failed.
pub fn format_watch_pass(
    trigger: &Trigger,
    result: &Result<BuildReport, PipelineError>,
) -> Vec<String> {
    let cause = match trigger {
        Trigger::Initial => "Initial build".to_string(),
        Trigger::Changes(changes) => format!(
            "Rebuild after {}",
            count(changes.len(), "change", "changes")
        ),
    };
    match result {
        Ok(report) => {
            let (written, unchanged, failed) = report.flush.as_ref().map_or((0, 0, 0), |f| {
                (f.written.len() + f.copied.len(), f.unchanged, f.failed.len())
            });
            let failed = if failed > 0 {
                format!(", {failed} failed")
            } else {
                String::new()
            };
            vec![format!(
                "{cause}: {} written, {unchanged} unchanged{failed} ({})",
                count(written, "file", "files"),
                format_millis(report)
            )]
        }
        Err(e) => vec![
            format!("{cause} failed"),
            format!("{}{}", indent(1), e),
        ],
    }
}

pub fn print_watch_pass(trigger: &Trigger, result: &Result<BuildReport, PipelineError>) {
    for line in format_watch_pass(trigger, result) {
        println!("{}", line);
    }
}
