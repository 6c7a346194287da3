//! CLI output formatting for `check` and `build`.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Every entity (menu
//! entry, page) leads with its positional index and title; source and output
//! paths follow as indented context lines. The output reads as a content
//! inventory while still letting users trace entries back to files.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Menu
//! 001 Home → index.html
//! 002 Introduction → introduction.html
//! 003 Guide
//!     001 Guide overview → guide/index.html
//!     002 Installing → guide/install.html
//!
//! Pages
//!     001 Home
//!         Source: index.md
//!     002 Draft (hidden)
//!         Source: 09_Draft.md
//!
//! Assets
//!     guide/diagram.svg
//!
//! Config
//!     config.toml
//!     layouts/
//! ```
//!
//! A versioned site prints one such block per version, each under a
//! `Version <label> (<path>)` heading.
//!
//! ## Build
//!
//! ```text
//! index.html
//! guide/install.html
//! Skipped broken.html: snippet 'boom' failed: ...
//!
//! Generated 5 pages, 1 asset (1 skipped)
//! Engine: 12 renders, 30 passes
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::generate::GenerateReport;
use crate::scan::Manifest;
use crate::template::RenderStats;
use crate::types::{DocSet, NavItem};
use std::path::Path;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format an entity header: positional index + title, with an optional
/// output path.
///
/// ```text
/// 001 Installing → guide/install.html
/// 003 Guide
/// ```
fn entity_header(index: usize, title: &str, output: Option<&str>) -> String {
    match output {
        Some(path) => format!("{} {} → {}", format_index(index), title, path),
        None => format!("{} {}", format_index(index), title),
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// Tree walker
// ============================================================================

/// A flattened node from walking the NavItem tree.
struct TreeNode<'a> {
    depth: usize,
    position: usize,
    title: &'a str,
    /// Link target: the page itself, or a section's index page
    output: Option<&'a str>,
}

/// Walk the navigation tree, assigning positional indices per sibling level.
fn walk_nav_tree(nav: &[NavItem]) -> Vec<TreeNode<'_>> {
    let mut nodes = Vec::new();
    walk_nav_tree_recursive(nav, 0, &mut nodes);
    nodes
}

fn walk_nav_tree_recursive<'a>(items: &'a [NavItem], depth: usize, nodes: &mut Vec<TreeNode<'a>>) {
    for (i, item) in items.iter().enumerate() {
        let output = match item {
            NavItem::Page { path, .. } => Some(path.as_str()),
            NavItem::Section { .. } => None,
        };
        nodes.push(TreeNode {
            depth,
            position: i + 1,
            title: item.title(),
            output,
        });
        walk_nav_tree_recursive(item.children(), depth + 1, nodes);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format the scanned site: menu tree, pages, assets and config sources.
pub fn format_check_output(manifest: &Manifest, source_root: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, doc_set) in manifest.doc_sets.iter().enumerate() {
        if manifest.is_versioned() {
            if i > 0 {
                lines.push(String::new());
            }
            let location = if doc_set.path.is_empty() {
                "root"
            } else {
                doc_set.path.as_str()
            };
            lines.push(format!("Version {} ({})", doc_set.label, location));
            lines.push(String::new());
        }
        format_doc_set(doc_set, &mut lines);
    }

    lines.push(String::new());
    lines.push("Config".to_string());
    if source_root.join("config.toml").exists() {
        lines.push("    config.toml".to_string());
    }
    let templates = &manifest.config.templates;
    let mut dirs: Vec<&String> = templates.chunk_dirs.iter().collect();
    for dir in &templates.snippet_dirs {
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    for dir in dirs {
        if source_root.join(dir).is_dir() {
            lines.push(format!("    {}/", dir.trim_end_matches('/')));
        }
    }

    lines
}

fn format_doc_set(doc_set: &DocSet, lines: &mut Vec<String>) {
    lines.push("Menu".to_string());
    for node in walk_nav_tree(&doc_set.navigation) {
        lines.push(format!(
            "{}{}",
            indent(node.depth),
            entity_header(node.position, node.title, node.output)
        ));
    }

    if !doc_set.pages.is_empty() {
        lines.push(String::new());
        lines.push("Pages".to_string());
        for (i, page) in doc_set.pages.iter().enumerate() {
            let hidden = if page.in_menu { "" } else { " (hidden)" };
            lines.push(format!(
                "    {} {}{}",
                format_index(i + 1),
                page.title,
                hidden
            ));
            lines.push(format!("        Source: {}", page.source));
            if let Some(ref layout) = page.layout {
                lines.push(format!("        Layout: {}", layout));
            }
        }
    }

    if !doc_set.assets.is_empty() {
        lines.push(String::new());
        lines.push("Assets".to_string());
        for asset in &doc_set.assets {
            lines.push(format!("    {}", asset.output));
        }
    }
}

/// Print check output to stdout.
pub fn print_check_output(manifest: &Manifest, source_root: &Path) {
    for line in format_check_output(manifest, source_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Build output
// ============================================================================

/// Format a build report: written pages, skipped pages, totals.
pub fn format_build_report(report: &GenerateReport) -> Vec<String> {
    let mut lines: Vec<String> = report.written.clone();
    lines.extend(report.search_indexes.iter().cloned());

    for skipped in &report.skipped {
        lines.push(format!("Skipped {}: {}", skipped.path, skipped.error));
    }

    lines.push(String::new());
    let mut summary = format!(
        "Generated {}, {}",
        plural(report.written.len(), "page", "pages"),
        plural(report.assets_copied, "asset", "assets")
    );
    if !report.search_indexes.is_empty() {
        summary.push_str(&format!(
            ", {}",
            plural(report.search_indexes.len(), "search index", "search indexes")
        ));
    }
    if !report.skipped.is_empty() {
        summary.push_str(&format!(" ({} skipped)", report.skipped.len()));
    }
    lines.push(summary);
    lines.push(format_render_stats(&report.stats));

    lines
}

/// One-line engine diagnostics. Budget and depth hits are only listed when
/// they happened.
pub fn format_render_stats(stats: &RenderStats) -> String {
    let mut line = format!(
        "Engine: {}, {}",
        plural(stats.renders, "render", "renders"),
        plural(stats.passes, "pass", "passes")
    );
    if stats.budget_exhausted > 0 {
        line.push_str(&format!(
            ", {} hit the pass limit",
            plural(stats.budget_exhausted, "render", "renders")
        ));
    }
    if stats.depth_limited > 0 {
        line.push_str(&format!(
            ", {} hit the depth limit",
            plural(stats.depth_limited, "page", "pages")
        ));
    }
    line
}

/// Print a build report to stdout.
pub fn print_build_report(report: &GenerateReport) {
    for line in format_build_report(report) {
        println!("{}", line);
    }
}
