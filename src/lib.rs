//! # docweave
//!
//! A documentation site generator built around a small tag-expansion template
//! language. Your filesystem is the data source: Markdown files become pages,
//! directories become menu sections, and layouts are plain HTML sprinkled
//! with `[[...]]` tags.
//!
//! # Architecture: Scan, Then Generate
//!
//! ```text
//! 1. Scan      docs/     →  Manifest   (filesystem → doc sets, pages, menu)
//! 2. Generate  Manifest  →  dist/      (engine renders every page's layout)
//! ```
//!
//! The [`template`] engine is independent of the site pipeline. It knows
//! nothing about Markdown or menus; the generator feeds it placeholders and
//! asks it to render a layout chunk.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`template`] | The tag language: scanner, placeholders, chunk and snippet caches, fixed-point renderer |
//! | [`scan`] | Walks the source directory and produces the [`scan::Manifest`] |
//! | [`generate`] | Renders every page through the engine, writes the site and its search index |
//! | [`config`] | `config.toml` loading, validation and merging over stock defaults |
//! | [`frontmatter`] | YAML front matter split from Markdown documents |
//! | [`markdown`] | Markdown → HTML with link rewriting |
//! | [`types`] | Shared types passed from scan to generate (`Page`, `NavItem`, `DocSet`) |
//! | [`naming`] | `NN_name` filename convention parser and output path rules |
//! | [`output`] | CLI output formatting for `check` and `build` |
//!
//! # Design Decisions
//!
//! ## Text In, Text Out
//!
//! The engine rescans its output until nothing changes, bounded by a pass
//! limit and nesting limits. A tag that would nest too deep is left as it is,
//! so a cyclic include leaves a visible remnant without stopping the tags
//! around it. Placeholder values are inserted as-is and
//! never rescanned, so page content cannot smuggle tags into a layout; the
//! generator additionally entity-encodes `[` and `]` in converted Markdown.
//!
//! ## Snippets Are Programs
//!
//! A snippet is anything implementing [`template::Snippet`]. File-backed
//! snippets are executables (`layouts/<name>.sh`) run with their parameters
//! in `SNIPPET_*` environment variables. Their standard output is the
//! result. The built-in `if` snippet covers the common conditional case
//! without a process spawn.
//!
//! ## NN_ Prefix Ordering
//!
//! Files and directories use a numeric prefix (`01_`, `20_`) for explicit menu
//! ordering, parsed by [`naming::parse_entry_name`]. The prefix never reaches
//! output paths or titles, and Markdown links written against source names are
//! rewritten to match.
//!
//! ## Versions Side by Side
//!
//! Older documentation versions live in subdirectories of the source and are
//! built into the same subdirectory of the output, each with its own menu and
//! optional layout overrides. Every page gets an `<option>` list of the
//! versions that have the same page.

pub mod config;
pub mod frontmatter;
pub mod generate;
pub mod markdown;
pub mod naming;
pub mod output;
pub mod scan;
pub mod template;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
