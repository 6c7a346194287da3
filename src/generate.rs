//! HTML site generation.
//!
//! Takes the scan [`Manifest`] and writes the static site. Every page is
//! rendered through the template engine: the page's Markdown becomes
//! `page.content`, and its layout chunk decides everything around it.
//!
//! ## Placeholders
//!
//! | Name | Value |
//! |------|-------|
//! | `site.name`, `site.copyright`, `site.theme` | from `config.toml` |
//! | `site.version` | label of the doc set being generated |
//! | `site.toRoot` | relative prefix back to the doc set root (`../`) |
//! | `site.themeRoot` | relative prefix back to the output root |
//! | `site.mainMenu` | menu `<li>` items, current page marked `class="active"` |
//! | `page.title`, `page.content` | title and converted body |
//! | `page.tags` | front matter tags, space separated |
//! | `page.versions` | `<option>` list of versions that have this page |
//! | `page.<key>` | any other scalar front matter key |
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html
//! ├── introduction.html
//! ├── tipuesearch_content.js   # search index, one per version
//! ├── guide/
//! │   ├── install.html
//! │   └── diagram.png          # assets copied alongside
//! └── v1/                      # older versions, same layout
//!     ├── index.html
//!     └── tipuesearch_content.js
//! ```
//!
//! Pages render in parallel on the rayon pool. Each gets a fork of its doc
//! set's engine, so placeholders never leak between pages while chunk and
//! snippet lookups are shared.

use crate::config::SiteConfig;
use crate::markdown::{MarkdownConverter, PulldownMarkdown, escape_tag_brackets};
use crate::naming::path_to_root;
use crate::scan::Manifest;
use crate::template::{Engine, Params, RenderError, RenderStats, builtins};
use crate::types::{DocSet, NavItem, Page};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Search index error: {0}")]
    SearchIndex(#[from] serde_json::Error),
    #[error("failed to render {page}: {source}")]
    Render {
        page: String,
        #[source]
        source: RenderError,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    /// Skip pages that fail to render instead of aborting the build.
    pub keep_going: bool,
}

/// What a build produced.
#[derive(Debug, Default, Serialize)]
pub struct GenerateReport {
    /// Output paths written, relative to the output root
    pub written: Vec<String>,
    /// Search index files, relative to the output root
    pub search_indexes: Vec<String>,
    pub skipped: Vec<SkippedPage>,
    pub assets_copied: usize,
    /// Engine diagnostics summed over every page
    pub stats: RenderStats,
}

#[derive(Debug, Serialize)]
pub struct SkippedPage {
    pub path: String,
    pub error: String,
}

pub fn generate(
    manifest: &Manifest,
    source_root: &Path,
    output_dir: &Path,
    options: GenerateOptions,
) -> Result<GenerateReport, GenerateError> {
    let markdown = PulldownMarkdown::new();
    let mut report = GenerateReport::default();

    for doc_set in &manifest.doc_sets {
        let set_output = output_dir.join(&doc_set.path);
        fs::create_dir_all(&set_output)?;

        report.assets_copied += copy_assets(doc_set, source_root, &set_output)?;

        let engine = base_engine(source_root, &manifest.config, doc_set);
        let context = SetContext {
            config: &manifest.config,
            doc_sets: &manifest.doc_sets,
            doc_set,
            markdown: &markdown,
        };

        let outcomes: Vec<(&Page, Result<(String, RenderStats), RenderError>)> = doc_set
            .pages
            .par_iter()
            .map(|page| {
                let mut engine = engine.fork();
                let html = render_page(&mut engine, &context, page);
                (page, html.map(|html| (html, engine.stats())))
            })
            .collect();

        for (page, outcome) in outcomes {
            let rel = format!("{}{}", doc_set.path, page.output);
            match outcome {
                Ok((html, stats)) => {
                    let dest = set_output.join(&page.output);
                    if let Some(parent) = dest.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::write(&dest, html)?;
                    debug!(page = %rel, "written");
                    report.stats += stats;
                    report.written.push(rel);
                }
                Err(source) if options.keep_going => {
                    warn!(page = %rel, error = %source, "skipping page");
                    report.skipped.push(SkippedPage {
                        path: rel,
                        error: source.to_string(),
                    });
                }
                Err(source) => return Err(GenerateError::Render { page: rel, source }),
            }
        }

        fs::write(set_output.join(SEARCH_INDEX_FILE), search_index(doc_set)?)?;
        report
            .search_indexes
            .push(format!("{}{SEARCH_INDEX_FILE}", doc_set.path));
    }

    info!(
        written = report.written.len(),
        skipped = report.skipped.len(),
        assets = report.assets_copied,
        "generation complete"
    );
    Ok(report)
}

/// Engine shared by every page of one doc set: site placeholders, the
/// built-in snippets and template search paths. A version doc set also looks
/// in its own template directories first.
pub fn base_engine(source_root: &Path, config: &SiteConfig, doc_set: &DocSet) -> Engine {
    let mut engine = Engine::new();
    builtins::register(&mut engine);

    let mut roots: Vec<PathBuf> = vec![source_root.to_path_buf()];
    if !doc_set.path.is_empty() {
        roots.push(source_root.join(&doc_set.path));
    }
    for root in &roots {
        for dir in &config.templates.chunk_dirs {
            engine.add_chunk_search_path(root.join(dir));
        }
        for dir in &config.templates.snippet_dirs {
            engine.add_snippet_search_path(root.join(dir));
        }
    }

    engine.set_placeholders([
        ("site.name", config.site_name.as_str()),
        ("site.copyright", config.copyright.as_str()),
        ("site.theme", config.theme.as_str()),
        ("site.version", doc_set.label.as_str()),
    ]);
    engine
}

/// Search index written at the root of every doc set.
pub const SEARCH_INDEX_FILE: &str = "tipuesearch_content.js";

#[derive(Serialize)]
struct SearchIndex<'a> {
    pages: Vec<SearchEntry<'a>>,
}

#[derive(Serialize)]
struct SearchEntry<'a> {
    title: &'a str,
    text: &'a str,
    tags: String,
    url: &'a str,
}

/// Tipue Search content for one doc set: every page, hidden ones included,
/// with its Markdown source as the searchable text. URLs are relative to the
/// doc set root.
pub fn search_index(doc_set: &DocSet) -> Result<String, serde_json::Error> {
    let index = SearchIndex {
        pages: doc_set
            .pages
            .iter()
            .map(|page| SearchEntry {
                title: &page.title,
                text: &page.body,
                tags: page.tags.join(" "),
                url: &page.output,
            })
            .collect(),
    };
    Ok(format!("var tipuesearch = {};", serde_json::to_string(&index)?))
}

struct SetContext<'a> {
    config: &'a SiteConfig,
    doc_sets: &'a [DocSet],
    doc_set: &'a DocSet,
    markdown: &'a dyn MarkdownConverter,
}

fn render_page(
    engine: &mut Engine,
    context: &SetContext<'_>,
    page: &Page,
) -> Result<String, RenderError> {
    let to_root = path_to_root(&page.output);
    let version_up = if context.doc_set.path.is_empty() { "" } else { "../" };
    engine.set_placeholder("site.toRoot", to_root.as_str());
    engine.set_placeholder("site.themeRoot", format!("{version_up}{to_root}"));

    let content = escape_tag_brackets(&context.markdown.render(&page.body));

    let layout = page
        .layout
        .as_deref()
        .unwrap_or(context.config.layout.as_str());
    let layout = engine.render_string(layout, &Params::new())?;
    let layout = layout.trim();

    let mut params: Params = page
        .extra
        .iter()
        .map(|(key, value)| (format!("page.{key}"), value.clone()))
        .collect();
    params.insert(
        "site.mainMenu",
        render_main_menu(&context.doc_set.navigation, &to_root, &page.output),
    );
    params.insert("page.title", page.title.as_str());
    params.insert("page.tags", page.tags.join(" "));
    params.insert("page.content", content);
    params.insert(
        "page.versions",
        version_options(context.doc_sets, context.doc_set, &page.output),
    );

    if !engine.has_chunk(layout) {
        warn!(page = %page.source, layout, "layout chunk not found");
    }
    engine.render_named_chunk(layout, &params)
}

/// Menu HTML for a page. The top level is bare `<li>` items; nested levels
/// are wrapped in `<ul>`. Links are relative through `to_root`.
pub fn render_main_menu(items: &[NavItem], to_root: &str, active: &str) -> String {
    let mut html = String::new();

    for item in items {
        if let NavItem::Page { title, path } = item {
            let class = if path == active { r#" class="active""# } else { "" };
            html.push_str(&format!(
                "<li{class}><a href=\"{to_root}{path}\">{title}</a></li>\n"
            ));
        }
    }

    for item in items {
        if let NavItem::Section {
            title,
            index,
            children,
            ..
        } = item
        {
            let child_html = render_main_menu(children, to_root, active);
            if child_html.is_empty() {
                continue;
            }
            let child_html = format!("<ul>\n{child_html}</ul>\n");
            match index {
                Some(index) => html.push_str(&format!(
                    "<li><a href=\"{to_root}{index}\">{title}</a> {child_html}</li>\n"
                )),
                None => html.push_str(&format!(
                    "<li><span class=\"folder\">{title}</span> {child_html}</li>\n"
                )),
            }
        }
    }

    html
}

/// `<option>` entries for every version that has a page at `output`, the
/// current one selected. Empty for an unversioned site.
pub fn version_options(doc_sets: &[DocSet], current: &DocSet, output: &str) -> String {
    if doc_sets.len() <= 1 {
        return String::new();
    }
    let version_up = if current.path.is_empty() { "" } else { "../" };
    let to_site_root = format!("{}{version_up}", path_to_root(output));

    doc_sets
        .iter()
        .filter(|set| set.has_page(output))
        .map(|set| {
            let selected = if set.label == current.label {
                r#" selected="selected""#
            } else {
                ""
            };
            format!(
                "<option value=\"{to_site_root}{}{output}\"{selected}>Version {}</option>",
                set.path, set.label
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn copy_assets(doc_set: &DocSet, source_root: &Path, set_output: &Path) -> std::io::Result<usize> {
    let set_source = source_root.join(&doc_set.path);
    for asset in &doc_set.assets {
        let dest = set_output.join(&asset.output);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(set_source.join(&asset.source), &dest)?;
    }
    Ok(doc_set.assets.len())
}

/// Render an ad hoc template file with the current doc set's engine.
/// `values` are set as placeholders before rendering.
pub fn render_template(
    manifest: &Manifest,
    source_root: &Path,
    template: &str,
    values: &[(String, String)],
) -> Result<(String, RenderStats), RenderError> {
    let mut engine = match manifest.doc_sets.first() {
        Some(doc_set) => base_engine(source_root, &manifest.config, doc_set),
        None => Engine::new(),
    };
    engine.set_placeholders(values.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    let html = engine.render_string(template, &Params::new())?;
    Ok((html, engine.stats()))
}
