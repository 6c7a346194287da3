//! Filesystem scanning and manifest generation.
//!
//! Walks the source tree and produces a [`Manifest`]: the loaded site config
//! plus one [`DocSet`] per documentation version. Generation consumes it.
//!
//! ## Directory Structure
//!
//! ```text
//! docs/                            # Source root
//! ├── config.toml                  # Site configuration (optional)
//! ├── layouts/                     # Chunks (*.html) and snippets (*.sh)
//! │   └── default.html
//! ├── index.md                     # → index.html, first in its menu level
//! ├── 01_Introduction.md           # → introduction.html
//! ├── 02_Guide/                    # Section "Guide" → guide/
//! │   ├── 01_Install.md            # → guide/install.html
//! │   ├── 02_Usage.md
//! │   └── diagram.png              # Asset → guide/diagram.png
//! └── v1/                          # Older version listed in `versions`
//!     └── ...                      # Scanned as its own doc set
//! ```
//!
//! ## Naming Conventions
//!
//! - **Ordering prefix** (`NN_name`): controls menu order and is stripped from
//!   output paths and titles. Unnumbered entries sort after numbered ones.
//! - **`index.md`**: leads its directory's menu and gives the section heading
//!   a link.
//! - **Hidden entries** (leading `.`) are skipped.
//!
//! Pages with `in_menu: false` are still generated but left out of the menu.

use crate::config::{self, SiteConfig};
use crate::frontmatter::{self, FrontMatterError};
use crate::naming::{ParsedName, asset_output_path, page_output_path, parse_entry_name};
use crate::types::{Asset, DocSet, NavItem, Page};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Front matter error in {path}: {source}")]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Version directory not found: {0}")]
    MissingVersion(PathBuf),
}

/// Manifest output from the scan stage
#[derive(Debug, Serialize)]
pub struct Manifest {
    pub config: SiteConfig,
    /// The current version first, then each entry of `versions` in order
    pub doc_sets: Vec<DocSet>,
}

impl Manifest {
    /// `true` when older versions were scanned alongside the current one.
    pub fn is_versioned(&self) -> bool {
        self.doc_sets.len() > 1
    }
}

pub fn scan(root: &Path) -> Result<Manifest, ScanError> {
    let config = config::load_config(root)?;
    let excludes = config.scan_excludes();

    let mut doc_sets = vec![scan_doc_set(root, &excludes, &config.version, "")?];

    // Each version directory carries its own copy of the template dirs
    for version in &config.versions {
        let version = version.trim_end_matches('/');
        let dir = root.join(version);
        if !dir.is_dir() {
            return Err(ScanError::MissingVersion(dir));
        }
        doc_sets.push(scan_doc_set(
            &dir,
            &excludes,
            version,
            &format!("{version}/"),
        )?);
    }

    info!(
        doc_sets = doc_sets.len(),
        pages = doc_sets.iter().map(|d| d.pages.len()).sum::<usize>(),
        "scan complete"
    );

    Ok(Manifest { config, doc_sets })
}

fn scan_doc_set(
    dir: &Path,
    excludes: &[String],
    label: &str,
    path: &str,
) -> Result<DocSet, ScanError> {
    let mut pages = Vec::new();
    let mut assets = Vec::new();

    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped(dir, entry, excludes));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = relative_source(dir, entry.path());

        if entry.path().extension().is_some_and(|ext| ext == "md") {
            pages.push(read_page(entry.path(), rel)?);
        } else {
            debug!(source = %rel, "asset");
            assets.push(Asset {
                output: asset_output_path(&rel),
                source: rel,
            });
        }
    }

    pages.sort_by_cached_key(|p| page_sort_key(&p.source));
    let navigation = build_navigation(&pages);

    Ok(DocSet {
        label: label.to_string(),
        path: path.to_string(),
        pages,
        assets,
        navigation,
    })
}

fn is_skipped(root: &Path, entry: &walkdir::DirEntry, excludes: &[String]) -> bool {
    if entry.file_name().to_string_lossy().starts_with('.') {
        return true;
    }
    let rel = relative_source(root, entry.path());
    is_excluded(&rel, entry.file_type().is_dir(), excludes)
}

/// Whether `rel` matches an exclude entry. Entries ending in `/` exclude a
/// directory and everything under it; others must match exactly.
fn is_excluded(rel: &str, is_dir: bool, excludes: &[String]) -> bool {
    excludes.iter().any(|exclude| {
        if exclude.ends_with('/') {
            let probe = if is_dir {
                format!("{rel}/")
            } else {
                rel.to_string()
            };
            probe.starts_with(exclude.as_str())
        } else {
            rel == exclude
        }
    })
}

fn relative_source(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_page(path: &Path, source: String) -> Result<Page, ScanError> {
    let content = fs::read_to_string(path)?;
    let document = frontmatter::parse(&content).map_err(|source| ScanError::FrontMatter {
        path: path.to_path_buf(),
        source,
    })?;
    let front_matter = document.front_matter;

    let title = front_matter.title.unwrap_or_else(|| {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        parse_entry_name(&stem).display_title
    });

    Ok(Page {
        output: page_output_path(&source),
        source,
        title,
        layout: front_matter.layout,
        in_menu: front_matter.in_menu,
        tags: front_matter.tags,
        extra: front_matter.extra,
        body: document.body,
    })
}

type SortKey = (u32, String);

/// Directory keys, then index-first, then the file's own key.
fn page_sort_key(source: &str) -> (Vec<SortKey>, bool, SortKey) {
    let mut segments: Vec<&str> = source.split('/').collect();
    let file = segments.pop().unwrap_or_default();
    let dirs = segments
        .iter()
        .map(|s| parse_entry_name(s).sort_key())
        .collect();
    let stem = file.strip_suffix(".md").unwrap_or(file);
    (dirs, stem != "index", parse_entry_name(stem).sort_key())
}

/// Pages of one directory plus its subdirectories, in insertion order.
#[derive(Default)]
struct DirNode<'a> {
    pages: Vec<&'a Page>,
    dirs: Vec<(String, DirNode<'a>)>,
}

impl<'a> DirNode<'a> {
    fn child(&mut self, segment: &str) -> &mut DirNode<'a> {
        let pos = match self.dirs.iter().position(|(name, _)| name == segment) {
            Some(pos) => pos,
            None => {
                self.dirs.push((segment.to_string(), DirNode::default()));
                self.dirs.len() - 1
            }
        };
        &mut self.dirs[pos].1
    }
}

/// Build the menu tree from pages already in sort order.
fn build_navigation(pages: &[Page]) -> Vec<NavItem> {
    let mut root = DirNode::default();
    for page in pages {
        let mut node = &mut root;
        let mut segments: Vec<&str> = page.source.split('/').collect();
        segments.pop();
        for segment in segments {
            node = node.child(segment);
        }
        node.pages.push(page);
    }
    nav_items(&root, "")
}

fn nav_items(node: &DirNode<'_>, dir_output: &str) -> Vec<NavItem> {
    let mut items: Vec<NavItem> = node
        .pages
        .iter()
        .filter(|p| p.in_menu)
        .map(|p| NavItem::Page {
            title: p.title.clone(),
            path: p.output.clone(),
        })
        .collect();

    for (segment, child) in &node.dirs {
        let ParsedName { name, display_title, .. } = parse_entry_name(segment);
        let name = if dir_output.is_empty() {
            name.to_lowercase()
        } else {
            format!("{dir_output}/{}", name.to_lowercase())
        };
        let index = child
            .pages
            .iter()
            .find(|p| p.is_index())
            .map(|p| p.output.clone());
        let children = nav_items(child, &name);
        if children.is_empty() {
            continue;
        }
        items.push(NavItem::Section {
            title: display_title,
            name,
            index,
            children,
        });
    }
    items
}
