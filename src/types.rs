//! Shared types produced by the scan stage and consumed by generation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A Markdown document in the source tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Source path relative to the doc set root, `/`-separated
    pub source: String,
    /// Output path relative to the doc set root (`guide/install.html`)
    pub output: String,
    /// Front matter `title`, or the file stem without prefix
    pub title: String,
    /// Layout chunk named in front matter; may contain tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    /// Whether the page is listed in the main menu
    pub in_menu: bool,
    /// Front matter `tags`, written to the search index
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Remaining scalar front matter keys, exposed as `page.<key>`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
    /// Markdown body without front matter
    #[serde(skip)]
    pub body: String,
}

impl Page {
    /// `index.md` pages lead their section and link its heading.
    pub fn is_index(&self) -> bool {
        self.output == "index.html" || self.output.ends_with("/index.html")
    }
}

/// A non-Markdown file copied to the output as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Asset {
    pub source: String,
    pub output: String,
}

/// Main-menu tree. Pages link to their output; sections group the pages and
/// subsections of one directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NavItem {
    Page {
        title: String,
        path: String,
    },
    Section {
        title: String,
        /// Output directory path (`guide`, `guide/advanced`)
        name: String,
        /// Output path of the section's index page, if it has one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<String>,
        children: Vec<NavItem>,
    },
}

impl NavItem {
    pub fn title(&self) -> &str {
        match self {
            NavItem::Page { title, .. } | NavItem::Section { title, .. } => title,
        }
    }

    pub fn children(&self) -> &[NavItem] {
        match self {
            NavItem::Page { .. } => &[],
            NavItem::Section { children, .. } => children,
        }
    }
}

/// Everything generated for one document version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocSet {
    /// Version label; empty when the site is unversioned
    pub label: String,
    /// Subdirectory holding this version, relative to the source root, with a
    /// trailing `/`. Empty for the current version.
    pub path: String,
    pub pages: Vec<Page>,
    pub assets: Vec<Asset>,
    pub navigation: Vec<NavItem>,
}

impl DocSet {
    pub fn page_by_output(&self, output: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.output == output)
    }

    /// Whether a page exists at `output`; a directory path also matches its
    /// `index.html`.
    pub fn has_page(&self, output: &str) -> bool {
        let trimmed = output.trim_end_matches('/');
        self.page_by_output(trimmed).is_some()
            || self.page_by_output(&format!("{trimmed}/index.html")).is_some()
    }
}
