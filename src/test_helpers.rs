//! Shared test utilities for the docweave test suite.
//!
//! Provides fixture setup, lookup helpers that panic with the available
//! choices on a miss, navigation tree assertions, and a probe-counting
//! resource loader.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let manifest = scan(tmp.path()).unwrap();
//! let docs = &manifest.doc_sets[0];
//!
//! assert_eq!(find_page(docs, "guide/install.html").title, "Installing");
//! assert_nav_shape(docs, &[
//!     ("Home", &[]),
//!     ("Guide", &["Guide overview", "Installing", "Usage"]),
//! ]);
//! ```

use std::collections::HashMap;
use std::io;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use crate::template::Loader;
use crate::types::{DocSet, NavItem, Page};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/docs/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/docs");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Doc set lookups: panic with a clear message on a miss
// =========================================================================

/// Find a page by output path. Panics if not found.
pub fn find_page<'a>(docs: &'a DocSet, output: &str) -> &'a Page {
    docs.page_by_output(output).unwrap_or_else(|| {
        panic!(
            "page '{output}' not found. Available: {:?}",
            page_outputs(docs)
        )
    })
}

/// All page output paths in doc set order.
pub fn page_outputs(docs: &DocSet) -> Vec<&str> {
    docs.pages.iter().map(|p| p.output.as_str()).collect()
}

// =========================================================================
// Navigation helpers
// =========================================================================

/// Top-level navigation titles in order.
pub fn nav_titles(docs: &DocSet) -> Vec<&str> {
    docs.navigation.iter().map(NavItem::title).collect()
}

/// Find a top-level nav item by title. Panics if not found.
pub fn find_nav<'a>(docs: &'a DocSet, title: &str) -> &'a NavItem {
    docs.navigation
        .iter()
        .find(|n| n.title() == title)
        .unwrap_or_else(|| {
            let titles = nav_titles(docs);
            panic!("nav item '{title}' not found. Available: {titles:?}")
        })
}

/// Child titles under a given nav parent. Panics if parent not found.
pub fn nav_children_titles<'a>(docs: &'a DocSet, parent_title: &str) -> Vec<&'a str> {
    find_nav(docs, parent_title)
        .children()
        .iter()
        .map(NavItem::title)
        .collect()
}

/// Assert that the full navigation tree matches an expected shape.
///
/// Each entry is `(title, children)`. Use `&[]` for pages and childless
/// entries.
pub fn assert_nav_shape(docs: &DocSet, expected: &[(&str, &[&str])]) {
    let actual: Vec<&str> = nav_titles(docs);
    let expected_titles: Vec<&str> = expected.iter().map(|(t, _)| *t).collect();
    assert_eq!(actual, expected_titles, "nav top-level titles mismatch");

    for (title, children) in expected {
        let actual_children = nav_children_titles(docs, title);
        assert_eq!(
            actual_children,
            children.to_vec(),
            "nav children of '{title}' mismatch"
        );
    }
}

// =========================================================================
// Resource loading
// =========================================================================

/// Shared record of how often each name was probed.
#[derive(Debug, Clone, Default)]
pub struct ProbeLog(Arc<Mutex<HashMap<String, usize>>>);

impl ProbeLog {
    pub fn count(&self, name: &str) -> usize {
        self.0.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    fn record(&self, name: &str) {
        *self.0.lock().unwrap().entry(name.to_string()).or_default() += 1;
    }
}

/// A [`Loader`] that finds nothing and counts every probe.
#[derive(Debug)]
pub struct CountingLoader<R> {
    probes: ProbeLog,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Default for CountingLoader<R> {
    fn default() -> Self {
        Self {
            probes: ProbeLog::default(),
            _resource: PhantomData,
        }
    }
}

impl<R> CountingLoader<R> {
    pub fn probes(&self) -> ProbeLog {
        self.probes.clone()
    }
}

impl<R: Clone + Send + Sync> Loader for CountingLoader<R> {
    type Resource = R;

    fn probe(&self, _dir: &Path, name: &str) -> io::Result<Option<R>> {
        self.probes.record(name);
        Ok(None)
    }
}
