//! Tag dispatch and the fixed-point expansion loop.
//!
//! ```text
//! render(text, params)
//!   snapshot placeholders, overlay params
//!   repeat ≤ MAX_PASSES:
//!     scan every Text segment once, dispatching tags
//!     stop when a pass resolves nothing
//!   restore snapshot
//! ```
//!
//! Chunks render through the same loop as a nested call with their tag
//! parameters as overlay. Nested calls are capped at [`MAX_DEPTH`] levels and
//! [`MAX_NESTED_RENDERS`] calls per top-level render. A tag that would cross
//! either cap is copied through as verbatim text, so a cyclic include ends
//! with its own unresolved remnant while the tags around it still expand.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace, warn};

use super::placeholders::Placeholders;
use super::rendered::{Rendered, Segment};
use super::resources::{ChunkCache, ChunkFiles, Loader, ResourceCache, SnippetRegistry, SnippetScripts};
use super::scanner::{Dispatch, scan_pass};
use super::snippet::{Snippet, SnippetError};
use super::tag::{Params, Tag, TagKind};

/// Scan passes per render call.
pub const MAX_PASSES: usize = 10;

/// Nested render calls allowed inside one top-level render.
pub const MAX_DEPTH: usize = 32;

/// Nested render calls allowed in total inside one top-level render. Bounds
/// includes that fan out below [`MAX_DEPTH`].
pub const MAX_NESTED_RENDERS: usize = 4096;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("snippet '{name}' failed: {source}")]
    Snippet {
        name: String,
        #[source]
        source: SnippetError,
    },
}

/// Diagnostic counters, accumulated across every render on one engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderStats {
    /// Render calls, nested ones included.
    pub renders: usize,
    /// Scan passes over all render calls.
    pub passes: usize,
    /// Render calls that stopped at [`MAX_PASSES`] with tags still resolving.
    pub budget_exhausted: usize,
    /// Top-level renders in which a nesting cap left tags unexpanded.
    pub depth_limited: usize,
}

impl std::ops::AddAssign for RenderStats {
    fn add_assign(&mut self, other: Self) {
        self.renders += other.renders;
        self.passes += other.passes;
        self.budget_exhausted += other.budget_exhausted;
        self.depth_limited += other.depth_limited;
    }
}

/// The template engine: one placeholder environment plus chunk and snippet
/// caches.
#[derive(Debug)]
pub struct Engine {
    placeholders: Placeholders,
    chunks: Arc<ChunkCache>,
    snippets: Arc<SnippetRegistry>,
    depth: usize,
    nested: usize,
    limited: bool,
    stats: RenderStats,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine loading chunks from `*.html` and snippets from `*.sh` files.
    pub fn new() -> Self {
        Self::with_loaders(ChunkFiles::default(), SnippetScripts::default())
    }

    pub fn with_loaders<C, S>(chunks: C, snippets: S) -> Self
    where
        C: Loader<Resource = Arc<str>> + 'static,
        S: Loader<Resource = Arc<dyn Snippet>> + 'static,
    {
        let chunks: Box<dyn Loader<Resource = Arc<str>>> = Box::new(chunks);
        let snippets: Box<dyn Loader<Resource = Arc<dyn Snippet>>> = Box::new(snippets);
        Self {
            placeholders: Placeholders::new(),
            chunks: Arc::new(ResourceCache::new(chunks)),
            snippets: Arc::new(ResourceCache::new(snippets)),
            depth: 0,
            nested: 0,
            limited: false,
            stats: RenderStats::default(),
        }
    }

    /// A new engine with a copy of this one's placeholders, sharing its
    /// caches and search paths. Stats start at zero.
    pub fn fork(&self) -> Self {
        Self {
            placeholders: self.placeholders.clone(),
            chunks: Arc::clone(&self.chunks),
            snippets: Arc::clone(&self.snippets),
            depth: 0,
            nested: 0,
            limited: false,
            stats: RenderStats::default(),
        }
    }

    // ---------------------------------------------------------------------
    // Configuration
    // ---------------------------------------------------------------------

    /// Search `path` for chunks before every directory added so far.
    pub fn add_chunk_search_path(&mut self, path: impl Into<PathBuf>) {
        self.chunks.add_search_path(path);
    }

    /// Search `path` for snippets before every directory added so far.
    pub fn add_snippet_search_path(&mut self, path: impl Into<PathBuf>) {
        self.snippets.add_search_path(path);
    }

    pub fn chunk_search_paths(&self) -> Vec<PathBuf> {
        self.chunks.search_paths()
    }

    pub fn snippet_search_paths(&self) -> Vec<PathBuf> {
        self.snippets.search_paths()
    }

    // ---------------------------------------------------------------------
    // Placeholders
    // ---------------------------------------------------------------------

    pub fn set_placeholder(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.placeholders.set(name, value);
    }

    pub fn set_placeholders<I, K, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.placeholders.extend(values);
    }

    pub fn unset_placeholder(&mut self, name: &str) -> bool {
        self.placeholders.unset(name)
    }

    pub fn placeholder(&self, name: &str) -> Option<&str> {
        self.placeholders.get(name)
    }

    pub fn get_placeholder<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.placeholders.get_or(name, default)
    }

    // ---------------------------------------------------------------------
    // Chunks and snippets
    // ---------------------------------------------------------------------

    /// Define a chunk in memory. Replaces any cached or loaded entry.
    pub fn register_chunk(&mut self, name: impl Into<String>, text: &str) {
        self.chunks.register(name, Arc::from(text));
    }

    /// Define a snippet in memory. Replaces any cached or loaded entry.
    pub fn register_snippet(&mut self, name: impl Into<String>, snippet: impl Snippet + 'static) {
        self.snippets.register(name, Arc::new(snippet));
    }

    /// Raw, unrendered chunk text.
    pub fn chunk(&self, name: &str) -> Option<Arc<str>> {
        self.chunks.get(name)
    }

    /// `true` if `name` is registered or found on the search path. Loads it
    /// on first use, like [`Engine::chunk`].
    pub fn has_chunk(&self, name: &str) -> bool {
        self.chunks.get(name).is_some()
    }

    /// Invoke a snippet directly. An unknown snippet yields empty text.
    pub fn run_snippet(&mut self, name: &str, params: &Params) -> Result<String, RenderError> {
        let Some(snippet) = self.snippets.get(name) else {
            debug!(snippet = name, "unknown snippet");
            return Ok(String::new());
        };
        snippet
            .execute(self, params)
            .map_err(|source| RenderError::Snippet {
                name: name.to_owned(),
                source,
            })
    }

    // ---------------------------------------------------------------------
    // Rendering
    // ---------------------------------------------------------------------

    /// Render the chunk `name` with `params` overlaid on the placeholders.
    /// An unknown chunk renders as empty text.
    pub fn render_named_chunk(&mut self, name: &str, params: &Params) -> Result<String, RenderError> {
        let Some(text) = self.chunks.get(name) else {
            debug!(chunk = name, "unknown chunk");
            return Ok(String::new());
        };
        self.render(&text, params).map(Rendered::into_string)
    }

    /// Render an ad hoc template fragment.
    pub fn render_string(&mut self, text: &str, params: &Params) -> Result<String, RenderError> {
        self.render(text, params).map(Rendered::into_string)
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    fn render(&mut self, text: &str, params: &Params) -> Result<Rendered, RenderError> {
        if self.depth == 0 {
            self.nested = 0;
            self.limited = false;
        } else {
            self.nested += 1;
        }
        let snapshot = self.placeholders.clone();
        self.placeholders.extend(params.iter());
        self.depth += 1;
        self.stats.renders += 1;

        let result = self.expand(text);

        self.depth -= 1;
        self.placeholders = snapshot;
        result
    }

    fn expand(&mut self, text: &str) -> Result<Rendered, RenderError> {
        let mut current = Rendered::from_text(text);

        for pass in 1..=MAX_PASSES {
            self.stats.passes += 1;
            let mut next = Rendered::default();
            let mut dirty = false;
            for segment in current.into_segments() {
                match segment {
                    Segment::Text(text) => dirty |= scan_pass(&text, self, &mut next)?,
                    Segment::Verbatim(text) => next.push_verbatim(&text),
                }
            }
            current = next;
            if !dirty {
                trace!(pass, depth = self.depth, "render settled");
                return Ok(current);
            }
        }

        self.stats.budget_exhausted += 1;
        warn!(
            passes = MAX_PASSES,
            depth = self.depth,
            "tags still resolving after pass limit; output is partially expanded"
        );
        Ok(current)
    }

    /// `true` if a chunk or snippet tag may resolve at the current depth
    /// without exceeding the nested render budget.
    fn may_descend(&mut self, tag: &Tag) -> bool {
        if self.depth < MAX_DEPTH && self.nested < MAX_NESTED_RENDERS {
            return true;
        }
        if !self.limited {
            self.limited = true;
            self.stats.depth_limited += 1;
            warn!(
                tag = %tag,
                depth = self.depth,
                nested = self.nested,
                "render nesting limit reached; leaving tag unexpanded"
            );
        }
        false
    }
}

impl Dispatch for Engine {
    fn dispatch(&mut self, tag: Tag, source: &str, out: &mut Rendered) -> Result<bool, RenderError> {
        if tag.kind.is_placeholder() {
            out.push_verbatim(self.placeholders.get_or(&tag.name, ""));
            return Ok(true);
        }

        if !self.may_descend(&tag) {
            out.push_verbatim(source);
            return Ok(false);
        }

        match tag.kind {
            TagKind::Chunk => {
                let Some(text) = self.chunks.get(&tag.name) else {
                    debug!(chunk = %tag.name, "unknown chunk");
                    return Ok(true);
                };
                let rendered = self.render(&text, &tag.params)?;
                out.append(rendered);
            }
            _ => {
                let Some(snippet) = self.snippets.get(&tag.name) else {
                    debug!(snippet = %tag.name, "unknown snippet");
                    return Ok(true);
                };
                let text = snippet
                    .execute(self, &tag.params)
                    .map_err(|source| RenderError::Snippet {
                        name: tag.name.clone(),
                        source,
                    })?;
                out.push_text(&text);
            }
        }
        Ok(true)
    }
}
