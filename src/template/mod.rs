//! The tag-expansion template language.
//!
//! Pages are rendered by expanding `[[...]]` tags until nothing more
//! resolves:
//!
//! | Tag                         | Resolves to                                  |
//! |-----------------------------|----------------------------------------------|
//! | `[[+name]]`, `[[*name]]`    | placeholder value, inserted as-is            |
//! | `[[$name &k=`v`]]`          | chunk text, rendered with `k` bound to `v`   |
//! | `[[name &k=`v`]]`           | snippet output                               |
//! | `[[!...]]`                  | the same tag, one pass later                 |
//!
//! Parameter values may contain tags of their own; they are resolved before
//! the enclosing tag is. Malformed tags are copied through as text.
//!
//! ```
//! use docweave::template::{Engine, Params};
//!
//! let mut engine = Engine::new();
//! engine.register_chunk("greet", "Hello, [[+name]]!");
//! engine.set_placeholder("user", "Ada");
//! let html = engine
//!     .render_string("[[$greet &name=`[[+user]]`]]", &Params::new())
//!     .unwrap();
//! assert_eq!(html, "Hello, Ada!");
//! ```
//!
//! ## Modules
//!
//! - [`tag`]: parsed tag model and grammar character classes
//! - [`placeholders`]: the name → value environment
//! - [`resources`]: chunk and snippet caches with search-path lookup
//! - [`snippet`]: the [`Snippet`] trait and script-backed snippets
//! - [`builtins`]: snippets registered by the site generator
//! - [`engine`]: dispatch and the fixed-point loop

pub mod builtins;
pub mod engine;
pub mod placeholders;
mod rendered;
pub mod resources;
mod scanner;
pub mod snippet;
pub mod tag;

pub use engine::{Engine, MAX_DEPTH, MAX_NESTED_RENDERS, MAX_PASSES, RenderError, RenderStats};
pub use placeholders::Placeholders;
pub use resources::{ChunkFiles, Loader, ResourceCache, SnippetScripts};
pub use scanner::MAX_NESTING;
pub use snippet::{ScriptSnippet, Snippet, SnippetError, from_fn};
pub use tag::{Params, Tag, TagKind};
