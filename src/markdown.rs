//! Markdown → HTML conversion.
//!
//! Relative link and image targets are rewritten while converting so they
//! point at generated output: ordering prefixes are dropped from every path
//! segment, `.md` links become `.html`, and the path is lowercased.
//! `02_Guide/01_Install.md#setup` becomes `guide/install.html#setup`.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

use crate::naming::strip_order_prefixes;

/// Converts a Markdown body to an HTML fragment.
pub trait MarkdownConverter: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}

/// [`MarkdownConverter`] backed by `pulldown-cmark`.
#[derive(Debug, Clone)]
pub struct PulldownMarkdown {
    options: Options,
}

impl Default for PulldownMarkdown {
    fn default() -> Self {
        Self::new()
    }
}

impl PulldownMarkdown {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        Self { options }
    }
}

impl MarkdownConverter for PulldownMarkdown {
    fn render(&self, markdown: &str) -> String {
        let events = Parser::new_ext(markdown, self.options).map(|event| match event {
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => Event::Start(Tag::Link {
                link_type,
                dest_url: rewrite_target(dest_url, true),
                title,
                id,
            }),
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => Event::Start(Tag::Image {
                link_type,
                dest_url: rewrite_target(dest_url, false),
                title,
                id,
            }),
            other => other,
        });

        let mut out = String::new();
        html::push_html(&mut out, events);
        out
    }
}

fn rewrite_target(target: CowStr<'_>, is_link: bool) -> CowStr<'_> {
    if !is_relative(&target) {
        return target;
    }
    CowStr::from(rewrite_relative(&target, is_link))
}

/// Rewrite a relative URL to its generated counterpart. The fragment and
/// query are kept as written.
pub fn rewrite_relative(url: &str, is_link: bool) -> String {
    let split = url.find(['#', '?']).unwrap_or(url.len());
    let (path, suffix) = url.split_at(split);

    let mut path = strip_order_prefixes(path);
    if is_link && let Some(stem) = path.strip_suffix(".md") {
        path = format!("{stem}.html");
    }
    format!("{}{suffix}", path.to_lowercase())
}

fn is_relative(url: &str) -> bool {
    !(url.is_empty()
        || url.starts_with('#')
        || url.starts_with('/')
        || url.starts_with("//")
        || has_scheme(url))
}

fn has_scheme(url: &str) -> bool {
    match url.find(':') {
        Some(colon) => {
            let scheme = &url[..colon];
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Replace `[` and `]` with HTML entities so converted content can't open
/// template tags.
pub fn escape_tag_brackets(html: &str) -> String {
    html.replace('[', "&#91;").replace(']', "&#93;")
}
