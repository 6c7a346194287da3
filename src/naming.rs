//! Centralized filename parsing for the `NN_name` convention.
//!
//! Documents and section directories may carry a numeric ordering prefix
//! followed by an underscore. The prefix controls menu order and never shows
//! up in output paths:
//!
//! - `02_Getting_Started/` → section "Getting Started", output `getting_started/`
//! - `01_Install.md` → page "Install", output `install.html`
//! - `faq.md` → page "faq", sorted after every numbered sibling
//!
//! Underscores in the name portion become spaces in display titles. Output
//! paths are lowercased.

/// Result of parsing an entry name like `02_Getting_Started`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Number prefix if present (e.g., `2` from `02_Getting_Started`)
    pub number: Option<u32>,
    /// Name after the prefix, underscores preserved.
    /// For unnumbered entries, this is the full input.
    pub name: String,
    /// Display title: name with underscores converted to spaces.
    pub display_title: String,
}

impl ParsedName {
    /// Key that orders numbered entries first, then by name.
    pub fn sort_key(&self) -> (u32, String) {
        (self.number.unwrap_or(u32::MAX), self.name.to_lowercase())
    }
}

/// Parse an entry name following the `NN_name` convention.
///
/// - `"02_Getting_Started"` → number=Some(2), name="Getting_Started", display_title="Getting Started"
/// - `"10_faq"` → number=Some(10), name="faq", display_title="faq"
/// - `"01_"` → number=Some(1), name="", display_title=""
/// - `"faq"` → number=None, name="faq", display_title="faq"
/// - `"2024"` → number=None, name="2024" (no underscore, not a prefix)
pub fn parse_entry_name(name: &str) -> ParsedName {
    match split_prefix(name) {
        Some((number, rest)) => ParsedName {
            number: Some(number),
            name: rest.to_string(),
            display_title: rest.replace('_', " "),
        },
        None => ParsedName {
            number: None,
            name: name.to_string(),
            display_title: name.replace('_', " "),
        },
    }
}

fn split_prefix(name: &str) -> Option<(u32, &str)> {
    let (digits, rest) = name.split_once('_')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(|n| (n, rest))
}

/// Remove the ordering prefix from every `/`-separated segment.
pub fn strip_order_prefixes(path: &str) -> String {
    path.split('/')
        .map(|segment| split_prefix(segment).map_or(segment, |(_, rest)| rest))
        .collect::<Vec<_>>()
        .join("/")
}

/// Output path of a document: prefixes stripped, `.md` → `.html`, lowercased.
pub fn page_output_path(source: &str) -> String {
    let stripped = strip_order_prefixes(source);
    let html = match stripped.strip_suffix(".md") {
        Some(stem) => format!("{stem}.html"),
        None => stripped,
    };
    html.to_lowercase()
}

/// Output path of an asset: prefixes stripped, lowercased.
pub fn asset_output_path(source: &str) -> String {
    strip_order_prefixes(source).to_lowercase()
}

/// Relative prefix leading from `output_path` back to the doc set root
/// (`guide/install.html` → `../`).
pub fn path_to_root(output_path: &str) -> String {
    "../".repeat(output_path.matches('/').count())
}
