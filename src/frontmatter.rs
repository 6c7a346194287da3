//! YAML front matter.
//!
//! ```text
//! ---
//! title: Installing
//! layout: wide
//! in_menu: false
//! tags: [setup, linux]    # search index tags
//! audience: admins        # → page.audience
//! ---
//! # Markdown body
//! ```
//!
//! The block must open on the first line. Without one, the whole text is the
//! body.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_yaml::Value;
use thiserror::Error;
use tracing::debug;

const DELIMITER: &str = "---";

#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("front matter opened with '---' but never closed")]
    Unterminated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub layout: Option<String>,
    pub in_menu: bool,
    /// A list of scalars, or a single scalar as one tag
    pub tags: Vec<String>,
    /// Other scalar keys, stringified
    pub extra: BTreeMap<String, String>,
}

impl Default for FrontMatter {
    fn default() -> Self {
        Self {
            title: None,
            layout: None,
            in_menu: true,
            tags: Vec::new(),
            extra: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub front_matter: FrontMatter,
    pub body: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFrontMatter {
    title: Option<Value>,
    layout: Option<Value>,
    in_menu: Option<bool>,
    tags: Option<Value>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

/// Split `document` into front matter and Markdown body.
pub fn parse(document: &str) -> Result<Document, FrontMatterError> {
    let Some((yaml, body)) = split(document)? else {
        return Ok(Document {
            front_matter: FrontMatter::default(),
            body: document.to_string(),
        });
    };

    let raw: RawFrontMatter = if yaml.trim().is_empty() {
        RawFrontMatter::default()
    } else {
        serde_yaml::from_str(yaml)?
    };

    let mut extra = BTreeMap::new();
    for (key, value) in raw.extra {
        match scalar(&value) {
            Some(text) => {
                extra.insert(key, text);
            }
            None => debug!(key, "ignoring non-scalar front matter value"),
        }
    }

    Ok(Document {
        front_matter: FrontMatter {
            title: raw.title.as_ref().and_then(scalar),
            layout: raw.layout.as_ref().and_then(scalar),
            in_menu: raw.in_menu.unwrap_or(true),
            tags: raw.tags.as_ref().map(tag_list).unwrap_or_default(),
            extra,
        },
        body: body.to_string(),
    })
}

/// Returns `(yaml, body)` when the document opens with a delimiter line.
fn split(document: &str) -> Result<Option<(&str, &str)>, FrontMatterError> {
    let document = document.strip_prefix('\u{feff}').unwrap_or(document);
    let Some(first_newline) = document.find('\n') else {
        return Ok(None);
    };
    if document[..first_newline].trim_end() != DELIMITER {
        return Ok(None);
    }

    let yaml_start = first_newline + 1;
    let mut line_start = yaml_start;
    for line in document[yaml_start..].split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let yaml = &document[yaml_start..line_start];
            let body = &document[line_start + line.len()..];
            return Ok(Some((yaml, body)));
        }
        line_start += line.len();
    }
    Err(FrontMatterError::Unterminated)
}

fn tag_list(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(items) => items
            .iter()
            .filter_map(scalar)
            .filter(|tag| !tag.is_empty())
            .collect(),
        other => scalar(other).filter(|tag| !tag.is_empty()).into_iter().collect(),
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}
