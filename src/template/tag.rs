//! Tag model shared by the scanner and the dispatcher.
//!
//! | Form                        | Kind             |
//! |-----------------------------|------------------|
//! | `[[+name]]`                 | Placeholder      |
//! | `[[*name &a=`1`]]`          | PlaceholderAlt   |
//! | `[[$name &a=`1`]]`          | Chunk            |
//! | `[[name &a=`1`]]`           | Snippet          |
//! | `[[!…]]`                    | any of the above, deferred one pass |

use std::fmt;

pub const OPEN: &str = "[[";
pub const CLOSE: &str = "]]";
pub const DEFERRED_MARK: char = '!';

/// What a tag resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// `+`: takes no parameters; an `&` ends parameter scanning.
    Placeholder,
    /// `*`: same lookup as `Placeholder`, but parameters are parsed (and ignored).
    PlaceholderAlt,
    /// `$`: named block of template text.
    Chunk,
    /// No sigil: named executable unit.
    Snippet,
}

impl TagKind {
    pub fn from_sigil(c: char) -> Option<Self> {
        match c {
            '+' => Some(Self::Placeholder),
            '*' => Some(Self::PlaceholderAlt),
            '$' => Some(Self::Chunk),
            _ => None,
        }
    }

    pub fn sigil(self) -> &'static str {
        match self {
            Self::Placeholder => "+",
            Self::PlaceholderAlt => "*",
            Self::Chunk => "$",
            Self::Snippet => "",
        }
    }

    pub fn is_placeholder(self) -> bool {
        matches!(self, Self::Placeholder | Self::PlaceholderAlt)
    }
}

/// Characters allowed in a tag name.
pub fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '/')
}

/// Characters allowed in a parameter name.
pub fn is_param_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Ordered parameter map.
///
/// Keeps first-insertion order; inserting an existing name replaces the value
/// in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of `name`, or `""` when absent.
    pub fn get_or_empty(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Params {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

/// A parsed `[[...]]` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub deferred: bool,
    pub kind: TagKind,
    pub name: String,
    pub params: Params,
}

impl Tag {
    /// The same tag with the deferred mark removed.
    pub fn undeferred(self) -> Self {
        Self {
            deferred: false,
            ..self
        }
    }
}

/// Canonical source form: `[[!$name &a=`1` &b=`2`]]`.
impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(OPEN)?;
        if self.deferred {
            write!(f, "{DEFERRED_MARK}")?;
        }
        write!(f, "{}{}", self.kind.sigil(), self.name)?;
        for (name, value) in self.params.iter() {
            write!(f, " &{name}=`{value}`")?;
        }
        f.write_str(CLOSE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigils_map_to_kinds() {
        assert_eq!(TagKind::from_sigil('+'), Some(TagKind::Placeholder));
        assert_eq!(TagKind::from_sigil('*'), Some(TagKind::PlaceholderAlt));
        assert_eq!(TagKind::from_sigil('$'), Some(TagKind::Chunk));
        assert_eq!(TagKind::from_sigil('a'), None);
    }

    #[test]
    fn name_chars() {
        assert!("site.name/x_1".chars().all(is_name_char));
        assert!(!is_name_char('-'));
        assert!(!is_name_char(' '));
        assert!(!is_param_char('.'));
    }

    #[test]
    fn params_keep_insertion_order_and_replace_in_place() {
        let mut params = Params::new();
        params.insert("b", "1");
        params.insert("a", "2");
        params.insert("b", "3");
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("b", "3"), ("a", "2")]);
        assert_eq!(params.get_or_empty("missing"), "");
    }

    #[test]
    fn display_canonical_form() {
        let tag = Tag {
            deferred: true,
            kind: TagKind::Chunk,
            name: "menu".into(),
            params: Params::from([("depth", "2"), ("class", "nav")]),
        };
        assert_eq!(tag.to_string(), "[[!$menu &depth=`2` &class=`nav`]]");
        assert_eq!(tag.undeferred().to_string(), "[[$menu &depth=`2` &class=`nav`]]");
    }

    #[test]
    fn display_snippet_without_params() {
        let tag = Tag {
            deferred: false,
            kind: TagKind::Snippet,
            name: "toc".into(),
            params: Params::new(),
        };
        assert_eq!(tag.to_string(), "[[toc]]");
    }
}
