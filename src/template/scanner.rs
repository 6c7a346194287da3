//! Tag scanner and grammar parser.
//!
//! One call to [`scan_pass`] walks the input left to right, copies plain text
//! through, and hands every `[[...]]` span to a [`Dispatch`] implementation.
//!
//! ```text
//! TAG   := "[[" "!"? SIGIL? NAME PARAM* "]]"
//! SIGIL := "+" | "*" | "$"
//! NAME  := [a-zA-Z0-9_./]+
//! PARAM := "&" IDENT "=" "`" VALUE "`"
//! ```
//!
//! Parameter values may themselves contain tags. Those are parsed and
//! dispatched right away by re-entering [`parse_tag`] on the same cursor, and
//! their output is spliced into the value.
//!
//! A span that never reaches `]]`, or that hits an unexpected character, is
//! copied out literally from the opening `[[` to the cursor, and scanning
//! resumes there.

use super::engine::RenderError;
use super::rendered::Rendered;
use super::tag::{CLOSE, DEFERRED_MARK, OPEN, Params, Tag, TagKind, is_name_char, is_param_char};

/// Nested tags inside parameter values are followed this deep; beyond it a
/// `[[` in a value is kept as literal text.
pub const MAX_NESTING: usize = 16;

/// Resolves a parsed tag into `out`.
///
/// `source` is the raw span (`[[` through `]]`) for implementations that
/// decline to resolve and copy the tag through instead. Returns whether the
/// tag was resolved, which marks the pass dirty.
pub(crate) trait Dispatch {
    fn dispatch(&mut self, tag: Tag, source: &str, out: &mut Rendered)
    -> Result<bool, RenderError>;
}

struct Cursor<'s> {
    src: &'s str,
    pos: usize,
}

impl<'s> Cursor<'s> {
    fn new(src: &'s str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'s str {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if pred(c)) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }
}

/// Run one left-to-right pass over `src`, appending to `out`.
///
/// Returns `true` if at least one tag resolved (or was un-deferred).
pub(crate) fn scan_pass<D: Dispatch + ?Sized>(
    src: &str,
    dispatcher: &mut D,
    out: &mut Rendered,
) -> Result<bool, RenderError> {
    let mut cursor = Cursor::new(src);
    let mut dirty = false;

    while let Some(offset) = cursor.rest().find('[') {
        let at = cursor.pos + offset;
        if src[at + 1..].starts_with('[') {
            out.push_text(&src[cursor.pos..at]);
            cursor.pos = at + OPEN.len();
            parse_tag(&mut cursor, dispatcher, out, &mut dirty, 0)?;
        } else {
            // lone '['
            out.push_text(&src[cursor.pos..=at]);
            cursor.pos = at + 1;
        }
    }
    out.push_text(cursor.rest());

    Ok(dirty)
}

/// Parse one tag whose `[[` has just been consumed.
fn parse_tag<D: Dispatch + ?Sized>(
    cursor: &mut Cursor<'_>,
    dispatcher: &mut D,
    out: &mut Rendered,
    dirty: &mut bool,
    nesting: usize,
) -> Result<(), RenderError> {
    let start = cursor.pos;
    let deferred = cursor.eat(DEFERRED_MARK);

    let kind = match cursor.peek().and_then(TagKind::from_sigil) {
        Some(kind) => {
            cursor.bump();
            kind
        }
        None => TagKind::Snippet,
    };

    let name = cursor.take_while(is_name_char);
    let name_ends_cleanly = match cursor.peek() {
        Some(c) => c == ']' || c == '&' || c.is_whitespace(),
        None => false,
    };
    if name.is_empty() || !name_ends_cleanly {
        emit_literal(cursor, start, out);
        return Ok(());
    }

    let mut params = Params::new();
    let mut closed = false;

    while let Some(c) = cursor.peek() {
        if cursor.eat_str(CLOSE) {
            closed = true;
            break;
        }
        if c == '&' {
            cursor.bump();
            if cursor.eat_str("nbsp;") {
                continue;
            }
            if kind == TagKind::Placeholder {
                // placeholders take no parameters: skip straight to the close
                match cursor.rest().find(CLOSE) {
                    Some(offset) => {
                        cursor.pos += offset + CLOSE.len();
                        closed = true;
                    }
                    None => cursor.pos = cursor.src.len(),
                }
                break;
            }
            cursor.eat_str("amp;");

            let param = cursor.take_while(is_param_char);
            if param.is_empty() || !cursor.eat_str("=`") {
                break;
            }
            match parse_value(cursor, dispatcher, dirty, nesting)? {
                Some(value) => params.insert(param, value),
                None => break,
            }
            continue;
        }
        if c.is_whitespace() {
            cursor.bump();
            continue;
        }
        // anything else is malformed; include it in the literal span
        cursor.bump();
        break;
    }

    if !closed {
        emit_literal(cursor, start, out);
        return Ok(());
    }

    let tag = Tag {
        deferred,
        kind,
        name: name.to_owned(),
        params,
    };

    if tag.deferred {
        out.push_text(&tag.undeferred().to_string());
        *dirty = true;
        return Ok(());
    }

    let source = &cursor.src[start - OPEN.len()..cursor.pos];
    if dispatcher.dispatch(tag, source, out)? {
        *dirty = true;
    }
    Ok(())
}

/// Parse a parameter value after its opening backtick.
///
/// Returns `None` if the input ends before the closing backtick.
fn parse_value<D: Dispatch + ?Sized>(
    cursor: &mut Cursor<'_>,
    dispatcher: &mut D,
    dirty: &mut bool,
    nesting: usize,
) -> Result<Option<String>, RenderError> {
    let mut value = String::new();

    while !cursor.at_end() {
        if cursor.eat('`') {
            return Ok(Some(value));
        }
        if cursor.eat_str(OPEN) {
            if nesting + 1 >= MAX_NESTING {
                value.push_str(OPEN);
                continue;
            }
            let mut nested = Rendered::default();
            parse_tag(cursor, dispatcher, &mut nested, dirty, nesting + 1)?;
            value.push_str(&nested.into_string());
            continue;
        }
        if cursor.eat_str("&nbsp;") {
            value.push(' ');
            continue;
        }
        if cursor.eat_str("&amp;") {
            value.push('&');
            continue;
        }
        if let Some(c) = cursor.bump() {
            value.push(c);
        }
    }

    Ok(None)
}

fn emit_literal(cursor: &Cursor<'_>, start: usize, out: &mut Rendered) {
    out.push_text(OPEN);
    out.push_text(&cursor.src[start..cursor.pos]);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every tag and resolves it to `<kind:name>`.
    #[derive(Default)]
    struct Recorder {
        tags: Vec<Tag>,
    }

    impl Dispatch for Recorder {
        fn dispatch(
            &mut self,
            tag: Tag,
            _source: &str,
            out: &mut Rendered,
        ) -> Result<bool, RenderError> {
            out.push_text(&format!("<{}{}>", tag.kind.sigil(), tag.name));
            self.tags.push(tag);
            Ok(true)
        }
    }

    /// Declines every tag, copying the source through.
    struct Refuser;

    impl Dispatch for Refuser {
        fn dispatch(
            &mut self,
            _tag: Tag,
            source: &str,
            out: &mut Rendered,
        ) -> Result<bool, RenderError> {
            out.push_text(source);
            Ok(false)
        }
    }

    fn scan(src: &str) -> (String, bool, Vec<Tag>) {
        let mut recorder = Recorder::default();
        let mut out = Rendered::default();
        let dirty = scan_pass(src, &mut recorder, &mut out).unwrap();
        (out.into_string(), dirty, recorder.tags)
    }

    #[test]
    fn plain_text_passes_through() {
        let (out, dirty, tags) = scan("no tags [here] at all");
        assert_eq!(out, "no tags [here] at all");
        assert!(!dirty);
        assert!(tags.is_empty());
    }

    #[test]
    fn recognises_each_kind() {
        let (out, dirty, tags) = scan("[[+a]] [[*b]] [[$c]] [[d]]");
        assert_eq!(out, "<+a> <*b> <$c> <d>");
        assert!(dirty);
        let kinds: Vec<TagKind> = tags.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TagKind::Placeholder,
                TagKind::PlaceholderAlt,
                TagKind::Chunk,
                TagKind::Snippet
            ]
        );
    }

    #[test]
    fn parses_params_in_order() {
        let (_, _, tags) = scan("[[$menu &depth=`2` &class=`nav main`]]");
        let pairs: Vec<_> = tags[0].params.iter().collect();
        assert_eq!(pairs, vec![("depth", "2"), ("class", "nav main")]);
    }

    #[test]
    fn name_allows_dots_and_slashes() {
        let (_, _, tags) = scan("[[$partials/site.header]]");
        assert_eq!(tags[0].name, "partials/site.header");
    }

    #[test]
    fn unterminated_tag_is_literal() {
        let (out, dirty, tags) = scan("before [[$chunk &a=`1` after");
        assert_eq!(out, "before [[$chunk &a=`1` after");
        assert!(!dirty);
        assert!(tags.is_empty());
    }

    #[test]
    fn unterminated_value_is_literal() {
        let (out, dirty, _) = scan("x [[$chunk &a=`never closed");
        assert_eq!(out, "x [[$chunk &a=`never closed");
        assert!(!dirty);
    }

    #[test]
    fn malformed_tag_does_not_swallow_following_tags() {
        let (out, _, tags) = scan("[[$bad-name]] then [[+ok]]");
        assert_eq!(out, "[[$bad-name]] then <+ok>");
        assert_eq!(tags.len(), 1);
    }

    #[test]
    fn empty_name_is_literal() {
        let (out, _, tags) = scan("[[]] and [[ +x]]");
        assert_eq!(out, "[[]] and [[ +x]]");
        assert!(tags.is_empty());
    }

    #[test]
    fn triple_bracket_resolves_inner_tag() {
        let (out, _, _) = scan("[[[[+x]]");
        assert_eq!(out, "[[<+x>");
    }

    #[test]
    fn nested_tag_in_value_is_resolved_first() {
        let (out, _, tags) = scan("[[$greet &name=`[[+user]]!`]]");
        assert_eq!(out, "<$greet>");
        assert_eq!(tags[0].name, "user");
        assert_eq!(tags[1].params.get("name"), Some("<+user>!"));
    }

    #[test]
    fn value_decodes_entities() {
        let (_, _, tags) = scan("[[snip &text=`a&nbsp;b &amp; c`]]");
        assert_eq!(tags[0].params.get("text"), Some("a b & c"));
    }

    #[test]
    fn nbsp_and_amp_between_params() {
        let (_, _, tags) = scan("[[snip&nbsp;&amp;a=`1`&nbsp;&b=`2`]]");
        let pairs: Vec<_> = tags[0].params.iter().collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn placeholder_ignores_params_but_closes() {
        let (out, dirty, tags) = scan("[[+x &a=`1`]] tail");
        assert_eq!(out, "<+x> tail");
        assert!(dirty);
        assert!(tags[0].params.is_empty());
    }

    #[test]
    fn placeholder_with_amp_and_no_close_is_literal() {
        let (out, dirty, _) = scan("[[+x &a=`1` tail");
        assert_eq!(out, "[[+x &a=`1` tail");
        assert!(!dirty);
    }

    #[test]
    fn placeholder_alt_accepts_params() {
        let (_, _, tags) = scan("[[*x &a=`1`]]");
        assert_eq!(tags[0].kind, TagKind::PlaceholderAlt);
        assert_eq!(tags[0].params.get("a"), Some("1"));
    }

    #[test]
    fn deferred_tag_is_reemitted_without_mark() {
        let (out, dirty, tags) = scan("[[!$menu &a=`1`]]");
        assert_eq!(out, "[[$menu &a=`1`]]");
        assert!(dirty);
        assert!(tags.is_empty());
    }

    #[test]
    fn deferred_tag_keeps_resolved_nested_values() {
        let (out, _, _) = scan("[[!$menu &a=`[[+x]]`]]");
        assert_eq!(out, "[[$menu &a=`<+x>`]]");
    }

    #[test]
    fn refused_tag_is_copied_and_pass_stays_clean() {
        let mut out = Rendered::default();
        let dirty = scan_pass("a [[$loop &x=`1`]] b", &mut Refuser, &mut out).unwrap();
        assert_eq!(out.into_string(), "a [[$loop &x=`1`]] b");
        assert!(!dirty);
    }

    #[test]
    fn bad_param_name_is_literal() {
        let (out, _, tags) = scan("[[$c &=`1`]]");
        assert_eq!(out, "[[$c &=`1`]]");
        assert!(tags.is_empty());
    }

    #[test]
    fn deep_nesting_is_bounded() {
        let mut src = String::new();
        for _ in 0..(MAX_NESTING + 4) {
            src.push_str("[[$c &v=`");
        }
        src.push('x');
        for _ in 0..(MAX_NESTING + 4) {
            src.push_str("`]]");
        }
        // must not overflow the stack; exact output is unimportant
        let _ = scan(&src);
    }

    #[test]
    fn multibyte_text_survives() {
        let (out, _, _) = scan("héllo [[+wörld]] ünïcode [x]");
        assert_eq!(out, "héllo [[+wörld]] ünïcode [x]");
    }
}
