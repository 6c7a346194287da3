//! Partially rendered text.
//!
//! Placeholder values must never be re-scanned, but the fixed-point loop
//! re-scans everything else. A render therefore works on a list of segments:
//! `Text` is scanned again on the next pass, `Verbatim` is carried through
//! untouched. The segments are flattened only when a render returns to its
//! public caller.

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Text(String),
    Verbatim(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Rendered {
    segments: Vec<Segment>,
}

impl Rendered {
    pub(crate) fn from_text(text: &str) -> Self {
        let mut rendered = Self::default();
        rendered.push_text(text);
        rendered
    }

    /// Append scannable text, merging with a trailing `Text` segment so a tag
    /// assembled from adjacent pieces is still seen whole.
    pub(crate) fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.segments.last_mut() {
            Some(Segment::Text(last)) => last.push_str(text),
            _ => self.segments.push(Segment::Text(text.to_owned())),
        }
    }

    pub(crate) fn push_verbatim(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.segments.last_mut() {
            Some(Segment::Verbatim(last)) => last.push_str(text),
            _ => self.segments.push(Segment::Verbatim(text.to_owned())),
        }
    }

    pub(crate) fn append(&mut self, other: Rendered) {
        for segment in other.segments {
            match segment {
                Segment::Text(text) => self.push_text(&text),
                Segment::Verbatim(text) => self.push_verbatim(&text),
            }
        }
    }

    pub(crate) fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    pub(crate) fn into_string(self) -> String {
        let mut out = String::new();
        for segment in self.segments {
            match segment {
                Segment::Text(text) | Segment::Verbatim(text) => out.push_str(&text),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacent_text_merges() {
        let mut r = Rendered::default();
        r.push_text("[[");
        r.push_text("+x]]");
        assert_eq!(r.into_segments(), vec![Segment::Text("[[+x]]".into())]);
    }

    #[test]
    fn verbatim_separates_text() {
        let mut r = Rendered::from_text("a");
        r.push_verbatim("[[b]]");
        r.push_text("c");
        assert_eq!(r.clone().into_segments().len(), 3);
        assert_eq!(r.into_string(), "a[[b]]c");
    }

    #[test]
    fn empty_pushes_are_dropped() {
        let mut r = Rendered::default();
        r.push_text("");
        r.push_verbatim("");
        assert!(r.into_segments().is_empty());
    }
}
