//! Rendered configuration fragments.

use super::matcher::FragmentMatcher;

/// A fully rendered block of configuration text representing one installed
/// persistence technique.
///
/// A fragment is always reproducible deterministically from the same
/// parameters; the duplicate check depends on byte-identical re-renders. Each
/// fragment carries the [`FragmentMatcher`] that identifies it inside a target
/// file: a canonical line for single-directive fragments, a start/end marker
/// pair for delimited blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    text: String,
    matcher: FragmentMatcher,
}

impl Fragment {
    /// A single-line directive fragment, identified by exact (trimmed) line
    /// match.
    #[must_use]
    pub fn line(directive: &str) -> Self {
        let canonical = directive.trim().to_string();
        let mut text = canonical.clone();
        text.push('\n');
        Self {
            text,
            matcher: FragmentMatcher::line(canonical),
        }
    }

    /// A marker-delimited block fragment.
    ///
    /// `text` is the fully rendered block including both markers; `start` and
    /// `end` are the marker lines used to find it again.
    #[must_use]
    pub fn block(text: String, start: &str, end: &str) -> Self {
        Self {
            text,
            matcher: FragmentMatcher::block(start, end),
        }
    }

    /// A whole-document fragment (the file is generated in full), identified
    /// by one canonical line it always contains.
    #[must_use]
    pub fn document(text: String, identity_line: &str) -> Self {
        Self {
            text,
            matcher: FragmentMatcher::line(identity_line.trim().to_string()),
        }
    }

    /// The rendered text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The matcher identifying this fragment inside a file.
    #[must_use]
    pub const fn matcher(&self) -> &FragmentMatcher {
        &self.matcher
    }

    /// Whether this fragment is a delimited block (blocks get a blank
    /// separating line when appended to a non-empty file).
    #[must_use]
    pub const fn is_block(&self) -> bool {
        matches!(self.matcher, FragmentMatcher::Block { .. })
    }
}
