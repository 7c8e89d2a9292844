//! Locating previously installed fragments inside a target file.

/// Where a fragment was found in a file's text, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// The fragment is not present.
    Absent,
    /// An exact-line fragment was found at this zero-based line index.
    Line {
        /// Index of the matching line.
        index: usize,
    },
    /// A delimited block was found spanning these byte offsets; `end` points
    /// just past the end marker.
    Block {
        /// Byte offset of the start marker.
        start: usize,
        /// Byte offset just past the end marker.
        end: usize,
    },
    /// The start marker is present but the end marker is missing. Install
    /// treats this as "not installed"; remove refuses to touch the file.
    Inconsistent,
}

/// Strategy for finding a fragment inside existing file content.
///
/// Two strategies cover every mechanism: exact-line match for single rendered
/// directives, and delimited-block match for marker-wrapped snippets. "Not
/// found" is a normal control-flow outcome, never an error by itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentMatcher {
    /// Compare each line of the file, trimmed of surrounding whitespace,
    /// against one canonical line. Only an exact textual repeat matches; a
    /// semantically equivalent fragment with, say, a different payload path
    /// is a different installation.
    Line {
        /// The canonical (trimmed) directive line.
        line: String,
    },
    /// Locate a unique start marker, then search forward for the end marker.
    Block {
        /// The start marker line.
        start: String,
        /// The end marker line.
        end: String,
    },
}

impl FragmentMatcher {
    /// Exact-line matcher over the given canonical line.
    #[must_use]
    pub fn line(line: String) -> Self {
        Self::Line { line }
    }

    /// Delimited-block matcher over the given marker pair.
    #[must_use]
    pub fn block(start: &str, end: &str) -> Self {
        Self::Block {
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    /// Find the fragment in `content`.
    #[must_use]
    pub fn locate(&self, content: &str) -> Location {
        match self {
            Self::Line { line } => content
                .lines()
                .position(|candidate| candidate.trim() == line)
                .map_or(Location::Absent, |index| Location::Line { index }),
            Self::Block { start, end } => {
                let Some(start_at) = content.find(start.as_str()) else {
                    return Location::Absent;
                };
                match content[start_at..].find(end.as_str()) {
                    Some(offset) => Location::Block {
                        start: start_at,
                        end: start_at + offset + end.len(),
                    },
                    None => Location::Inconsistent,
                }
            }
        }
    }

    /// Whether the fragment is present. An inconsistent marker pair counts as
    /// absent here; the remove path reports it as a hard error instead.
    #[must_use]
    pub fn is_present(&self, content: &str) -> bool {
        matches!(
            self.locate(content),
            Location::Line { .. } | Location::Block { .. }
        )
    }
}
