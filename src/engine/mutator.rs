//! Pure text edits: appending a fragment to file content and cutting it back
//! out.
//!
//! The functions here never touch the filesystem; the installer feeds them
//! file content and writes the result back atomically.

use super::fragment::Fragment;
use super::matcher::{FragmentMatcher, Location};

/// Outcome of a removal edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    /// The fragment is not present; the content was not modified.
    NotFound,
    /// A start marker was found without its end marker; nothing was modified.
    Inconsistent,
    /// The fragment was cut out; this is the new content.
    Updated(String),
}

/// Append `fragment` to `content`.
///
/// A newline is appended to the existing content first if it is missing, block
/// fragments get one blank separating line when the file already has content,
/// and the result always ends in exactly one trailing newline.
#[must_use]
pub fn insert(content: &str, fragment: &Fragment) -> String {
    let mut out = String::with_capacity(content.len() + fragment.text().len() + 2);
    out.push_str(content);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    if fragment.is_block() && !out.is_empty() {
        out.push('\n');
    }
    out.push_str(fragment.text());
    while out.ends_with("\n\n") {
        out.pop();
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Cut the fragment identified by `matcher` out of `content`.
///
/// Line fragments take one immediately-following blank line with them and
/// trailing blank lines are trimmed. Block fragments leave a single separating
/// newline where the block used to be. Removing the only content yields an
/// empty string; otherwise the result ends in exactly one trailing newline.
///
/// Together with [`insert`] this gives `remove(insert(c)) == c` for any `c`
/// not already containing the fragment, up to the trailing-newline
/// normalisation above. Irregular blank-line formatting at the insertion
/// point is not restored byte-for-byte; that is an accepted lossy edge.
#[must_use]
pub fn remove(content: &str, matcher: &FragmentMatcher) -> Removal {
    match matcher.locate(content) {
        Location::Absent => Removal::NotFound,
        Location::Inconsistent => Removal::Inconsistent,
        Location::Line { index } => Removal::Updated(remove_line(content, index)),
        Location::Block { start, end } => Removal::Updated(remove_block(content, start, end)),
    }
}

fn remove_line(content: &str, index: usize) -> String {
    let mut lines: Vec<&str> = content.lines().collect();
    if index < lines.len() {
        lines.remove(index);
    }
    // Tidy removal: the blank line that followed the directive goes with it.
    if index < lines.len() && lines[index].trim().is_empty() {
        lines.remove(index);
    }
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    if lines.is_empty() {
        String::new()
    } else {
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

fn remove_block(content: &str, start: usize, end: usize) -> String {
    let bytes = content.as_bytes();

    // Swallow the newlines that trailed the end marker.
    let mut cut_end = end;
    while cut_end < bytes.len() && (bytes[cut_end] == b'\n' || bytes[cut_end] == b'\r') {
        cut_end += 1;
    }

    // Walk back over indentation, then the newline that preceded the start
    // marker, then the blank separator line if there was one.
    let mut cut_start = start;
    let mut i = cut_start;
    while i > 0 && (bytes[i - 1] == b' ' || bytes[i - 1] == b'\t') {
        i -= 1;
    }
    if i > 0 && bytes[i - 1] == b'\n' {
        cut_start = i - 1;
        if i > 1 && bytes[i - 2] == b'\n' {
            cut_start = i - 2;
        }
    }

    let mut out = String::with_capacity(content.len());
    out.push_str(&content[..cut_start]);
    if cut_end < content.len() {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&content[cut_end..]);
    }
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
