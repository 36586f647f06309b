//! Locating `Action: ```json [...] ``` ` directives in model output.
//!
//! Batch extraction uses [`locate`] / [`locate_all`], which only report
//! complete directives. Streaming extraction uses [`scan_head`], which also
//! recognizes a directive that has opened but not finished yet.

use std::sync::LazyLock;

use regex::Regex;

/// Literal that introduces a directive.
pub const MARKER: &str = "Action:";

const FENCE_OPEN: &str = "```json";
pub(crate) const FENCE_CLOSE: &str = "```";

// Minimal bracketed span that is followed by the closing fence.
static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Action:\s*```json\s*(\[.*?\])\s*```").expect("directive pattern compiles")
});

/// A complete directive located in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerMatch<'a> {
    /// Byte offset of `Action:`.
    pub start: usize,
    /// Byte offset just past the closing fence.
    pub end: usize,
    /// The bracketed array text, without fences.
    pub payload: &'a str,
}

/// Find the first complete directive in `text`.
///
/// # Examples
///
/// ```
/// use llm_toolcall::directive::marker::locate;
///
/// let text = "Let me look.\nAction: ```json\n[{\"tool_name\": \"search\"}]\n```";
/// let m = locate(text).unwrap();
/// assert_eq!(&text[..m.start], "Let me look.\n");
/// assert_eq!(m.payload, "[{\"tool_name\": \"search\"}]");
/// ```
pub fn locate(text: &str) -> Option<MarkerMatch<'_>> {
    DIRECTIVE.captures(text).and_then(|caps| to_match(&caps))
}

/// Find every non-overlapping complete directive in `text`, in order.
pub fn locate_all(text: &str) -> Vec<MarkerMatch<'_>> {
    DIRECTIVE
        .captures_iter(text)
        .filter_map(|caps| to_match(&caps))
        .collect()
}

fn to_match<'a>(caps: &regex::Captures<'a>) -> Option<MarkerMatch<'a>> {
    let whole = caps.get(0)?;
    let payload = caps.get(1)?;
    Some(MarkerMatch {
        start: whole.start(),
        end: whole.end(),
        payload: payload.as_str(),
    })
}

/// How far a (possibly still growing) directive head has been seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Head {
    /// `Action:`, the opening fence and `[` are all present.
    Open {
        /// Byte offset of `Action:`.
        start: usize,
        /// Byte offset of the `[` that opens the payload array.
        array_start: usize,
    },
    /// The text ends in something that may still become a directive head.
    Undecided {
        /// Byte offset where the candidate head begins.
        start: usize,
    },
}

enum HeadProbe {
    Open(usize),
    Undecided,
    Rejected,
}

/// Find the first directive head in `text`, complete or still undecided.
///
/// Returns `None` when no part of `text` can start a directive.
pub(crate) fn scan_head(text: &str) -> Option<Head> {
    scan_head_from(text, 0)
}

/// [`scan_head`] restricted to heads starting at or after byte `from`.
pub(crate) fn scan_head_from(text: &str, mut from: usize) -> Option<Head> {
    while let Some(offset) = text[from..].find(MARKER) {
        let start = from + offset;
        match probe_head(text, start + MARKER.len()) {
            HeadProbe::Open(array_start) => return Some(Head::Open { start, array_start }),
            HeadProbe::Undecided => return Some(Head::Undecided { start }),
            HeadProbe::Rejected => from = start + MARKER.len(),
        }
    }

    // A trailing fragment like "Act" may still grow into the marker.
    (1..MARKER.len())
        .rev()
        .find(|&k| text.len() >= from + k && text.ends_with(&MARKER[..k]))
        .map(|k| Head::Undecided {
            start: text.len() - k,
        })
}

/// Check what follows `Action:` (starting at byte `after`).
fn probe_head(text: &str, after: usize) -> HeadProbe {
    let rest = text[after..].trim_start();
    if rest.is_empty() {
        return HeadProbe::Undecided;
    }
    if rest.len() < FENCE_OPEN.len() {
        return if FENCE_OPEN.starts_with(rest) {
            HeadProbe::Undecided
        } else {
            HeadProbe::Rejected
        };
    }
    let Some(after_fence) = rest.strip_prefix(FENCE_OPEN) else {
        return HeadProbe::Rejected;
    };
    let body = after_fence.trim_start();
    if body.is_empty() {
        HeadProbe::Undecided
    } else if body.starts_with('[') {
        HeadProbe::Open(text.len() - body.len())
    } else {
        HeadProbe::Rejected
    }
}
