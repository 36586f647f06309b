//! Incremental extraction over a growing output buffer.
//!
//! Each step derives a [`StreamSnapshot`] for the previous and the current
//! text from scratch and reports only what the current text confirms beyond
//! the previous one. Nothing is memoized between steps, so a retried or
//! repeated step yields the same answer.

use serde_json::Value;

use crate::config::{ExtractorConfig, MultiBlockPolicy};
use crate::directive::marker::{
    locate, locate_all, scan_head_from, Head, MarkerMatch, FENCE_CLOSE, MARKER,
};
use crate::directive::normalize::normalize_entry;
use crate::directive::payload::{decode_entries, scan_array};
use crate::types::{DeltaToolCall, ExtractionResult, IncrementalUpdate, NormalizedCall};

/// Where a growing output stands with respect to its directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// No directive head has been confirmed.
    NoMarkerSeen,
    /// The directive array has opened; no element is complete yet.
    MarkerOpen,
    /// This many array elements are complete; the array is still open.
    EntryConfirmed(usize),
    /// The array and its closing fence have been consumed.
    Done,
}

/// Everything a text confirms on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSnapshot {
    pub state: StreamState,
    /// Prose that can no longer turn out to be part of a directive, trimmed.
    pub prose: String,
    /// Calls from completed array elements, in order.
    pub calls: Vec<NormalizedCall>,
}

/// How one opened directive stands in a given text.
enum Verdict {
    Open(Vec<NormalizedCall>),
    Done(Vec<NormalizedCall>),
    /// Batch extraction would never decode this directive.
    Rejected,
}

impl StreamSnapshot {
    /// Derive the snapshot for `text`.
    ///
    /// A directive that batch extraction would not decode (a malformed
    /// element, a closed array followed by ordinary text, a fence inside a
    /// string value) is released as prose, and the search moves on to the
    /// next `Action:`.
    ///
    /// ```
    /// use llm_toolcall::config::ExtractorConfig;
    /// use llm_toolcall::streaming::{StreamSnapshot, StreamState};
    ///
    /// let text = "Checking. Action: ```json [{\"tool_name\": \"a\"}, {\"tool_";
    /// let snap = StreamSnapshot::of(text, &ExtractorConfig::default());
    /// assert_eq!(snap.state, StreamState::EntryConfirmed(1));
    /// assert_eq!(snap.prose, "Checking.");
    /// assert_eq!(snap.calls[0].name, "a");
    ///
    /// let text = "Use Action: ```json [1, 2] to list things.";
    /// let snap = StreamSnapshot::of(text, &ExtractorConfig::default());
    /// assert_eq!(snap.state, StreamState::NoMarkerSeen);
    /// assert_eq!(snap.prose, text);
    /// ```
    pub fn of(text: &str, config: &ExtractorConfig) -> Self {
        let mut from = 0;
        loop {
            let (start, array_start) = match scan_head_from(text, from) {
                None => return Self::prose_only(text),
                Some(Head::Undecided { start }) => return Self::prose_only(&text[..start]),
                Some(Head::Open { start, array_start }) => (start, array_start),
            };

            let (state, calls) = match judge(text, start, array_start, config) {
                Verdict::Open(calls) if calls.is_empty() => (StreamState::MarkerOpen, calls),
                Verdict::Open(calls) => (StreamState::EntryConfirmed(calls.len()), calls),
                Verdict::Done(calls) => (StreamState::Done, calls),
                Verdict::Rejected => {
                    from = start + MARKER.len();
                    continue;
                }
            };

            return Self {
                state,
                prose: text[..start].trim().to_string(),
                calls,
            };
        }
    }

    /// The snapshot a finished output settles on: exactly the batch result.
    pub fn settled(result: &ExtractionResult) -> Self {
        Self {
            state: if result.tools_invoked {
                StreamState::Done
            } else {
                StreamState::NoMarkerSeen
            },
            prose: result.prose.clone(),
            calls: result.calls.clone(),
        }
    }

    fn prose_only(confirmed: &str) -> Self {
        Self {
            state: StreamState::NoMarkerSeen,
            prose: confirmed.trim().to_string(),
            calls: Vec::new(),
        }
    }

    /// Whether the directive array is open and more calls may follow.
    pub fn pending(&self) -> bool {
        matches!(
            self.state,
            StreamState::MarkerOpen | StreamState::EntryConfirmed(_)
        )
    }
}

/// Judge the directive whose `Action:` is at `start` and whose array opens
/// at `array_start`.
fn judge(text: &str, start: usize, array_start: usize, config: &ExtractorConfig) -> Verdict {
    // Once the batch pattern has matched, its span is final.
    match batch_match(text, start, config) {
        BatchMatch::At(found) => return decode_match(&found, config),
        BatchMatch::Elsewhere => return Verdict::Rejected,
        BatchMatch::NotYet => {}
    }

    let body = &text[array_start..];
    let scan = scan_array(body);

    let mut calls = Vec::with_capacity(scan.elements.len());
    for element in &scan.elements {
        match serde_json::from_str::<Value>(element) {
            Ok(entry) => calls.push(normalize_entry(calls.len(), &entry, config).0),
            Err(e) => {
                tracing::debug!(
                    start,
                    index = calls.len(),
                    error = %e,
                    "streamed element is not valid JSON; directive is prose"
                );
                return Verdict::Rejected;
            }
        }
    }

    match scan.closed_at {
        None => Verdict::Open(calls),
        Some(end) => {
            let after = body[end..].trim_start();
            // Only the closing fence, or the start of one, may follow.
            if after.len() < FENCE_CLOSE.len() && FENCE_CLOSE.starts_with(after) {
                Verdict::Open(calls)
            } else {
                tracing::debug!(
                    start,
                    "directive array closed without a fence; directive is prose"
                );
                Verdict::Rejected
            }
        }
    }
}

enum BatchMatch<'a> {
    /// The batch pattern matches the directive at this head.
    At(MarkerMatch<'a>),
    /// Batch extraction has already settled on a different directive.
    Elsewhere,
    NotYet,
}

fn batch_match<'a>(text: &'a str, start: usize, config: &ExtractorConfig) -> BatchMatch<'a> {
    match config.multi_block {
        MultiBlockPolicy::FirstOnly => match locate(text) {
            Some(found) if found.start == start => BatchMatch::At(found),
            Some(_) => BatchMatch::Elsewhere,
            None => BatchMatch::NotYet,
        },
        MultiBlockPolicy::Merge => locate_all(text)
            .into_iter()
            .find(|found| found.start == start)
            .map_or(BatchMatch::NotYet, BatchMatch::At),
    }
}

fn decode_match(found: &MarkerMatch<'_>, config: &ExtractorConfig) -> Verdict {
    match decode_entries(found.payload) {
        Ok(entries) => Verdict::Done(
            entries
                .iter()
                .enumerate()
                .map(|(index, entry)| normalize_entry(index, entry, config).0)
                .collect(),
        ),
        Err(e) => {
            tracing::debug!(
                start = found.start,
                error = %e,
                "directive payload does not decode; directive is prose"
            );
            Verdict::Rejected
        }
    }
}

/// What `current` confirms beyond `previous`, or `None` if nothing.
///
/// When `current` no longer holds the calls `previous` delivered, the update
/// sets `calls_withdrawn` and repeats every call `current` does hold.
pub fn diff(previous: &StreamSnapshot, current: &StreamSnapshot) -> Option<IncrementalUpdate> {
    let delta_prose = match current.prose.strip_prefix(previous.prose.as_str()) {
        Some(rest) if !rest.is_empty() => Some(rest.to_string()),
        Some(_) => None,
        None => {
            tracing::warn!(
                previous_len = previous.prose.len(),
                current_len = current.prose.len(),
                "confirmed prose diverged between steps"
            );
            None
        }
    };

    let calls_withdrawn = !current.calls.starts_with(&previous.calls);
    let already_sent = if calls_withdrawn {
        tracing::debug!(withdrawn = previous.calls.len(), "delivered calls withdrawn");
        0
    } else {
        previous.calls.len()
    };

    let delta_calls: Vec<DeltaToolCall> = current
        .calls
        .iter()
        .enumerate()
        .skip(already_sent)
        .map(|(index, call)| DeltaToolCall {
            index,
            name_delta: Some(call.name.clone()),
            arguments_delta: Some(call.arguments_json.clone()),
        })
        .collect();

    let finished = current.state == StreamState::Done && previous.state != StreamState::Done;
    let settled = previous.pending() && !current.pending();

    if delta_prose.is_none() && delta_calls.is_empty() && !calls_withdrawn && !finished && !settled
    {
        return None;
    }

    Some(IncrementalUpdate {
        delta_prose,
        delta_calls,
        pending: current.pending(),
        calls_withdrawn,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(text: &str) -> StreamSnapshot {
        StreamSnapshot::of(text, &ExtractorConfig::default())
    }

    fn step(previous: &str, current: &str) -> Option<IncrementalUpdate> {
        diff(&snap(previous), &snap(current))
    }

    // ── snapshots ──

    #[test]
    fn test_plain_prose_snapshot() {
        let s = snap("  Just chatting. ");
        assert_eq!(s.state, StreamState::NoMarkerSeen);
        assert_eq!(s.prose, "Just chatting.");
        assert!(!s.pending());
    }

    #[test]
    fn test_partial_marker_held_back() {
        assert_eq!(snap("I will check. Act").prose, "I will check.");
        assert_eq!(snap("I will check. Action: ``").prose, "I will check.");
    }

    #[test]
    fn test_rejected_marker_is_prose() {
        let s = snap("Action: none today");
        assert_eq!(s.state, StreamState::NoMarkerSeen);
        assert_eq!(s.prose, "Action: none today");
    }

    #[test]
    fn test_marker_open() {
        let s = snap("Ok. Action: ```json\n[{\"tool_name\": \"sea");
        assert_eq!(s.state, StreamState::MarkerOpen);
        assert!(s.calls.is_empty());
        assert!(s.pending());
    }

    #[test]
    fn test_closed_array_waits_for_fence() {
        let s = snap(r#"Action: ```json [{"tool_name": "a"}]"#);
        assert_eq!(s.state, StreamState::EntryConfirmed(1));
        let s = snap(r#"Action: ```json [{"tool_name": "a"}] ``"#);
        assert_eq!(s.state, StreamState::EntryConfirmed(1));
        let s = snap(r#"Action: ```json [{"tool_name": "a"}] ```"#);
        assert_eq!(s.state, StreamState::Done);
    }

    #[test]
    fn test_malformed_element_releases_directive() {
        let text = r#"Action: ```json [{"tool_name": "a"}, {broken}, {"tool_name": "c"}] ```"#;
        let s = snap(text);
        assert_eq!(s.state, StreamState::NoMarkerSeen);
        assert!(s.calls.is_empty());
        assert_eq!(s.prose, text);
    }

    #[test]
    fn test_fence_inside_string_value_is_prose() {
        let text = r#"Sure. Action: ```json [{"tool_name": "a", "parameters": {"q": "x] ```"}}] ```"#;
        let s = snap(text);
        assert_eq!(s.state, StreamState::NoMarkerSeen);
        assert!(s.calls.is_empty());
        assert_eq!(s.prose, text);
    }

    #[test]
    fn test_rejection_moves_on_to_later_text() {
        let s = snap("Use Action: ```json [1, 2] now. Act");
        assert_eq!(s.state, StreamState::NoMarkerSeen);
        assert_eq!(s.prose, "Use Action: ```json [1, 2] now.");
    }

    #[test]
    fn test_empty_array_done() {
        let s = snap("Action: ```json [] ```");
        assert_eq!(s.state, StreamState::Done);
        assert!(s.calls.is_empty());
    }

    // ── diff ──

    #[test]
    fn test_no_update_when_nothing_new() {
        assert!(step("Hello", "Hello").is_none());
        assert!(step("Hello ", "Hello  ").is_none());
        assert!(step("Hello", "Hello Act").is_none());
    }

    #[test]
    fn test_prose_delta() {
        let update = step("Hello", "Hello there").unwrap();
        assert_eq!(update.delta_prose.as_deref(), Some(" there"));
        assert!(update.delta_calls.is_empty());
        assert!(!update.pending);
    }

    #[test]
    fn test_held_back_prose_released() {
        let update = step("We Act", "We Acted fast").unwrap();
        assert_eq!(update.delta_prose.as_deref(), Some(" Acted fast"));
    }

    #[test]
    fn test_element_confirmation_emits_call() {
        let prev = r#"Action: ```json [{"tool_name": "a", "parameters": {"x": 1}}"#;
        let cur = r#"Action: ```json [{"tool_name": "a", "parameters": {"x": 1}},"#;
        assert!(step("Action: ```json [", prev).is_none());
        let update = step(prev, cur).unwrap();
        assert_eq!(
            update.delta_calls,
            vec![DeltaToolCall {
                index: 0,
                name_delta: Some("a".into()),
                arguments_delta: Some(r#"{"x": 1}"#.into()),
            }]
        );
        assert!(update.pending);
    }

    #[test]
    fn test_only_new_calls_emitted() {
        let prev = r#"Action: ```json [{"tool_name": "a"}, "#;
        let cur = r#"Action: ```json [{"tool_name": "a"}, {"tool_name": "b"}]"#;
        let update = step(prev, cur).unwrap();
        assert_eq!(update.delta_calls.len(), 1);
        assert_eq!(update.delta_calls[0].index, 1);
        assert_eq!(update.delta_calls[0].name_delta.as_deref(), Some("b"));
        assert!(update.pending);
    }

    #[test]
    fn test_closing_fence_finishes() {
        let prev = r#"Action: ```json [{"tool_name": "a"}] "#;
        let cur = r#"Action: ```json [{"tool_name": "a"}] ```"#;
        let update = step(prev, cur).unwrap();
        assert!(update.is_empty());
        assert!(!update.pending);
        assert!(step(cur, &format!("{} trailing", cur)).is_none());
    }

    #[test]
    fn test_fence_inside_string_releases_prose() {
        let prev = r#"Sure. Action: ```json [{"tool_name": "a", "parameters": {"q": "x] "#;
        let cur = r#"Sure. Action: ```json [{"tool_name": "a", "parameters": {"q": "x] ```"#;
        assert_eq!(snap(prev).state, StreamState::MarkerOpen);
        let update = step(prev, cur).unwrap();
        assert_eq!(
            update.delta_prose.as_deref(),
            Some(r#" Action: ```json [{"tool_name": "a", "parameters": {"q": "x] ```"#)
        );
        assert!(update.delta_calls.is_empty());
        assert!(!update.calls_withdrawn);
        assert!(!update.pending);
    }

    #[test]
    fn test_unfenced_array_withdraws_calls() {
        let prev = "Use Action: ```json [1, 2]";
        assert_eq!(snap(prev).state, StreamState::EntryConfirmed(2));
        let update = step(prev, "Use Action: ```json [1, 2] t").unwrap();
        assert_eq!(update.delta_prose.as_deref(), Some(" Action: ```json [1, 2] t"));
        assert!(update.calls_withdrawn);
        assert!(update.delta_calls.is_empty());
        assert!(!update.pending);
    }

    #[test]
    fn test_malformed_element_withdraws_calls() {
        let prev = r#"Sure. Action: ```json [{"tool_name": "a"}, {"tool_name": "b"} oops"#;
        let cur = format!("{}]", prev);
        assert_eq!(snap(prev).calls.len(), 1);
        let update = step(prev, &cur).unwrap();
        assert!(update.calls_withdrawn);
        assert_eq!(
            update.delta_prose.as_deref(),
            Some(r#" Action: ```json [{"tool_name": "a"}, {"tool_name": "b"} oops]"#)
        );
        assert!(!update.pending);
    }

    #[test]
    fn test_partial_fence_keeps_waiting() {
        let prev = "Action: ```json [1]";
        assert!(step(prev, "Action: ```json [1] `").is_none());
        assert!(step(prev, "Action: ```json [1]\n").is_none());
    }

    #[test]
    fn test_settled_flushes_open_directive() {
        let text = "Action: ```json [";
        let result = crate::extractor::Extractor::new().extract(text);
        let update = diff(&snap(text), &StreamSnapshot::settled(&result)).unwrap();
        assert_eq!(update.delta_prose.as_deref(), Some(text));
        assert!(!update.pending);
        assert!(!update.calls_withdrawn);
    }

    #[test]
    fn test_settled_done_adds_nothing() {
        let text = r#"Hi. Action: ```json [{"tool_name": "a"}] ```"#;
        let result = crate::extractor::Extractor::new().extract(text);
        assert_eq!(snap(text), StreamSnapshot::settled(&result));
        assert!(diff(&snap(text), &StreamSnapshot::settled(&result)).is_none());
    }

    #[test]
    fn test_merge_policy_confirms_by_block() {
        let config = ExtractorConfig::default().with_multi_block(MultiBlockPolicy::Merge);
        let s = StreamSnapshot::of(r#"Action: ```json [{"tool_name": "a"}] ```"#, &config);
        assert_eq!(s.state, StreamState::Done);
        assert_eq!(s.calls[0].name, "a");
    }

    #[test]
    fn test_step_is_repeatable() {
        let prev = "Sure. Action: ```json [";
        let cur = r#"Sure. Action: ```json [{"tool_name": "a"}]"#;
        assert_eq!(step(prev, cur), step(prev, cur));
    }
}
