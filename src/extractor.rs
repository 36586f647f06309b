//! The extractor: batch and incremental recognition of tool directives.
//!
//! [`Extractor`] is a plain value holding its [`ExtractorConfig`] and an
//! optional event handler. Both modes are pure functions of their inputs,
//! so one extractor can be shared freely across threads and turns.

use std::sync::Arc;

use crate::config::{ExtractorConfig, MultiBlockPolicy};
use crate::diagnostics::{ExtractionDiagnostics, Recovery};
use crate::directive::marker::{locate, locate_all};
use crate::directive::normalize::normalize_entry;
use crate::directive::payload::decode_entries;
use crate::error::{ExtractError, Result};
use crate::events::{emit, Event, EventHandler};
use crate::streaming::{diff, StreamSnapshot};
use crate::types::{ExtractionResult, IncrementalUpdate, StreamingInput};

/// Recognizes `Action: ```json [...] ``` ` directives in model output.
///
/// # Example
///
/// ```
/// use llm_toolcall::Extractor;
///
/// let out = Extractor::new().extract(
///     r#"I will check. Action: ```json [{"tool_name": "search", "parameters": {"q": "cats"}}] ```"#,
/// );
/// assert!(out.tools_invoked);
/// assert_eq!(out.prose, "I will check.");
/// assert_eq!(out.calls[0].name, "search");
/// assert_eq!(out.calls[0].arguments_json, r#"{"q": "cats"}"#);
/// ```
#[derive(Clone, Default)]
pub struct Extractor {
    config: ExtractorConfig,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl Extractor {
    /// Create an extractor with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ExtractorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract tool calls from a complete model output.
    ///
    /// Never fails: malformed directives degrade to an all-prose result,
    /// and what was recovered is listed in the result's diagnostics.
    pub fn extract(&self, model_output: &str) -> ExtractionResult {
        let markers = match self.config.multi_block {
            MultiBlockPolicy::FirstOnly => locate(model_output).into_iter().collect(),
            MultiBlockPolicy::Merge => locate_all(model_output),
        };

        let mut diagnostics = ExtractionDiagnostics {
            markers_seen: markers.len(),
            ..Default::default()
        };

        if markers.is_empty() {
            tracing::trace!(len = model_output.len(), "no tool directive in output");
            self.recover(&mut diagnostics, Recovery::NoMarkerFound);
            return self.finish(ExtractionResult {
                diagnostics,
                ..ExtractionResult::prose_only(model_output)
            });
        }

        let mut prose_end = None;
        let mut calls = Vec::new();

        for marker in &markers {
            emit(
                &self.event_handler,
                Event::MarkerLocated {
                    start: marker.start,
                    end: marker.end,
                },
            );

            let entries = match decode_entries(marker.payload) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(
                        offset = marker.start,
                        error = %e,
                        "tool directive payload is not valid JSON; treating as prose"
                    );
                    self.recover(
                        &mut diagnostics,
                        Recovery::PayloadDecodeFailure {
                            offset: marker.start,
                            reason: e.to_string(),
                        },
                    );
                    continue;
                }
            };

            diagnostics.blocks_decoded += 1;
            prose_end.get_or_insert(marker.start);

            for entry in &entries {
                let (call, recoveries) = normalize_entry(calls.len(), entry, &self.config);
                for recovery in recoveries {
                    tracing::debug!(recovery = ?recovery, tool = %call.name, "normalized entry with defaults");
                    self.recover(&mut diagnostics, recovery);
                }
                calls.push(call);
            }
        }

        let Some(prose_end) = prose_end else {
            return self.finish(ExtractionResult {
                diagnostics,
                ..ExtractionResult::prose_only(model_output)
            });
        };

        let tools_invoked = !calls.is_empty() || self.config.empty_payload_invokes;
        tracing::debug!(calls = calls.len(), tools_invoked, "extracted tool directive");

        self.finish(ExtractionResult {
            tools_invoked,
            calls,
            prose: model_output[..prose_end].trim().to_string(),
            diagnostics,
        })
    }

    /// Extract what one streaming step newly confirms.
    ///
    /// Returns `Ok(None)` when the step confirms nothing new. Fails only
    /// when the inputs do not describe a growing buffer.
    ///
    /// ```
    /// use llm_toolcall::{Extractor, StreamingInput};
    ///
    /// let extractor = Extractor::new();
    /// let prev = "Looking. Action: ```json [";
    /// let delta = r#"{"tool_name": "search"},"#;
    /// let cur = format!("{prev}{delta}");
    ///
    /// let update = extractor
    ///     .extract_streaming(&StreamingInput::from_texts(prev, &cur, delta))
    ///     .unwrap()
    ///     .unwrap();
    /// assert_eq!(update.delta_calls[0].name_delta.as_deref(), Some("search"));
    /// assert!(update.pending);
    /// ```
    pub fn extract_streaming(&self, input: &StreamingInput<'_>) -> Result<Option<IncrementalUpdate>> {
        check_reconciles(input)?;

        let previous = StreamSnapshot::of(input.previous_text, &self.config);
        let current = StreamSnapshot::of(input.current_text, &self.config);
        let update = diff(&previous, &current);

        if let Some(ref update) = update {
            tracing::trace!(
                state = ?current.state,
                calls = update.delta_calls.len(),
                "streaming step confirmed new content"
            );
            self.announce(update);
        }

        Ok(update)
    }

    /// Settle a stream whose output has ended.
    ///
    /// Steps only release what no later text could change, so a stream that
    /// stops mid-directive, or right after a partial `Act`, still holds text
    /// back. This returns what the final text adds on top of the streamed
    /// updates; afterwards their combined prose and calls equal
    /// [`extract`](Self::extract) on the same text, and `pending` is false.
    ///
    /// ```
    /// use llm_toolcall::{Extractor, StreamingInput};
    ///
    /// let extractor = Extractor::new();
    /// let text = "Let me see. Action: ```json [";
    /// let step = extractor
    ///     .extract_streaming(&StreamingInput::from_texts("", text, text))
    ///     .unwrap()
    ///     .unwrap();
    /// assert_eq!(step.delta_prose.as_deref(), Some("Let me see."));
    ///
    /// let last = extractor.finish_streaming(text).unwrap();
    /// assert_eq!(last.delta_prose.as_deref(), Some(" Action: ```json ["));
    /// assert!(!last.pending);
    /// ```
    pub fn finish_streaming(&self, final_text: &str) -> Option<IncrementalUpdate> {
        let streamed = StreamSnapshot::of(final_text, &self.config);
        let settled = StreamSnapshot::settled(&self.extract(final_text));
        let update = diff(&streamed, &settled);
        if let Some(ref update) = update {
            tracing::debug!(
                withdrawn = update.calls_withdrawn,
                calls = update.delta_calls.len(),
                "stream settled on the batch result"
            );
            self.announce(update);
        }
        update
    }

    fn announce(&self, update: &IncrementalUpdate) {
        emit(
            &self.event_handler,
            Event::StreamUpdate {
                prose: update.delta_prose.is_some(),
                calls: update.delta_calls.len(),
                pending: update.pending,
                withdrawn: update.calls_withdrawn,
            },
        );
    }

    fn recover(&self, diagnostics: &mut ExtractionDiagnostics, recovery: Recovery) {
        emit(&self.event_handler, Event::Recovered(recovery.clone()));
        diagnostics.record(recovery);
    }

    fn finish(&self, result: ExtractionResult) -> ExtractionResult {
        emit(
            &self.event_handler,
            Event::CallsExtracted {
                count: result.calls.len(),
                tools_invoked: result.tools_invoked,
            },
        );
        result
    }
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("config", &self.config)
            .field("has_event_handler", &self.event_handler.is_some())
            .finish()
    }
}

/// Reject streaming inputs that do not describe `previous + delta == current`.
fn check_reconciles(input: &StreamingInput<'_>) -> Result<()> {
    if !input.current_text.starts_with(input.previous_text) {
        return Err(ExtractError::NonMonotonicText {
            previous_len: input.previous_text.len(),
            current_len: input.current_text.len(),
        });
    }
    if input.previous_text.len() + input.delta_text.len() != input.current_text.len()
        || !input.current_text.ends_with(input.delta_text)
    {
        return Err(ExtractError::DeltaMismatch {
            previous_len: input.previous_text.len(),
            delta_len: input.delta_text.len(),
            current_len: input.current_text.len(),
        });
    }

    let tracked = !(input.previous_token_ids.is_empty()
        && input.current_token_ids.is_empty()
        && input.delta_token_ids.is_empty());
    if tracked
        && input.previous_token_ids.len() + input.delta_token_ids.len()
            != input.current_token_ids.len()
    {
        return Err(ExtractError::TokenMismatch {
            previous: input.previous_token_ids.len(),
            delta: input.delta_token_ids.len(),
            current: input.current_token_ids.len(),
        });
    }
    Ok(())
}
