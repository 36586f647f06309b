//! Host-facing tool parser surface.
//!
//! A serving layer selects a [`ToolParser`] by name (see
//! [`ParserRegistry`](crate::registry::ParserRegistry)) and drives it with
//! complete outputs or streaming steps. [`CommandRToolParser`] is the
//! parser for `Action: ```json [...] ``` ` directives.

use std::sync::Arc;

use crate::error::Result;
use crate::extractor::Extractor;
use crate::types::{ExtractionResult, IncrementalUpdate, RequestContext, StreamingInput};

/// Token-level capability handed to parsers at construction.
///
/// Only streaming extraction touches it, for token bookkeeping.
pub trait Tokenizer: Send + Sync {
    /// Decode token ids back to text, if the ids are known.
    fn decode(&self, ids: &[u32]) -> Option<String>;
}

/// A tokenizer that knows no tokens. For hosts that track text only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTokenizer;

impl Tokenizer for NullTokenizer {
    fn decode(&self, _ids: &[u32]) -> Option<String> {
        None
    }
}

/// Object-safe trait for tool-call parsers.
///
/// The trait is object-safe so parsers can be stored as
/// `Box<dyn ToolParser>` and selected at runtime.
pub trait ToolParser: Send + Sync {
    /// Stable name the parser is registered under.
    fn name(&self) -> &'static str;

    /// Adjust a request before generation. Identity unless overridden.
    fn adjust_request(&self, request: RequestContext) -> RequestContext {
        request
    }

    /// Extract tool calls from a complete model output.
    fn extract_tool_calls(&self, model_output: &str, request: &RequestContext) -> ExtractionResult;

    /// Extract what one streaming step newly confirms.
    fn extract_tool_calls_streaming(
        &self,
        input: &StreamingInput<'_>,
        request: &RequestContext,
    ) -> Result<Option<IncrementalUpdate>>;

    /// Settle a finished stream so the updates sum to the batch result.
    fn finish_tool_calls_streaming(
        &self,
        final_text: &str,
        request: &RequestContext,
    ) -> Option<IncrementalUpdate>;
}

/// Parser for `Action: ```json [...] ``` ` tool directives.
///
/// # Example
///
/// ```
/// use llm_toolcall::parser::{CommandRToolParser, NullTokenizer, ToolParser};
/// use llm_toolcall::RequestContext;
/// use std::sync::Arc;
///
/// let parser = CommandRToolParser::new(Arc::new(NullTokenizer));
/// let out = parser.extract_tool_calls(
///     r#"Action: ```json [{"tool_name": "ping", "parameters": {}}] ```"#,
///     &RequestContext::default(),
/// );
/// assert_eq!(out.calls[0].name, "ping");
/// ```
pub struct CommandRToolParser {
    tokenizer: Arc<dyn Tokenizer>,
    extractor: Extractor,
}

impl CommandRToolParser {
    pub const NAME: &'static str = "commandr";

    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self {
            tokenizer,
            extractor: Extractor::new(),
        }
    }

    /// Use a custom extractor (config, event handler).
    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }
}

impl std::fmt::Debug for CommandRToolParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRToolParser")
            .field("extractor", &self.extractor)
            .finish_non_exhaustive()
    }
}

impl ToolParser for CommandRToolParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn extract_tool_calls(&self, model_output: &str, request: &RequestContext) -> ExtractionResult {
        tracing::trace!(parser = Self::NAME, model = ?request.model, "batch tool extraction");
        self.extractor.extract(model_output)
    }

    fn extract_tool_calls_streaming(
        &self,
        input: &StreamingInput<'_>,
        request: &RequestContext,
    ) -> Result<Option<IncrementalUpdate>> {
        if !input.delta_token_ids.is_empty() {
            if let Some(decoded) = self.tokenizer.decode(input.delta_token_ids) {
                if decoded != input.delta_text {
                    tracing::debug!(
                        parser = Self::NAME,
                        model = ?request.model,
                        tokens = input.delta_token_ids.len(),
                        "delta tokens decode differently from delta text"
                    );
                }
            }
        }
        self.extractor.extract_streaming(input)
    }

    fn finish_tool_calls_streaming(
        &self,
        final_text: &str,
        _request: &RequestContext,
    ) -> Option<IncrementalUpdate> {
        self.extractor.finish_streaming(final_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapTokenizer(HashMap<u32, &'static str>);

    impl Tokenizer for MapTokenizer {
        fn decode(&self, ids: &[u32]) -> Option<String> {
            ids.iter().map(|id| self.0.get(id).copied()).collect()
        }
    }

    fn parser() -> CommandRToolParser {
        CommandRToolParser::new(Arc::new(NullTokenizer))
    }

    #[test]
    fn test_name() {
        assert_eq!(parser().name(), "commandr");
    }

    #[test]
    fn test_adjust_request_is_identity() {
        let request = RequestContext {
            model: Some("command-r".into()),
            temperature: Some(0.3),
            max_tokens: Some(512),
            tools: vec!["search".into()],
        };
        assert_eq!(parser().adjust_request(request.clone()), request);
    }

    #[test]
    fn test_batch_delegates_to_extractor() {
        let out = parser().extract_tool_calls(
            r#"Looking. Action: ```json [{"tool_name": "search", "parameters": {"q": "cats"}}] ```"#,
            &RequestContext::default(),
        );
        assert!(out.tools_invoked);
        assert_eq!(out.prose, "Looking.");
        assert_eq!(out.calls[0].arguments_json, r#"{"q": "cats"}"#);
    }

    #[test]
    fn test_streaming_with_token_ids() {
        let tokenizer = MapTokenizer(HashMap::from([(1, "Hi"), (2, " there")]));
        let parser = CommandRToolParser::new(Arc::new(tokenizer));
        let input = StreamingInput::from_texts("Hi", "Hi there", " there")
            .with_token_ids(&[1], &[1, 2], &[2]);
        let update = parser
            .extract_tool_calls_streaming(&input, &RequestContext::default())
            .unwrap()
            .unwrap();
        assert_eq!(update.delta_prose.as_deref(), Some(" there"));
    }

    #[test]
    fn test_streaming_contract_violation_surfaces() {
        let input = StreamingInput::from_texts("Hi", "Ho", "o");
        assert!(parser()
            .extract_tool_calls_streaming(&input, &RequestContext::default())
            .is_err());
    }

    #[test]
    fn test_finish_releases_held_back_text() {
        let update = parser()
            .finish_tool_calls_streaming("Hello Act", &RequestContext::default())
            .unwrap();
        assert_eq!(update.delta_prose.as_deref(), Some(" Act"));
        assert!(!update.pending);
    }

    #[test]
    fn test_boxed_parser() {
        let boxed: Box<dyn ToolParser> = Box::new(parser());
        let out = boxed.extract_tool_calls("no tools", &RequestContext::default());
        assert!(!out.tools_invoked);
    }
}
