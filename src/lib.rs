//! # LLM Tool Calls
//!
//! Defensive extraction of tool directives from generated text.
//!
//! Models that call tools by writing
//!
//! ````text
//! I will check.
//! Action: ```json
//! [{"tool_name": "search", "parameters": {"q": "cats"}}]
//! ```
//! ````
//!
//! need their output split into the prose meant for the user and the calls
//! meant for an execution layer. This crate does that split, for complete
//! outputs and for outputs that are still being generated, without ever
//! failing on malformed text: a directive that does not parse simply stays
//! prose.
//!
//! ## Core Concepts
//!
//! - **[`Extractor`]** — the batch ([`Extractor::extract`]) and streaming
//!   ([`Extractor::extract_streaming`], [`Extractor::finish_streaming`])
//!   entry points.
//! - **[`ExtractionResult`]** — prose plus [`NormalizedCall`]s, whose
//!   `arguments_json` is normalized whatever shape the model used.
//! - **[`IncrementalUpdate`]** — what one streaming step newly confirms.
//! - **[`ToolParser`]** / **[`ParserRegistry`]** — the by-name surface a
//!   serving layer selects parsers through.
//! - **[`ExtractorConfig`]** — field aliases, repeated-block policy,
//!   empty-payload policy, argument encoding.
//!
//! ## Quick Start
//!
//! ```
//! use llm_toolcall::Extractor;
//!
//! let out = Extractor::new().extract(
//!     r#"I will check. Action: ```json [{"tool_name": "search", "parameters": {"q": "cats"}}] ```"#,
//! );
//! assert!(out.tools_invoked);
//! assert_eq!(out.prose, "I will check.");
//! assert_eq!(out.calls[0].name, "search");
//! assert_eq!(out.calls[0].arguments_json, r#"{"q": "cats"}"#);
//!
//! let chat = Extractor::new().extract("Just chatting, no tools needed.");
//! assert!(!chat.tools_invoked);
//! assert_eq!(chat.prose, "Just chatting, no tools needed.");
//! ```
//!
//! ## Streaming
//!
//! ```
//! use llm_toolcall::{Extractor, StreamingInput};
//!
//! let extractor = Extractor::new();
//! let previous = "Sure. Action: ```json [{\"tool_name\": \"a\"}";
//! let current = "Sure. Action: ```json [{\"tool_name\": \"a\"}, {";
//! let input = StreamingInput::from_texts(previous, current, ", {");
//!
//! let update = extractor.extract_streaming(&input).unwrap().unwrap();
//! assert_eq!(update.delta_calls[0].name_delta.as_deref(), Some("a"));
//! assert!(update.pending);
//! ```

pub mod config;
pub mod delta_stream;
pub mod diagnostics;
pub mod directive;
pub mod error;
pub mod events;
pub mod extractor;
pub mod parser;
pub mod registry;
pub mod streaming;
pub mod types;

pub use config::{ExtractorConfig, JsonStyle, MultiBlockPolicy};
pub use delta_stream::stream_updates;
pub use diagnostics::{ExtractionDiagnostics, Recovery};
pub use error::{ExtractError, Result};
pub use extractor::Extractor;
pub use parser::{CommandRToolParser, NullTokenizer, Tokenizer, ToolParser};
pub use registry::ParserRegistry;
pub use streaming::{StreamSnapshot, StreamState};
pub use types::{
    DeltaToolCall, ExtractionResult, FunctionCall, IncrementalUpdate, NormalizedCall,
    RequestContext, StreamingInput, ToolCall,
};
