use serde::{Deserialize, Serialize};

use crate::diagnostics::ExtractionDiagnostics;

/// One recognized tool call, independent of how the model encoded it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedCall {
    /// Tool name; empty when the entry had none.
    pub name: String,
    /// Arguments as a JSON document. Only when the model sent a non-JSON
    /// string is this the raw string instead.
    pub arguments_json: String,
}

impl NormalizedCall {
    pub fn new(name: impl Into<String>, arguments_json: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments_json: arguments_json.into(),
        }
    }

    /// Wrap as an OpenAI-style tool call with a fresh `call_` id.
    pub fn to_tool_call(&self) -> ToolCall {
        ToolCall {
            id: random_call_id(),
            kind: "function".to_string(),
            function: FunctionCall {
                name: self.name.clone(),
                arguments: self.arguments_json.clone(),
            },
        }
    }
}

/// Result of a batch extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    /// A directive was recognized and its payload decoded.
    pub tools_invoked: bool,
    /// Calls in payload order.
    pub calls: Vec<NormalizedCall>,
    /// Trimmed text preceding the directive, or the whole trimmed output.
    pub prose: String,
    /// What the extractor had to recover from.
    #[serde(skip)]
    pub diagnostics: ExtractionDiagnostics,
}

impl ExtractionResult {
    /// The all-prose result: no tools, the whole trimmed text as prose.
    pub fn prose_only(text: &str) -> Self {
        Self {
            tools_invoked: false,
            calls: Vec::new(),
            prose: text.trim().to_string(),
            diagnostics: ExtractionDiagnostics::default(),
        }
    }

    /// OpenAI-style tool calls, one per normalized call.
    ///
    /// ```
    /// use llm_toolcall::Extractor;
    ///
    /// let out = Extractor::new().extract(
    ///     "Action: ```json [{\"tool_name\": \"search\", \"parameters\": {}}] ```",
    /// );
    /// let calls = out.to_tool_calls();
    /// assert_eq!(calls[0].kind, "function");
    /// assert!(calls[0].id.starts_with("call_"));
    /// ```
    pub fn to_tool_calls(&self) -> Vec<ToolCall> {
        self.calls.iter().map(NormalizedCall::to_tool_call).collect()
    }
}

/// The function half of a [`ToolCall`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// Tool call in the shape chat-completion APIs return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionCall,
}

fn random_call_id() -> String {
    let suffix: String = std::iter::repeat_with(fastrand::alphanumeric)
        .take(24)
        .collect();
    format!("call_{}", suffix)
}

/// A newly confirmed call in a streaming update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaToolCall {
    /// Position of the call in the payload array.
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_delta: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments_delta: Option<String>,
}

/// Information confirmed by the latest streaming step and not before.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementalUpdate {
    /// Newly confirmed prose.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_prose: Option<String>,
    /// Newly completed array elements.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delta_calls: Vec<DeltaToolCall>,
    /// The directive array is open and more calls may follow.
    pub pending: bool,
    /// Calls delivered by earlier updates are void: the directive they came
    /// from turned out not to be one. `delta_calls` then restarts at index 0.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub calls_withdrawn: bool,
}

impl IncrementalUpdate {
    pub fn is_empty(&self) -> bool {
        self.delta_prose.is_none() && self.delta_calls.is_empty() && !self.calls_withdrawn
    }
}

/// Arguments of one streaming extraction step.
///
/// `current_text` must equal `previous_text + delta_text`, and the token-id
/// slices must reconcile the same way.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamingInput<'a> {
    pub previous_text: &'a str,
    pub current_text: &'a str,
    pub delta_text: &'a str,
    pub previous_token_ids: &'a [u32],
    pub current_token_ids: &'a [u32],
    pub delta_token_ids: &'a [u32],
}

impl<'a> StreamingInput<'a> {
    /// Build an input from texts only, with no token bookkeeping.
    pub fn from_texts(previous_text: &'a str, current_text: &'a str, delta_text: &'a str) -> Self {
        Self {
            previous_text,
            current_text,
            delta_text,
            ..Default::default()
        }
    }

    pub fn with_token_ids(
        mut self,
        previous: &'a [u32],
        current: &'a [u32],
        delta: &'a [u32],
    ) -> Self {
        self.previous_token_ids = previous;
        self.current_token_ids = current;
        self.delta_token_ids = delta;
        self
    }
}

/// Request-side generation parameters, read-only to the extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    /// Names of the tools offered to the model.
    #[serde(default)]
    pub tools: Vec<String>,
}
