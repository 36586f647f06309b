//! Extractor configuration.
//!
//! [`ExtractorConfig`] holds the policy knobs of the extractor: which entry
//! fields carry the tool name and its parameters, what to do with repeated
//! `Action:` blocks, whether an empty payload counts as a tool invocation,
//! and how normalized arguments are encoded.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How to treat more than one `Action:` block in a single output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiBlockPolicy {
    /// Honor only the first matching block; later blocks are ignored.
    #[default]
    FirstOnly,
    /// Collect calls from every block whose payload decodes, in order.
    Merge,
}

/// Encoding style for normalized `arguments_json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonStyle {
    /// `{"a": 1, "b": [1, 2]}` (the separators model servers emit).
    ///
    /// Non-ASCII characters are written as raw UTF-8, not `\uXXXX` escapes.
    /// The JSON value is the same either way.
    #[default]
    Spaced,
    /// `{"a":1,"b":[1,2]}`
    Compact,
}

/// Configuration for [`Extractor`](crate::extractor::Extractor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Entry fields that may carry the tool name. First present wins.
    pub name_keys: Vec<String>,

    /// Entry fields that may carry the tool parameters. First present wins.
    pub parameters_keys: Vec<String>,

    /// Repeated `Action:` block handling.
    pub multi_block: MultiBlockPolicy,

    /// Whether a payload that decodes to an empty array still reports
    /// `tools_invoked = true`.
    pub empty_payload_invokes: bool,

    /// Encoding of normalized arguments.
    pub json_style: JsonStyle,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            name_keys: vec!["tool_name".to_string(), "name".to_string()],
            parameters_keys: vec!["parameters".to_string(), "arguments".to_string()],
            multi_block: MultiBlockPolicy::FirstOnly,
            empty_payload_invokes: true,
            json_style: JsonStyle::Spaced,
        }
    }
}

impl ExtractorConfig {
    /// Load a config from JSON. Missing fields take their defaults.
    ///
    /// ```
    /// use llm_toolcall::config::{ExtractorConfig, MultiBlockPolicy};
    ///
    /// let config = ExtractorConfig::from_json(r#"{"multi_block": "merge"}"#).unwrap();
    /// assert_eq!(config.multi_block, MultiBlockPolicy::Merge);
    /// assert_eq!(config.name_keys, vec!["tool_name", "name"]);
    /// ```
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn with_name_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.name_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_parameters_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_multi_block(mut self, policy: MultiBlockPolicy) -> Self {
        self.multi_block = policy;
        self
    }

    pub fn with_empty_payload_invokes(mut self, enabled: bool) -> Self {
        self.empty_payload_invokes = enabled;
        self
    }

    pub fn with_json_style(mut self, style: JsonStyle) -> Self {
        self.json_style = style;
        self
    }
}
