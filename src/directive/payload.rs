//! Decoding the directive payload.
//!
//! [`decode_entries`] turns a complete payload into raw entries.
//! [`scan_array`] walks a payload that may still be growing and reports
//! which top-level elements are already terminated.

use serde_json::Value;

/// Decode a payload into its raw call entries.
///
/// A bare object (or any other non-array value) is treated as a
/// one-element array, since models sometimes drop the brackets.
///
/// # Examples
///
/// ```
/// use llm_toolcall::directive::payload::decode_entries;
///
/// assert_eq!(decode_entries(r#"[{"a": 1}, {"b": 2}]"#).unwrap().len(), 2);
/// assert_eq!(decode_entries(r#"{"a": 1}"#).unwrap().len(), 1);
/// assert!(decode_entries("[{broken").is_err());
/// ```
pub fn decode_entries(payload: &str) -> Result<Vec<Value>, serde_json::Error> {
    match serde_json::from_str::<Value>(payload)? {
        Value::Array(entries) => Ok(entries),
        other => Ok(vec![other]),
    }
}

/// Top-level structure of a payload array seen so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ArrayScan<'a> {
    /// Elements whose terminating `,` or `]` has been seen, trimmed.
    pub elements: Vec<&'a str>,
    /// Byte offset (into the scanned text) just past the closing `]`.
    pub closed_at: Option<usize>,
}

/// Scan `text`, which must start with `[`, for terminated elements.
///
/// Nesting and string literals are tracked so commas and brackets inside
/// them do not split elements. Scanning stops at the closing `]`.
pub(crate) fn scan_array(text: &str) -> ArrayScan<'_> {
    let mut scan = ArrayScan {
        elements: Vec::new(),
        closed_at: None,
    };
    if !text.starts_with('[') {
        return scan;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;
    let mut element_start = 1;

    for (i, ch) in text.char_indices().skip(1) {
        if escape_next {
            escape_next = false;
            continue;
        }
        if in_string {
            match ch {
                '\\' => escape_next = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ']' if depth > 0 => depth -= 1,
            ',' | ']' if depth == 0 => {
                let element = text[element_start..i].trim();
                if !element.is_empty() {
                    scan.elements.push(element);
                }
                element_start = i + 1;
                if ch == ']' {
                    scan.closed_at = Some(i + 1);
                    break;
                }
            }
            _ => {}
        }
    }

    scan
}
