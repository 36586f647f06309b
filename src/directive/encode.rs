//! Canonical JSON encoding for normalized arguments.

use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::Value;

use crate::config::JsonStyle;

/// Writes `", "` between items and `": "` between keys and values.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Encode `value` in the given style. Object keys keep their source order.
///
/// # Examples
///
/// ```
/// use llm_toolcall::config::JsonStyle;
/// use llm_toolcall::directive::encode::encode_json;
/// use serde_json::json;
///
/// let v = json!({"q": "cats", "n": [1, 2]});
/// assert_eq!(encode_json(&v, JsonStyle::Spaced), r#"{"q": "cats", "n": [1, 2]}"#);
/// assert_eq!(encode_json(&v, JsonStyle::Compact), r#"{"q":"cats","n":[1,2]}"#);
/// ```
pub fn encode_json(value: &Value, style: JsonStyle) -> String {
    match style {
        JsonStyle::Compact => value.to_string(),
        JsonStyle::Spaced => {
            let mut buf = Vec::with_capacity(128);
            let mut ser = Serializer::with_formatter(&mut buf, SpacedFormatter);
            if value.serialize(&mut ser).is_err() {
                return value.to_string();
            }
            String::from_utf8(buf).unwrap_or_else(|_| value.to_string())
        }
    }
}
