//! Extraction diagnostics.
//!
//! [`ExtractionDiagnostics`] records what happened during one extraction:
//! how many markers were seen, and every local recovery the extractor made
//! instead of failing.

use serde::Serialize;

/// A malformed-content condition the extractor recovered from.
///
/// None of these surface as errors; they are kept so callers can tell a
/// clean extraction from a best-effort one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recovery {
    /// No `Action:` directive was found; the whole output is prose.
    NoMarkerFound,
    /// A directive was found but its payload is not valid JSON.
    PayloadDecodeFailure {
        /// Byte offset of the directive within the output.
        offset: usize,
        /// The serde error message.
        reason: String,
    },
    /// An entry lacked a name or parameters field (or was not an object).
    EntryFieldMissing {
        /// Position of the entry in the payload.
        index: usize,
        /// Which field was defaulted: `"name"` or `"parameters"`.
        field: &'static str,
    },
    /// String parameters were not JSON and were passed through verbatim.
    ArgumentsUnparsable {
        /// Position of the entry in the payload.
        index: usize,
    },
}

/// Records what happened during one batch extraction.
///
/// Attached to every [`ExtractionResult`](crate::types::ExtractionResult).
///
/// ```
/// use llm_toolcall::diagnostics::ExtractionDiagnostics;
///
/// let diag = ExtractionDiagnostics::default();
/// assert!(diag.clean());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionDiagnostics {
    /// Number of directive blocks located (before decoding).
    pub markers_seen: usize,

    /// Number of directive blocks whose payload decoded.
    pub blocks_decoded: usize,

    /// Local recoveries, in the order they happened.
    pub recoveries: Vec<Recovery>,
}

impl ExtractionDiagnostics {
    /// Quick check: no recovery other than "no marker" was needed.
    pub fn clean(&self) -> bool {
        self.recoveries
            .iter()
            .all(|r| matches!(r, Recovery::NoMarkerFound))
    }

    pub(crate) fn record(&mut self, recovery: Recovery) {
        self.recoveries.push(recovery);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_clean() {
        let d = ExtractionDiagnostics::default();
        assert!(d.clean());
        assert_eq!(d.markers_seen, 0);
        assert_eq!(d.blocks_decoded, 0);
    }

    #[test]
    fn test_no_marker_is_still_clean() {
        let mut d = ExtractionDiagnostics::default();
        d.record(Recovery::NoMarkerFound);
        assert!(d.clean());
    }

    #[test]
    fn test_decode_failure_is_not_clean() {
        let mut d = ExtractionDiagnostics::default();
        d.record(Recovery::PayloadDecodeFailure {
            offset: 4,
            reason: "EOF".to_string(),
        });
        assert!(!d.clean());
    }

    #[test]
    fn test_recovery_serializes_with_kind_tag() {
        let v = serde_json::to_value(Recovery::ArgumentsUnparsable { index: 2 }).unwrap();
        assert_eq!(v["kind"], "arguments_unparsable");
        assert_eq!(v["index"], 2);
    }
}
