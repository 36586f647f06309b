//! # Directive parsing
//!
//! The stages shared by batch and streaming extraction:
//!
//! | Module | Stage |
//! |--------|-------|
//! | [`marker`] | Locate `Action: ```json [...] ``` ` in model output |
//! | [`payload`] | Decode the bracketed payload into raw entries |
//! | [`normalize`] | Turn each raw entry into a [`NormalizedCall`](crate::types::NormalizedCall) |
//! | [`encode`] | Canonical JSON encoding for arguments |

pub mod encode;
pub mod marker;
pub mod normalize;
pub mod payload;

pub use encode::encode_json;
pub use marker::{locate, locate_all, MarkerMatch, MARKER};
pub use normalize::{normalize_entry, RawParameters};
pub use payload::decode_entries;
