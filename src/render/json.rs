//! JSON rendering of decompositions and aligned results.

use serde::Serialize;

use crate::error::Result;
use crate::model::AlignedEntry;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize any result value.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value)?,
        JsonFormat::Compact => serde_json::to_string(value)?,
    };
    Ok(json)
}

/// Serialize aligned entries as the `[{page, response, source_text, images, type}]` array.
pub fn entries_to_json(entries: &[AlignedEntry], format: JsonFormat) -> Result<String> {
    to_json(entries, format)
}
