//! Output rendering for decompositions and aligned results.

mod json;
mod text;

pub use json::{entries_to_json, to_json, JsonFormat};
pub use text::to_text;
