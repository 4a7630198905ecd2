//! Plain text rendering of aligned results.

use crate::model::AlignedEntry;

/// Render entries as a readable report, one section per entry.
pub fn to_text(entries: &[AlignedEntry]) -> String {
    let mut output = String::new();
    for entry in entries {
        output.push_str(&format!("== Page {} ==\n", entry.page));
        output.push_str(entry.response.trim());
        output.push('\n');
        if !entry.images.is_empty() {
            output.push_str("\nImages:\n");
            for image in &entry.images {
                output.push_str(&format!("  - {}\n", image));
            }
        }
        output.push('\n');
    }
    output.trim_end().to_string()
}
