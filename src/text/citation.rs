//! Hover markup for bracketed numeric citations.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::model::ReferenceTable;

/// Largest citation range expanded into individual ids.
const MAX_RANGE: u32 = 200;

fn citation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([0-9,\-–\s]*[0-9][0-9,\-–\s]*)\]").expect("valid regex"))
}

/// Wrap every bracketed citation such as `[1]`, `[2, 5]` or `[3–6]` in a
/// `<span class="citation">` whose title lists the referenced entries.
///
/// Returns the text unchanged when `references` is empty.
pub fn annotate_citations(text: &str, references: &ReferenceTable) -> String {
    if references.is_empty() {
        return text.to_string();
    }

    citation_regex()
        .replace_all(text, |caps: &Captures| {
            let raw = &caps[1];
            let title = cited_ids(raw)
                .into_iter()
                .filter_map(|id| references.get(id).map(|t| format!("{id}. {t}")))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "<span class=\"citation\" data-citation=\"{raw}\" title=\"{}\">[{raw}]</span>",
                escape_html(&title)
            )
        })
        .into_owned()
}

/// Expand `"1, 3-5"` into `[1, 3, 4, 5]`, keeping first occurrences only.
fn cited_ids(raw: &str) -> Vec<u32> {
    let mut ids = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        let bounds: Vec<&str> = part.split(['-', '–']).map(str::trim).collect();
        match bounds.as_slice() {
            [single] => {
                if let Ok(id) = single.parse::<u32>() {
                    ids.push(id);
                }
            }
            [lo, hi] => {
                if let (Ok(lo), Ok(hi)) = (lo.parse::<u32>(), hi.parse::<u32>()) {
                    if lo <= hi && hi - lo <= MAX_RANGE {
                        ids.extend(lo..=hi);
                    }
                }
            }
            _ => {}
        }
    }
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(*id));
    ids
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
