//! Parsing of a trailing numbered "References" section.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::ReferenceTable;

const SECTION_MARKER: &str = "References";

fn entry_start_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*(\d+)\.\s+").expect("valid regex"))
}

/// A trailing run of bracketed database tags such as `[CrossRef] [PubMed]`.
fn trailing_tags_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:\s*\[[^\[\]]*[A-Za-z][^\[\]]*\])+\s*$").expect("valid regex")
    })
}

/// Build the citation table from the first `References` section of `text`.
///
/// Each line starting with `<number>. ` opens an entry that runs until the
/// next such line. Entries keep their first occurrence.
pub fn extract_references(text: &str) -> ReferenceTable {
    let mut table = ReferenceTable::new();
    let Some(pos) = text.find(SECTION_MARKER) else {
        return table;
    };
    let section = &text[pos + SECTION_MARKER.len()..];

    let starts: Vec<(u32, usize, usize)> = entry_start_regex()
        .captures_iter(section)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let id = caps.get(1)?.as_str().parse::<u32>().ok()?;
            Some((id, whole.start(), whole.end()))
        })
        .collect();

    for (i, &(id, _, body_start)) in starts.iter().enumerate() {
        let body_end = starts
            .get(i + 1)
            .map(|&(_, next_start, _)| next_start)
            .unwrap_or(section.len());
        let body = &section[body_start..body_end];
        let body = trailing_tags_regex().replace(body, "");
        let body = body.split_whitespace().collect::<Vec<_>>().join(" ");
        if id == 0 || body.is_empty() {
            continue;
        }
        if !table.insert(id, body) {
            log::debug!("duplicate reference {id} ignored");
        }
    }

    log::debug!("extracted {} references", table.len());
    table
}
