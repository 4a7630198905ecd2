//! Bibliography entries keyed by citation number.

use std::collections::BTreeMap;

use serde::Serialize;

/// One numbered entry of a document's reference list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceEntry {
    pub id: u32,
    pub full_text: String,
}

/// Citation number to reference text. Not guaranteed contiguous or complete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReferenceTable {
    entries: BTreeMap<u32, String>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. The first entry recorded for a number wins.
    pub fn insert(&mut self, id: u32, text: impl Into<String>) -> bool {
        if self.entries.contains_key(&id) {
            return false;
        }
        self.entries.insert(id, text.into());
        true
    }

    pub fn get(&self, id: u32) -> Option<&str> {
        self.entries.get(&id).map(String::as_str)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending citation order.
    pub fn entries(&self) -> impl Iterator<Item = ReferenceEntry> + '_ {
        self.entries.iter().map(|(id, text)| ReferenceEntry {
            id: *id,
            full_text: text.clone(),
        })
    }

    /// Render as a numbered list, one entry per line.
    pub fn to_numbered_list(&self) -> String {
        self.entries
            .iter()
            .map(|(id, text)| format!("{}. {}", id, text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl FromIterator<(u32, String)> for ReferenceTable {
    fn from_iter<I: IntoIterator<Item = (u32, String)>>(iter: I) -> Self {
        let mut table = ReferenceTable::new();
        for (id, text) in iter {
            table.insert(id, text);
        }
        table
    }
}
