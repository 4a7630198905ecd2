//! Paragraph chunking with sentence-bounded splitting of long paragraphs.

use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Chunk size limits, counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    /// Paragraphs longer than this are split into sentence groups
    pub max_paragraph_chars: usize,
    /// Paragraphs must be longer than this to be kept
    pub min_paragraph_chars: usize,
    /// Target size of a sentence group
    pub max_chunk_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_paragraph_chars: 1000,
            min_paragraph_chars: 50,
            max_chunk_chars: 800,
        }
    }
}

impl ChunkerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_paragraph_chars(mut self, chars: usize) -> Self {
        self.max_paragraph_chars = chars;
        self
    }

    pub fn with_min_paragraph_chars(mut self, chars: usize) -> Self {
        self.min_paragraph_chars = chars;
        self
    }

    pub fn with_max_chunk_chars(mut self, chars: usize) -> Self {
        self.max_chunk_chars = chars;
        self
    }
}

fn blank_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n[ \t\r\f\v]*\n").expect("valid regex"))
}

/// Split text into trimmed, non-empty blank-line separated paragraphs.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    blank_line_regex()
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split after `.`, `!` or `?` followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let Some(&(next_i, next)) = chars.peek() else {
            break;
        };
        if !next.is_whitespace() {
            continue;
        }
        let sentence = text[start..next_i].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        // Skip the separating whitespace.
        start = next_i;
        while let Some(&(j, w)) = chars.peek() {
            if !w.is_whitespace() {
                break;
            }
            start = j + w.len_utf8();
            chars.next();
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Turn page text into retrieval chunks.
///
/// Paragraphs up to `max_paragraph_chars` are kept whole when longer than
/// `min_paragraph_chars`. Longer paragraphs are packed sentence by sentence
/// into groups of at most `max_chunk_chars`; a single sentence longer than
/// that forms its own group.
pub fn chunk_paragraphs(text: &str, config: &ChunkerConfig) -> Vec<String> {
    let text: String = text.nfc().collect();
    let mut chunks = Vec::new();

    for paragraph in split_paragraphs(&text) {
        let len = paragraph.chars().count();
        if len <= config.max_paragraph_chars {
            if len > config.min_paragraph_chars {
                chunks.push(paragraph);
            }
            continue;
        }

        let mut current = String::new();
        let mut current_len = 0usize;
        for sentence in split_sentences(&paragraph) {
            let sentence_len = sentence.chars().count();
            if current.is_empty() {
                current.push_str(sentence);
                current_len = sentence_len;
            } else if current_len + 1 + sentence_len <= config.max_chunk_chars {
                current.push(' ');
                current.push_str(sentence);
                current_len += 1 + sentence_len;
            } else {
                chunks.push(std::mem::take(&mut current));
                current.push_str(sentence);
                current_len = sentence_len;
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }
    }
    chunks
}
