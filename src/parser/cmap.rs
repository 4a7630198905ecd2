//! Font text decoding: ToUnicode CMaps with a byte-level fallback.

use std::collections::HashMap;

/// Glyph-code → Unicode mapping parsed from a `/ToUnicode` CMap stream.
#[derive(Debug, Clone, Default)]
pub struct ToUnicodeMap {
    /// Width of a character code in bytes (1 or 2)
    code_len: usize,
    map: HashMap<u32, String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    ArrayStart,
    ArrayEnd,
    Word(String),
}

impl ToUnicodeMap {
    /// Parse a decompressed CMap program. Returns `None` when it maps nothing.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let tokens = tokenize(data);
        let mut cmap = ToUnicodeMap {
            code_len: 0,
            map: HashMap::new(),
        };

        let mut i = 0;
        while i < tokens.len() {
            match &tokens[i] {
                Token::Word(w) if w == "begincodespacerange" => {
                    if let Some(Token::Hex(lo)) = tokens.get(i + 1) {
                        cmap.code_len = lo.len().clamp(1, 4);
                    }
                    i = skip_to(&tokens, i, "endcodespacerange");
                }
                Token::Word(w) if w == "beginbfchar" => {
                    i += 1;
                    while let (Some(Token::Hex(src)), Some(Token::Hex(dst))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        cmap.note_code_len(src.len());
                        cmap.map.insert(code_value(src), utf16_string(dst));
                        i += 2;
                    }
                }
                Token::Word(w) if w == "beginbfrange" => {
                    i += 1;
                    loop {
                        let (Some(Token::Hex(lo)), Some(Token::Hex(hi))) =
                            (tokens.get(i), tokens.get(i + 1))
                        else {
                            break;
                        };
                        cmap.note_code_len(lo.len());
                        let (lo_code, hi_code) = (code_value(lo), code_value(hi));
                        match tokens.get(i + 2) {
                            Some(Token::Hex(dst)) => {
                                let base = utf16_units(dst);
                                for (offset, code) in (lo_code..=hi_code).take(0x1_0000).enumerate()
                                {
                                    let mut units = base.clone();
                                    if let Some(last) = units.last_mut() {
                                        *last = last.wrapping_add(offset as u16);
                                    }
                                    cmap.map.insert(code, String::from_utf16_lossy(&units));
                                }
                                i += 3;
                            }
                            Some(Token::ArrayStart) => {
                                let mut j = i + 3;
                                let mut code = lo_code;
                                while let Some(Token::Hex(dst)) = tokens.get(j) {
                                    if code <= hi_code {
                                        cmap.map.insert(code, utf16_string(dst));
                                    }
                                    code += 1;
                                    j += 1;
                                }
                                // Skip the closing bracket.
                                i = j + 1;
                            }
                            _ => break,
                        }
                    }
                }
                _ => i += 1,
            }
        }

        if cmap.map.is_empty() {
            return None;
        }
        if cmap.code_len == 0 {
            cmap.code_len = 1;
        }
        Some(cmap)
    }

    fn note_code_len(&mut self, len: usize) {
        if self.code_len == 0 {
            self.code_len = len.clamp(1, 4);
        }
    }

    /// Bytes per character code.
    pub fn code_len(&self) -> usize {
        self.code_len
    }

    /// Number of mapped codes.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Decode a string operand. Unmapped single-byte codes fall back to Latin-1.
    pub fn decode(&self, bytes: &[u8]) -> String {
        let mut out = String::new();
        for chunk in bytes.chunks(self.code_len) {
            let code = code_value(chunk);
            match self.map.get(&code) {
                Some(s) => out.push_str(s),
                None if self.code_len == 1 => out.push(chunk[0] as char),
                None => {}
            }
        }
        out
    }
}

/// How a font's string operands turn into text.
#[derive(Debug, Clone, Default)]
pub enum FontDecoder {
    /// No font information; guess the byte encoding
    #[default]
    Simple,
    /// Explicit ToUnicode mapping
    ToUnicode(ToUnicodeMap),
    /// Two-byte composite font without a usable mapping
    Composite,
}

impl FontDecoder {
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            FontDecoder::Simple => decode_text_simple(bytes),
            FontDecoder::ToUnicode(cmap) => cmap.decode(bytes),
            FontDecoder::Composite => {
                // Identity-encoded CIDs sometimes coincide with UCS-2.
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                let text = String::from_utf16_lossy(&units);
                if text.chars().all(|c| !c.is_control() && c != '\u{FFFD}') {
                    text
                } else {
                    String::new()
                }
            }
        }
    }
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with byte-order mark
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16(&utf16).unwrap_or_default();
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

fn skip_to(tokens: &[Token], from: usize, end: &str) -> usize {
    tokens[from..]
        .iter()
        .position(|t| matches!(t, Token::Word(w) if w == end))
        .map(|p| from + p + 1)
        .unwrap_or(tokens.len())
}

fn code_value(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(4)
        .fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    if bytes.len() == 1 {
        return vec![u16::from(bytes[0])];
    }
    bytes
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect()
}

fn utf16_string(bytes: &[u8]) -> String {
    String::from_utf16_lossy(&utf16_units(bytes))
}

fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let b = data[i];
        match b {
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b'<' if data.get(i + 1) == Some(&b'<') => i += 2,
            b'>' if data.get(i + 1) == Some(&b'>') => i += 2,
            b'<' => {
                let start = i + 1;
                let end = data[start..]
                    .iter()
                    .position(|&c| c == b'>')
                    .map(|p| start + p)
                    .unwrap_or(data.len());
                tokens.push(Token::Hex(parse_hex(&data[start..end])));
                i = end + 1;
            }
            b'[' => {
                tokens.push(Token::ArrayStart);
                i += 1;
            }
            b']' => {
                tokens.push(Token::ArrayEnd);
                i += 1;
            }
            b'(' => {
                // Literal strings are not used by bf mappings; skip them.
                let mut depth = 0usize;
                while i < data.len() {
                    match data[i] {
                        b'\\' => i += 1,
                        b'(' => depth += 1,
                        b')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
                i += 1;
            }
            c if c.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < data.len()
                    && !data[i].is_ascii_whitespace()
                    && !matches!(data[i], b'<' | b'>' | b'[' | b']' | b'(' | b'/' | b'%')
                {
                    i += 1;
                }
                if i == start {
                    // A lone '/' introduces a name; keep it with the name.
                    i += 1;
                    while i < data.len()
                        && !data[i].is_ascii_whitespace()
                        && !matches!(data[i], b'<' | b'>' | b'[' | b']' | b'(' | b'/' | b'%')
                    {
                        i += 1;
                    }
                }
                tokens.push(Token::Word(
                    String::from_utf8_lossy(&data[start..i]).into_owned(),
                ));
            }
        }
    }
    tokens
}

fn parse_hex(digits: &[u8]) -> Vec<u8> {
    let nibbles: Vec<u8> = digits
        .iter()
        .filter_map(|&c| (c as char).to_digit(16).map(|d| d as u8))
        .collect();
    nibbles
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect()
}
