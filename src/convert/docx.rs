//! Word-processor (OOXML) decomposer.
//!
//! DOCX files carry no reliable pagination, so every non-empty paragraph is
//! treated as its own "page": paragraph `i` becomes a chunk on page `i + 1`.
//! Images and drawings are not extracted.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use super::Decomposer;
use crate::detect::DocumentKind;
use crate::error::{Error, Result};
use crate::job::JobContext;
use crate::model::{Decomposition, TextChunk};
use crate::parser::ExtractOptions;
use crate::text::extract_references;

const DOCUMENT_PART: &str = "word/document.xml";

/// Decomposes DOCX documents.
#[derive(Debug, Clone, Default)]
pub struct DocxDecomposer {
    _private: (),
}

impl DocxDecomposer {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Decomposer for DocxDecomposer {
    fn supported_extensions(&self) -> &[&str] {
        &["docx", "doc"]
    }

    fn name(&self) -> &str {
        "docx"
    }

    fn decompose_bytes(
        &self,
        bytes: &[u8],
        _job: &JobContext,
        _options: &ExtractOptions,
    ) -> Result<Decomposition> {
        let xml = read_document_part(bytes)?;
        let paragraphs = parse_paragraphs(&xml)?;

        let mut doc = Decomposition::new(DocumentKind::Docx);
        doc.page_count = paragraphs.len() as u32;
        doc.chunks = paragraphs
            .iter()
            .enumerate()
            .map(|(i, text)| TextChunk::new(text.as_str(), i as u32 + 1))
            .collect::<Result<Vec<_>>>()?;
        doc.full_text = paragraphs.join("\n\n");
        doc.references = extract_references(&doc.full_text);

        log::info!(
            "decomposed DOCX: {} paragraphs, {} references",
            paragraphs.len(),
            doc.references.len()
        );
        Ok(doc)
    }
}

fn read_document_part(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut part = archive.by_name(DOCUMENT_PART)?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Non-empty paragraph texts of a `word/document.xml` part.
fn parse_paragraphs(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"w:p" => current.clear(),
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                b"w:p" => current.clear(),
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text => {
                let text = e.unescape().map_err(|e| Error::Docx(e.to_string()))?;
                current.push_str(&text);
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    let text = current.trim();
                    if !text.is_empty() {
                        paragraphs.push(text.to_string());
                    }
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(Error::Docx(e.to_string())),
        }
    }

    Ok(paragraphs)
}
