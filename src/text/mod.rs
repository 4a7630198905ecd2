//! Text processing: paragraph chunking, reference parsing and citation markup.

mod chunker;
mod citation;
mod references;

pub use chunker::{chunk_paragraphs, split_paragraphs, split_sentences, ChunkerConfig};
pub use citation::annotate_citations;
pub use references::extract_references;
