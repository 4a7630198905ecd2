//! Semantic lookup of source pages.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::PageTextIndex;

/// A ranked lookup result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub page: u32,
    /// Similarity; higher is closer
    pub score: f32,
}

/// Nearest-page lookup over one document's page texts.
pub trait SemanticIndex: Send + Sync {
    /// Up to `k` pages most similar to `query`, best first.
    fn nearest(&self, query: &str, k: usize) -> Result<Vec<Neighbor>>;

    /// Number of indexed pages.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Common words carrying no topical signal.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "been", "but", "by", "can", "for", "from", "had",
    "has", "have", "he", "her", "his", "in", "into", "is", "it", "its", "not", "of", "on", "or",
    "our", "she", "such", "that", "the", "their", "them", "then", "there", "these", "they",
    "this", "those", "to", "was", "we", "were", "which", "while", "who", "will", "with", "would",
];

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| t.chars().count() > 1 && !STOPWORDS.contains(&t.as_str()))
        .collect()
}

type SparseVector = HashMap<String, f32>;

/// Offline TF-IDF cosine index.
#[derive(Debug, Clone, Default)]
pub struct LexicalIndex {
    idf: HashMap<String, f32>,
    pages: Vec<(u32, SparseVector)>,
}

impl LexicalIndex {
    /// Index every page that has text.
    pub fn build(pages: &PageTextIndex) -> Self {
        let docs: Vec<(u32, Vec<String>)> = pages
            .iter()
            .map(|(page, text)| (page, tokenize(text)))
            .filter(|(_, tokens)| !tokens.is_empty())
            .collect();

        let mut df: HashMap<&str, usize> = HashMap::new();
        for (_, tokens) in &docs {
            let unique: HashSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in unique {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        let n = docs.len() as f32;
        let idf: HashMap<String, f32> = df
            .into_iter()
            .map(|(term, count)| {
                (
                    term.to_string(),
                    ((n + 1.0) / (count as f32 + 1.0)).ln() + 1.0,
                )
            })
            .collect();

        let pages = docs
            .iter()
            .map(|(page, tokens)| (*page, weigh(tokens, &idf)))
            .collect();

        log::debug!("lexical index over {} pages, {} terms", docs.len(), idf.len());
        Self { idf, pages }
    }
}

fn weigh(tokens: &[String], idf: &HashMap<String, f32>) -> SparseVector {
    let mut tf: SparseVector = HashMap::new();
    for token in tokens {
        if let Some(weight) = idf.get(token) {
            *tf.entry(token.clone()).or_insert(0.0) += weight;
        }
    }
    let norm = tf.values().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        tf.values_mut().for_each(|v| *v /= norm);
    }
    tf
}

fn sparse_dot(a: &SparseVector, b: &SparseVector) -> f32 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|v| v * w))
        .sum()
}

/// Rank by descending score, then ascending page.
fn rank(mut neighbors: Vec<Neighbor>, k: usize) -> Vec<Neighbor> {
    neighbors.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.page.cmp(&b.page))
    });
    neighbors.truncate(k);
    neighbors
}

impl SemanticIndex for LexicalIndex {
    /// Pages sharing no term with the query are not returned.
    fn nearest(&self, query: &str, k: usize) -> Result<Vec<Neighbor>> {
        let query = weigh(&tokenize(query), &self.idf);
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let neighbors = self
            .pages
            .iter()
            .map(|(page, vector)| Neighbor {
                page: *page,
                score: sparse_dot(&query, vector),
            })
            .filter(|n| n.score > 0.0)
            .collect();
        Ok(rank(neighbors, k))
    }

    fn len(&self) -> usize {
        self.pages.len()
    }
}

/// Dense-embedding index.
///
/// Page and query vectors are computed up front by an embedding service, so
/// lookups are synchronous; querying text that was not embedded is an error.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    pages: Vec<(u32, Vec<f32>)>,
    queries: HashMap<String, Vec<f32>>,
}

impl VectorIndex {
    /// Build from page vectors and the vectors of the queries that will be asked.
    pub fn from_embeddings(
        pages: Vec<(u32, Vec<f32>)>,
        queries: impl IntoIterator<Item = (String, Vec<f32>)>,
    ) -> Result<Self> {
        let dim = pages.first().map(|(_, v)| v.len()).unwrap_or(0);
        if pages.iter().any(|(_, v)| v.len() != dim) {
            return Err(Error::Service("page embeddings differ in dimension".to_string()));
        }
        let queries = queries
            .into_iter()
            .map(|(q, v)| (q.trim().to_string(), v))
            .collect();
        Ok(Self { pages, queries })
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

impl SemanticIndex for VectorIndex {
    fn nearest(&self, query: &str, k: usize) -> Result<Vec<Neighbor>> {
        let vector = self
            .queries
            .get(query.trim())
            .ok_or_else(|| Error::Service("query was not embedded".to_string()))?;
        let neighbors = self
            .pages
            .iter()
            .map(|(page, v)| Neighbor {
                page: *page,
                score: cosine(vector, v),
            })
            .collect();
        Ok(rank(neighbors, k))
    }

    fn len(&self) -> usize {
        self.pages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextChunk;

    fn pages() -> PageTextIndex {
        let chunks = vec![
            TextChunk::new("Mitochondria produce cellular energy through respiration.", 1).unwrap(),
            TextChunk::new("Quarterly revenue grew because of strong sales.", 2).unwrap(),
            TextChunk::new("Glaciers retreat as global temperatures rise.", 3).unwrap(),
            TextChunk::new("x", 4).unwrap(),
        ];
        PageTextIndex::from_chunks(&chunks)
    }

    #[test]
    fn test_lexical_nearest() {
        let index = LexicalIndex::build(&pages());
        // Page 4 holds only a one-letter token and is not indexed.
        assert_eq!(index.len(), 3);

        let hits = index.nearest("How do mitochondria make energy?", 5).unwrap();
        assert_eq!(hits[0].page, 1);
        assert!(hits.iter().all(|h| h.page != 2));

        let hits = index.nearest("sales and revenue", 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].page, 2);
    }

    #[test]
    fn test_lexical_no_overlap() {
        let index = LexicalIndex::build(&pages());
        assert!(index.nearest("zebra xylophone", 5).unwrap().is_empty());
        assert!(index.nearest("the and of", 5).unwrap().is_empty());
    }

    #[test]
    fn test_vector_index() {
        let index = VectorIndex::from_embeddings(
            vec![(1, vec![1.0, 0.0]), (2, vec![0.0, 1.0]), (3, vec![0.7, 0.7])],
            vec![("q".to_string(), vec![0.9, 0.1])],
        )
        .unwrap();
        let hits = index.nearest(" q ", 2).unwrap();
        assert_eq!(hits.iter().map(|h| h.page).collect::<Vec<_>>(), vec![1, 3]);
        assert!(index.nearest("unknown", 2).is_err());
    }

    #[test]
    fn test_vector_dimension_mismatch() {
        let result = VectorIndex::from_embeddings(
            vec![(1, vec![1.0, 0.0]), (2, vec![1.0])],
            Vec::<(String, Vec<f32>)>::new(),
        );
        assert!(result.is_err());
    }
}
