//! TF-IDF text similarity index
//!
//! Fitted once over the brand dish corpora. Queries are projected into the
//! same vocabulary; terms never seen during fitting are ignored.
//!
//! Weighting:
//! - tf: raw term count in the document
//! - idf: `ln((1 + n) / (1 + df)) + 1` (smoothed)
//! - every vector is L2-normalised, so cosine similarity is a dot product

use std::collections::{BTreeMap, HashMap};

/// Sparse vector over the index vocabulary, entries sorted by term id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    fn from_map(map: BTreeMap<usize, f64>) -> Self {
        let norm = map.values().map(|v| v * v).sum::<f64>().sqrt();
        let entries = if norm > 0.0 {
            map.into_iter().map(|(k, v)| (k, v / norm)).collect()
        } else {
            Vec::new()
        };
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Dot product of two sorted sparse vectors
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (a_id, a_val) = self.entries[i];
            let (b_id, b_val) = other.entries[j];
            match a_id.cmp(&b_id) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a_val * b_val;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// Lowercase word tokens of at least two word characters
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_lowercase)
}

#[derive(Debug, Clone, Default)]
pub struct TextSimilarityIndex {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    documents: Vec<SparseVector>,
}

impl TextSimilarityIndex {
    /// Fit vocabulary and idf weights, then vectorize every document
    pub fn fit<S: AsRef<str>>(corpus: &[S]) -> Self {
        let tokenized: Vec<Vec<String>> = corpus
            .iter()
            .map(|d| tokenize(d.as_ref()).collect())
            .collect();

        // Vocabulary ids follow sorted term order so fitting is deterministic
        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        for tokens in &tokenized {
            let mut unique: Vec<&str> = tokens.iter().map(String::as_str).collect();
            unique.sort_unstable();
            unique.dedup();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let n = corpus.len() as f64;
        let mut vocabulary = HashMap::with_capacity(doc_freq.len());
        let mut idf = Vec::with_capacity(doc_freq.len());
        for (id, (term, df)) in doc_freq.iter().enumerate() {
            vocabulary.insert((*term).to_string(), id);
            idf.push(((1.0 + n) / (1.0 + *df as f64)).ln() + 1.0);
        }

        let mut index = Self {
            vocabulary,
            idf,
            documents: Vec::new(),
        };
        let documents = tokenized
            .iter()
            .map(|tokens| index.vectorize(tokens.iter().map(String::as_str)))
            .collect();
        index.documents = documents;
        index
    }

    fn vectorize<'a>(&self, tokens: impl Iterator<Item = &'a str>) -> SparseVector {
        let mut weights: BTreeMap<usize, f64> = BTreeMap::new();
        for token in tokens {
            if let Some(&id) = self.vocabulary.get(token) {
                *weights.entry(id).or_insert(0.0) += 1.0;
            }
        }
        for (id, w) in weights.iter_mut() {
            *w *= self.idf[*id];
        }
        SparseVector::from_map(weights)
    }

    /// Project query text into the fitted vocabulary
    pub fn transform(&self, query: &str) -> SparseVector {
        let tokens: Vec<String> = tokenize(query).collect();
        self.vectorize(tokens.iter().map(String::as_str))
    }

    /// Cosine similarity between a query vector and a fitted document
    ///
    /// Returns 0 for an unknown document index.
    pub fn cosine(&self, query: &SparseVector, document: usize) -> f64 {
        self.documents
            .get(document)
            .map(|doc| query.dot(doc).clamp(0.0, 1.0))
            .unwrap_or(0.0)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }
}
