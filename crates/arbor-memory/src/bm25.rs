//! Okapi BM25 lexical retrieval over an in-memory corpus.

use std::collections::HashMap;

/// Scoring constants. `epsilon` scales the average IDF used as a floor for
/// terms that occur in more than half of the documents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    pub k1: f32,
    pub b: f32,
    pub epsilon: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: 1.5,
            b: 0.75,
            epsilon: 0.25,
        }
    }
}

/// Lowercase, whitespace-separated tokens.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

#[derive(Debug, Clone)]
pub struct Bm25Index {
    params: Bm25Params,
    /// Per document: term -> frequency.
    term_freqs: Vec<HashMap<String, u32>>,
    doc_lengths: Vec<f32>,
    avg_doc_length: f32,
    idf: HashMap<String, f32>,
}

impl Bm25Index {
    pub fn new<I, S>(documents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_params(documents, Bm25Params::default())
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn with_params<I, S>(documents: I, params: Bm25Params) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut term_freqs = Vec::new();
        let mut doc_lengths = Vec::new();
        let mut doc_freqs: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let tokens = tokenize(doc.as_ref());
            doc_lengths.push(tokens.len() as f32);

            let mut freqs: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *freqs.entry(token).or_insert(0) += 1;
            }
            for term in freqs.keys() {
                *doc_freqs.entry(term.clone()).or_insert(0) += 1;
            }
            term_freqs.push(freqs);
        }

        let n = term_freqs.len() as f32;
        let avg_doc_length = if term_freqs.is_empty() {
            0.0
        } else {
            doc_lengths.iter().sum::<f32>() / n
        };

        let mut idf = HashMap::with_capacity(doc_freqs.len());
        let mut idf_sum = 0.0f32;
        let mut negative = Vec::new();
        for (term, df) in doc_freqs {
            let df = df as f32;
            let value = (n - df + 0.5).ln() - (df + 0.5).ln();
            idf_sum += value;
            if value < 0.0 {
                negative.push(term.clone());
            }
            idf.insert(term, value);
        }
        if !idf.is_empty() {
            let floor = params.epsilon * idf_sum / idf.len() as f32;
            for term in negative {
                idf.insert(term, floor);
            }
        }

        Self {
            params,
            term_freqs,
            doc_lengths,
            avg_doc_length,
            idf,
        }
    }

    /// BM25 score of every document for `query`, in document order.
    ///
    /// Repeated query terms contribute once per occurrence.
    #[must_use]
    pub fn scores(&self, query: &str) -> Vec<f32> {
        let Bm25Params { k1, b, .. } = self.params;
        let avgdl = if self.avg_doc_length > 0.0 {
            self.avg_doc_length
        } else {
            1.0
        };

        let mut scores = vec![0.0f32; self.term_freqs.len()];
        for term in tokenize(query) {
            let Some(&idf) = self.idf.get(&term) else {
                continue;
            };
            for (doc, freqs) in self.term_freqs.iter().enumerate() {
                let Some(&tf) = freqs.get(&term) else {
                    continue;
                };
                #[allow(clippy::cast_precision_loss)]
                let tf = tf as f32;
                let norm = 1.0 - b + b * self.doc_lengths[doc] / avgdl;
                scores[doc] += idf * (tf * (k1 + 1.0)) / (tf + k1 * norm);
            }
        }
        scores
    }

    /// The `top_k` highest scoring documents as `(doc_index, score)`.
    ///
    /// Every document takes part, including those scoring zero; equal scores
    /// keep document order.
    #[must_use]
    pub fn search(&self, query: &str, top_k: usize) -> Vec<(usize, f32)> {
        let mut ranked: Vec<(usize, f32)> = self.scores(query).into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(top_k);
        ranked
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.term_freqs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.term_freqs.is_empty()
    }

    #[must_use]
    pub fn params(&self) -> Bm25Params {
        self.params
    }

    /// IDF of `term` after the epsilon floor, if it occurs in the corpus.
    #[must_use]
    pub fn idf(&self, term: &str) -> Option<f32> {
        self.idf.get(&term.to_lowercase()).copied()
    }
}
