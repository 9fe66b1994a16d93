use std::collections::HashMap;

use crate::services::cache::{CacheKey, CacheStats, LruStore};

/// How text is split into terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Analyzer {
    /// Lowercased alphanumeric words of at least two characters
    Word,
    /// Character n-grams taken inside space-padded words
    CharNgrams(usize),
}

impl Analyzer {
    fn terms(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        match *self {
            Analyzer::Word => lowered
                .split(|c: char| !c.is_alphanumeric())
                .filter(|t| t.chars().count() >= 2)
                .map(str::to_string)
                .collect(),
            Analyzer::CharNgrams(n) => {
                let n = n.max(1);
                let mut terms = Vec::new();
                for word in lowered.split_whitespace() {
                    let padded: Vec<char> = format!(" {} ", word).chars().collect();
                    if padded.len() <= n {
                        terms.push(padded.iter().collect());
                        continue;
                    }
                    for window in padded.windows(n) {
                        terms.push(window.iter().collect());
                    }
                }
                terms
            }
        }
    }
}

/// Sparse L2-normalized term vector, entries sorted by term index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt()
    }

    fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j, mut sum) = (0, 0, 0.0);
        while i < self.entries.len() && j < other.entries.len() {
            let (a_idx, a_val) = self.entries[i];
            let (b_idx, b_val) = other.entries[j];
            match a_idx.cmp(&b_idx) {
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

/// Cosine similarity of two term vectors
///
/// TF-IDF weights are non-negative, so the result lies in [0, 1]; it is 0.0
/// when either vector is empty.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let denom = a.norm() * b.norm();
    if denom <= 0.0 {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(0.0, 1.0)
}

/// TF-IDF model fitted on a corpus
///
/// Uses raw term counts and the smoothed inverse document frequency
/// `ln((1 + n) / (1 + df)) + 1`; terms unseen during fitting are ignored.
#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    analyzer: Analyzer,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfIdfVectorizer {
    pub fn fit<'a, I>(analyzer: Analyzer, documents: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut document_frequency: Vec<usize> = Vec::new();
        let mut n_documents = 0usize;

        for doc in documents {
            n_documents += 1;
            let mut terms = analyzer.terms(doc);
            terms.sort_unstable();
            terms.dedup();
            for term in terms {
                let next = vocabulary.len();
                let idx = *vocabulary.entry(term).or_insert(next);
                if idx == document_frequency.len() {
                    document_frequency.push(0);
                }
                document_frequency[idx] += 1;
            }
        }

        let n = n_documents as f64;
        let idf = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        tracing::debug!(
            "TF-IDF fitted on {} documents, vocabulary of {} terms",
            n_documents,
            vocabulary.len()
        );

        Self {
            analyzer,
            vocabulary,
            idf,
        }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in self.analyzer.terms(text) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx]))
            .collect();
        entries.sort_unstable_by_key(|(idx, _)| *idx);

        let norm = entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, v) in &mut entries {
                *v /= norm;
            }
        }
        SparseVector { entries }
    }
}

/// Fitted TF-IDF model with a vector cache, scoring pairs of texts
pub struct TextSimilarity {
    vectorizer: TfIdfVectorizer,
    cache: LruStore<String, SparseVector>,
}

impl TextSimilarity {
    pub fn fit<'a, I>(analyzer: Analyzer, corpus: I, cache_size: usize) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            vectorizer: TfIdfVectorizer::fit(analyzer, corpus),
            cache: LruStore::new(cache_size),
        }
    }

    /// Vector of a text; repeated texts are served from the cache
    pub fn vector(&self, text: &str) -> SparseVector {
        self.cache
            .get_or_insert_with(CacheKey::text(text), || self.vectorizer.transform(text))
    }

    /// Similarity in [0, 1] of two texts, `None` when either is missing
    pub fn score(&self, a: Option<&str>, b: Option<&str>) -> Option<f64> {
        let (a, b) = (a?, b?);
        Some(cosine_similarity(&self.vector(a), &self.vector(b)))
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vectorizer.vocabulary_size()
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_terms() {
        let terms = Analyzer::Word.terms("Data-Science, a B.Sc. in AI!");
        assert_eq!(terms, vec!["data", "science", "sc", "in", "ai"]);
    }

    #[test]
    fn test_char_ngram_terms() {
        let terms = Analyzer::CharNgrams(3).terms("Art");
        assert_eq!(terms, vec![" ar", "art", "rt "]);
        // Word shorter than n keeps the padded word
        assert_eq!(Analyzer::CharNgrams(5).terms("AI"), vec![" ai "]);
    }

    #[test]
    fn test_identical_texts_score_one() {
        let sim = TextSimilarity::fit(Analyzer::Word, ["data engineer", "sales manager"], 8);
        let score = sim.score(Some("Data Engineer"), Some("data engineer")).unwrap();
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_and_unknown_texts_score_zero() {
        let sim = TextSimilarity::fit(Analyzer::Word, ["data engineer", "sales manager"], 8);
        assert_eq!(sim.score(Some("data engineer"), Some("sales manager")), Some(0.0));
        assert_eq!(sim.score(Some("plumber"), Some("data")), Some(0.0));
        assert_eq!(sim.score(None, Some("data")), None);
    }

    #[test]
    fn test_partial_overlap_in_unit_interval() {
        let corpus = ["computer engineering", "mechanical engineering", "economics", "law"];
        let sim = TextSimilarity::fit(Analyzer::CharNgrams(3), corpus, 8);
        for a in corpus {
            for b in corpus {
                let s = sim.score(Some(a), Some(b)).unwrap();
                assert!((0.0..=1.0).contains(&s), "{} vs {} = {}", a, b, s);
            }
        }
        let close = sim.score(Some("computer engineering"), Some("mechanical engineering")).unwrap();
        let far = sim.score(Some("computer engineering"), Some("law")).unwrap();
        assert!(close > far);
    }

    #[test]
    fn test_vectors_are_cached() {
        let sim = TextSimilarity::fit(Analyzer::Word, ["a b c"], 8);
        sim.vector("hello world");
        sim.vector("Hello World ");
        assert_eq!(sim.stats().hit_count, 1);
    }

    #[test]
    fn test_idf_weights_rare_terms_higher() {
        let v = TfIdfVectorizer::fit(Analyzer::Word, ["common rare", "common", "common"]);
        let vec = v.transform("common rare");
        let weights: Vec<f64> = vec.entries.iter().map(|(_, w)| *w).collect();
        // "common" was inserted first, so it has the lower index
        assert!(weights[1] > weights[0]);
    }
}
