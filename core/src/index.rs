use crate::error::CoreError;
use crate::tokenizer::TokenizerConfig;
use crate::vector::SparseVector;
use crate::TermId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// How raw term counts become term frequencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TfScheme {
    /// The raw count.
    #[default]
    Raw,
    /// `1 + ln(count)`
    Sublinear,
}

impl TfScheme {
    pub fn weight(self, count: u32) -> f32 {
        if count == 0 { return 0.0; }
        match self {
            TfScheme::Raw => count as f32,
            TfScheme::Sublinear => 1.0 + (count as f32).ln(),
        }
    }
}

/// Inverse document frequency variants. `n` is the corpus size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IdfScheme {
    /// `ln((1 + n) / (1 + df)) + 1`
    #[default]
    Smooth,
    /// `ln(n / df)`; terms present in every document get zero weight.
    Standard,
    /// `ln(1 + n / df)`
    Additive,
}

impl IdfScheme {
    pub fn weight(self, n: u32, df: u32) -> f32 {
        let n = n as f32;
        let df_t = df.max(1) as f32;
        match self {
            IdfScheme::Smooth => ((1.0 + n) / (1.0 + df as f32)).ln() + 1.0,
            IdfScheme::Standard => (n / df_t).ln(),
            IdfScheme::Additive => (1.0 + n / df_t).ln(),
        }
    }
}

impl FromStr for TfScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(TfScheme::Raw),
            "sublinear" | "log" => Ok(TfScheme::Sublinear),
            other => Err(format!("unknown tf scheme: {other}")),
        }
    }
}

impl FromStr for IdfScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "smooth" => Ok(IdfScheme::Smooth),
            "standard" => Ok(IdfScheme::Standard),
            "additive" => Ok(IdfScheme::Additive),
            other => Err(format!("unknown idf scheme: {other}")),
        }
    }
}

impl fmt::Display for TfScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self { TfScheme::Raw => "raw", TfScheme::Sublinear => "sublinear" })
    }
}

impl fmt::Display for IdfScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IdfScheme::Smooth => "smooth",
            IdfScheme::Standard => "standard",
            IdfScheme::Additive => "additive",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexConfig {
    pub tokenizer: TokenizerConfig,
    pub tf: TfScheme,
    pub idf: IdfScheme,
}

/// TF-IDF vector space over a fixed corpus. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorSpaceIndex {
    config: IndexConfig,
    vocabulary: HashMap<String, TermId>,
    df: Vec<u32>,
    idf: Vec<f32>,
    vectors: Vec<SparseVector>,
}

impl VectorSpaceIndex {
    /// Build with the default configuration.
    pub fn build<S: AsRef<str>>(corpus: &[S]) -> Result<Self, CoreError> {
        Self::build_with(corpus, IndexConfig::default())
    }

    pub fn build_with<S: AsRef<str>>(corpus: &[S], config: IndexConfig) -> Result<Self, CoreError> {
        if corpus.is_empty() {
            return Err(CoreError::EmptyCorpus);
        }

        // Term ids follow first appearance in corpus order.
        let mut vocabulary: HashMap<String, TermId> = HashMap::new();
        let mut df: Vec<u32> = Vec::new();
        let mut doc_counts: Vec<Vec<(TermId, u32)>> = Vec::with_capacity(corpus.len());
        for doc in corpus {
            let mut tf_counts: HashMap<TermId, u32> = HashMap::new();
            for (term, _pos) in config.tokenizer.tokenize(doc.as_ref()) {
                let next_id = vocabulary.len() as TermId;
                let tid = *vocabulary.entry(term).or_insert(next_id);
                if df.len() <= tid as usize { df.resize(tid as usize + 1, 0); }
                let count = tf_counts.entry(tid).or_insert(0);
                if *count == 0 { df[tid as usize] += 1; }
                *count += 1;
            }
            doc_counts.push(sorted_counts(tf_counts));
        }

        let n = corpus.len() as u32;
        let idf: Vec<f32> = df.iter().map(|&d| config.idf.weight(n, d)).collect();
        let vectors: Vec<SparseVector> = doc_counts
            .into_iter()
            .map(|counts| weigh(counts, &idf, config.tf))
            .collect();

        let empty_docs = vectors.iter().filter(|v| v.is_zero()).count();
        tracing::info!(num_docs = n, num_terms = vocabulary.len(), empty_docs, "built vector space");
        Ok(Self { config, vocabulary, df, idf, vectors })
    }

    /// Project `text` into the frozen space. Unknown terms are dropped; the result may be the zero vector.
    pub fn project(&self, text: &str) -> SparseVector {
        let mut tf_counts: HashMap<TermId, u32> = HashMap::new();
        for (term, _pos) in self.config.tokenizer.tokenize(text) {
            if let Some(&tid) = self.vocabulary.get(&term) {
                *tf_counts.entry(tid).or_insert(0) += 1;
            }
        }
        weigh(sorted_counts(tf_counts), &self.idf, self.config.tf)
    }

    /// Number of documents.
    pub fn len(&self) -> usize { self.vectors.len() }

    pub fn is_empty(&self) -> bool { self.vectors.is_empty() }

    pub fn vocabulary_len(&self) -> usize { self.vocabulary.len() }

    pub fn config(&self) -> &IndexConfig { &self.config }

    pub fn vectors(&self) -> &[SparseVector] { &self.vectors }

    pub fn vector(&self, position: usize) -> Option<&SparseVector> { self.vectors.get(position) }

    /// Id of an already-normalized term.
    pub fn term_id(&self, term: &str) -> Option<TermId> { self.vocabulary.get(term).copied() }

    pub fn document_frequency(&self, term: &str) -> Option<u32> {
        self.term_id(term).map(|tid| self.df[tid as usize])
    }

    pub fn idf(&self, term: &str) -> Option<f32> {
        self.term_id(term).map(|tid| self.idf[tid as usize])
    }

    /// Terms ordered by descending document frequency, then alphabetically.
    pub fn most_frequent_terms(&self, limit: usize) -> Vec<(&str, u32)> {
        let mut terms: Vec<(&str, u32)> = self
            .vocabulary
            .iter()
            .map(|(term, &tid)| (term.as_str(), self.df[tid as usize]))
            .collect();
        terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        terms.truncate(limit);
        terms
    }
}

fn sorted_counts(tf_counts: HashMap<TermId, u32>) -> Vec<(TermId, u32)> {
    let mut counts: Vec<(TermId, u32)> = tf_counts.into_iter().collect();
    counts.sort_unstable_by_key(|&(tid, _)| tid);
    counts
}

fn weigh(counts: Vec<(TermId, u32)>, idf: &[f32], tf: TfScheme) -> SparseVector {
    let weights = counts
        .into_iter()
        .map(|(tid, count)| (tid, tf.weight(count) * idf[tid as usize]))
        .collect();
    SparseVector::normalized(weights)
}
