use crate::TermId;
use serde::{Deserialize, Serialize};

/// Sparse term-weight vector: `(term_id, weight)` pairs sorted by term id, no zero weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    entries: Vec<(TermId, f32)>,
}

impl SparseVector {
    pub fn zero() -> Self { Self::default() }

    /// L2-normalize `entries`, which must be sorted by term id without duplicates.
    pub(crate) fn normalized(mut entries: Vec<(TermId, f32)>) -> Self {
        entries.retain(|&(_, w)| w != 0.0);
        let norm = entries.iter().map(|&(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in entries.iter_mut() { *w /= norm; }
        }
        debug_assert!(entries.windows(2).all(|p| p[0].0 < p[1].0));
        Self { entries }
    }

    pub fn is_zero(&self) -> bool { self.entries.is_empty() }

    /// Number of non-zero dimensions.
    pub fn nnz(&self) -> usize { self.entries.len() }

    pub fn get(&self, term: TermId) -> f32 {
        self.entries
            .binary_search_by_key(&term, |&(t, _)| t)
            .map(|i| self.entries[i].1)
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, f32)> + '_ {
        self.entries.iter().copied()
    }

    pub fn norm(&self) -> f32 {
        self.entries.iter().map(|&(_, w)| w * w).sum::<f32>().sqrt()
    }

    /// Merge-join dot product over the shared dimensions.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (a, b) = (&self.entries, &other.entries);
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f32;
        while i < a.len() && j < b.len() {
            match a[i].0.cmp(&b[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a[i].1 * b[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// Cosine similarity in `[0, 1]`; zero when either side is the zero vector.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f32 {
    if a.is_zero() || b.is_zero() {
        return 0.0;
    }
    let denom = a.norm() * b.norm();
    if denom == 0.0 {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(0.0, 1.0)
}
