use crate::catalog::CatalogItem;
use crate::error::CoreError;
use crate::index::VectorSpaceIndex;
use serde::Serialize;
use std::cmp::Ordering;

/// A catalog item paired with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMatch<'a> {
    pub item: &'a CatalogItem,
    /// Position of the item in the indexed corpus.
    pub position: usize,
    pub score: f32,
}

/// Scores a query against every indexed document and keeps the best `k`.
///
/// Results are ordered by descending score; equal scores keep corpus order.
/// A query that matches nothing, or scores zero against every document,
/// produces an empty result rather than an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityRanker {
    min_score: Option<f32>,
}

impl SimilarityRanker {
    pub fn new() -> Self { Self::default() }

    /// Drop matches scoring below `min_score`, which must be finite.
    pub fn with_min_score(min_score: f32) -> Result<Self, CoreError> {
        if !min_score.is_finite() {
            return Err(CoreError::invalid_argument(format!("min score must be finite, got {min_score}")));
        }
        Ok(Self { min_score: Some(min_score) })
    }

    pub fn min_score(&self) -> Option<f32> { self.min_score }

    pub fn rank<'a>(
        &self,
        index: &VectorSpaceIndex,
        items: &'a [CatalogItem],
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredMatch<'a>>, CoreError> {
        if k == 0 {
            return Err(CoreError::invalid_argument("k must be a positive integer"));
        }
        if items.len() != index.len() {
            return Err(CoreError::InconsistentIndex { index_len: index.len(), items_len: items.len() });
        }

        let query_vector = index.project(query);
        if query_vector.is_zero() {
            tracing::debug!("query shares no terms with the vocabulary");
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = index
            .vectors()
            .iter()
            .map(|doc| query_vector.dot(doc).clamp(0.0, 1.0))
            .enumerate()
            .collect();
        if scored.iter().all(|&(_, score)| score == 0.0) {
            return Ok(Vec::new());
        }
        if let Some(floor) = self.min_score {
            scored.retain(|&(_, score)| score >= floor);
        }

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_score_then_position);
            scored.truncate(k);
        }
        scored.sort_unstable_by(by_score_then_position);

        tracing::debug!(hits = scored.len(), k, "ranked query");
        Ok(scored
            .into_iter()
            .map(|(position, score)| ScoredMatch { item: &items[position], position, score })
            .collect())
    }
}

fn by_score_then_position(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

/// Rank with the default ranker (no relevance floor).
pub fn rank<'a>(
    index: &VectorSpaceIndex,
    items: &'a [CatalogItem],
    query: &str,
    k: usize,
) -> Result<Vec<ScoredMatch<'a>>, CoreError> {
    SimilarityRanker::default().rank(index, items, query, k)
}
