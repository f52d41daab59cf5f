use crate::catalog::CatalogItem;
use crate::error::CoreError;
use crate::index::{IndexConfig, VectorSpaceIndex};
use crate::rank::{ScoredMatch, SimilarityRanker};
use parking_lot::RwLock;
use std::sync::Arc;

/// An index together with the items it was built from.
#[derive(Debug, Clone)]
pub struct Snapshot {
    index: VectorSpaceIndex,
    items: Vec<CatalogItem>,
}

impl Snapshot {
    pub fn build(items: Vec<CatalogItem>, config: IndexConfig) -> Result<Self, CoreError> {
        let descriptions: Vec<&str> = items.iter().map(|item| item.description.as_str()).collect();
        let index = VectorSpaceIndex::build_with(&descriptions, config)?;
        Ok(Self { index, items })
    }

    /// Pair a previously built index with its items.
    pub fn from_parts(index: VectorSpaceIndex, items: Vec<CatalogItem>) -> Result<Self, CoreError> {
        if index.len() != items.len() {
            return Err(CoreError::InconsistentIndex { index_len: index.len(), items_len: items.len() });
        }
        Ok(Self { index, items })
    }

    pub fn index(&self) -> &VectorSpaceIndex { &self.index }

    pub fn items(&self) -> &[CatalogItem] { &self.items }

    pub fn len(&self) -> usize { self.items.len() }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn recommend(&self, query: &str, k: usize) -> Result<Vec<ScoredMatch<'_>>, CoreError> {
        self.recommend_with(&SimilarityRanker::default(), query, k)
    }

    pub fn recommend_with(
        &self,
        ranker: &SimilarityRanker,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredMatch<'_>>, CoreError> {
        ranker.rank(&self.index, &self.items, query, k)
    }
}

/// Currently published snapshot. Rebuilds are constructed off to the side and swapped in whole.
#[derive(Debug)]
pub struct SharedSnapshot {
    current: RwLock<Arc<Snapshot>>,
}

impl SharedSnapshot {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { current: RwLock::new(Arc::new(snapshot)) }
    }

    pub fn current(&self) -> Arc<Snapshot> {
        self.current.read().clone()
    }

    /// Publish `snapshot`, returning the one it replaced.
    pub fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let next = Arc::new(snapshot);
        let prev = std::mem::replace(&mut *self.current.write(), next);
        tracing::info!(num_docs = prev.len(), "replaced published snapshot");
        prev
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, description: &str) -> CatalogItem {
        CatalogItem {
            id: title.to_lowercase(),
            title: title.into(),
            year: "1999".into(),
            description: description.into(),
            genre: None,
        }
    }

    #[test]
    fn readers_keep_old_snapshot_after_swap() {
        let first = Snapshot::build(vec![item("Matrix", "hackers discover simulated reality")], IndexConfig::default()).unwrap();
        let shared = SharedSnapshot::new(first);
        let held = shared.current();

        let second = Snapshot::build(
            vec![item("Jaws", "shark terrorizes beach town"), item("Speed", "bus bomb")],
            IndexConfig::default(),
        )
        .unwrap();
        let prev = shared.replace(second);

        assert_eq!(held.len(), 1);
        assert!(Arc::ptr_eq(&held, &prev));
        assert_eq!(shared.current().len(), 2);
        let binding = shared.current();
        let hits = binding.recommend("shark", 5).unwrap();
        assert_eq!(hits[0].item.title, "Jaws");
    }

    #[test]
    fn from_parts_checks_lengths() {
        let index = VectorSpaceIndex::build(&["one", "two"]).unwrap();
        let err = Snapshot::from_parts(index, vec![item("One", "one")]).unwrap_err();
        assert!(matches!(err, CoreError::InconsistentIndex { index_len: 2, items_len: 1 }));
    }

    #[test]
    fn empty_catalog_cannot_be_published() {
        assert_eq!(Snapshot::build(Vec::new(), IndexConfig::default()).unwrap_err(), CoreError::EmptyCorpus);
    }
}
